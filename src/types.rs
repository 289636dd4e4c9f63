// Wire types shared by the gateway, session and dashboard layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit `null` the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Minimal profile returned by `/auth/me` and `/auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilteringLevel {
    Strict,
    #[default]
    Moderate,
    Relaxed,
    #[serde(other)]
    Unknown,
}

impl FilteringLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilteringLevel::Strict => "strict",
            FilteringLevel::Moderate => "moderate",
            FilteringLevel::Relaxed => "relaxed",
            FilteringLevel::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(FilteringLevel::Strict),
            "moderate" => Some(FilteringLevel::Moderate),
            "relaxed" => Some(FilteringLevel::Relaxed),
            _ => None,
        }
    }
}

/// A monitored child device profile; owned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filtering_level: FilteringLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Blocked,
    Allowed,
    Warned,
    #[default]
    #[serde(other)]
    Other,
}

impl ActivityStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ActivityStatus::Blocked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Blocked => "blocked",
            ActivityStatus::Allowed => "allowed",
            ActivityStatus::Warned => "warned",
            ActivityStatus::Other => "other",
        }
    }
}

/// Child reference on a log entry: either a bare id or the populated profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Populated {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
    Id(String),
}

impl ChildRef {
    pub fn id(&self) -> &str {
        match self {
            ChildRef::Populated { id, .. } => id,
            ChildRef::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ChildRef::Populated { name, .. } => name.as_deref(),
            ChildRef::Id(_) => None,
        }
    }
}

/// One checked navigation event; the server returns these newest-first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "childId")]
    pub child: Option<ChildRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ActivityStatus,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ActivityLogEntry {
    /// Domain if known, else the URL, else a placeholder
    pub fn target(&self) -> &str {
        self.domain
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or("Unknown domain")
    }
}

/// Windowed aggregate counts; missing counters read as zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked: u64,
}

// Request payloads

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtering_level: Option<FilteringLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
}

// Response envelopes

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// `/auth/me` has been seen both wrapped and bare
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MeResponse {
    Wrapped { user: UserSummary },
    Bare(UserSummary),
}

impl MeResponse {
    pub fn into_user(self) -> UserSummary {
        match self {
            MeResponse::Wrapped { user } => user,
            MeResponse::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChildListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<ChildProfile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChildResponse {
    Wrapped { child: ChildProfile },
    Bare(ChildProfile),
}

impl ChildResponse {
    pub fn into_child(self) -> ChildProfile {
        match self {
            ChildResponse::Wrapped { child } => child,
            ChildResponse::Bare(child) => child,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<ActivityLogEntry>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
}
