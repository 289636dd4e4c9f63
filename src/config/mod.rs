use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Path prefix every backend route lives under
pub const API_PREFIX: &str = "/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Raw API origin as configured; normalized on use
    pub api_url: Option<String>,
    /// Origin a relative base is resolved against
    pub origin: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub analytics_window_days: u32,
    pub recent_log_limit: u32,
    pub join_policy: JoinPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub config_dir: Option<PathBuf>,
}

/// What the dashboard does when some, but not all, of its reads fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinPolicy {
    /// Any failed read fails the whole aggregation
    #[default]
    FailTogether,
    /// Publish what succeeded, naming every failed source
    Partial,
}

impl JoinPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail-together" | "fail_together" | "strict" => Some(JoinPolicy::FailTogether),
            "partial" => Some(JoinPolicy::Partial),
            _ => None,
        }
    }
}

impl ApiConfig {
    /// Normalized API base, still possibly relative
    pub fn base_url(&self) -> String {
        normalize_base_url(self.api_url.as_deref())
    }
}

/// Make the configured API origin end in exactly one `/api` prefix.
///
/// Unset or empty input yields the same-origin relative default `/api`.
/// Applying the function to its own output returns the output unchanged.
pub fn normalize_base_url(url: Option<&str>) -> String {
    let url = match url {
        Some(url) if !url.is_empty() => url,
        _ => return API_PREFIX.to_string(),
    };

    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with(API_PREFIX) {
        return trimmed.to_string();
    }

    format!("{}{}", trimmed, API_PREFIX)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("PHISHGUARD_API_URL") {
            self.api.api_url = Some(v);
        }
        if let Ok(v) = env::var("PHISHGUARD_ORIGIN") {
            if !v.trim().is_empty() {
                self.api.origin = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("PHISHGUARD_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }

        // Dashboard overrides
        if let Ok(v) = env::var("PHISHGUARD_DASHBOARD_DAYS") {
            self.dashboard.analytics_window_days = v.parse().unwrap_or(self.dashboard.analytics_window_days);
        }
        if let Ok(v) = env::var("PHISHGUARD_DASHBOARD_LOG_LIMIT") {
            self.dashboard.recent_log_limit = v.parse().unwrap_or(self.dashboard.recent_log_limit);
        }
        if let Ok(v) = env::var("PHISHGUARD_DASHBOARD_JOIN") {
            match JoinPolicy::parse(&v) {
                Some(policy) => self.dashboard.join_policy = policy,
                None => tracing::warn!("Ignoring unknown PHISHGUARD_DASHBOARD_JOIN value '{}'", v),
            }
        }

        // Storage overrides
        if let Ok(v) = env::var("PHISHGUARD_CONFIG_DIR") {
            if !v.trim().is_empty() {
                self.storage.config_dir = Some(PathBuf::from(v));
            }
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                api_url: None,
                origin: "http://localhost:5000".to_string(),
                request_timeout_secs: 30,
            },
            dashboard: DashboardConfig::default(),
            storage: StorageConfig { config_dir: None },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                api_url: None,
                origin: "https://staging.phishguard.app".to_string(),
                request_timeout_secs: 15,
            },
            dashboard: DashboardConfig::default(),
            storage: StorageConfig { config_dir: None },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                api_url: None,
                origin: "https://phishguard.app".to_string(),
                request_timeout_secs: 10,
            },
            dashboard: DashboardConfig::default(),
            storage: StorageConfig { config_dir: None },
        }
    }

    /// Configuration pointing at an explicit API origin, used by tests and embedders
    pub fn for_api_url(api_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.api_url = Some(api_url.into());
        config
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            analytics_window_days: 7,
            recent_log_limit: 6,
            join_policy: JoinPolicy::FailTogether,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
