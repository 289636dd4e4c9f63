// Dashboard aggregation - three independent reads joined into one snapshot

pub mod view;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::{DashboardConfig, JoinPolicy};
use crate::error::{DashboardError, GatewayError};
use crate::types::{ActivityLogEntry, AnalyticsSummary, ChildProfile};

pub use view::{DashboardState, DashboardView};

/// The reads a snapshot is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardSource {
    Children,
    Analytics,
    RecentActivity,
}

impl fmt::Display for DashboardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DashboardSource::Children => "child profiles",
            DashboardSource::Analytics => "analytics",
            DashboardSource::RecentActivity => "recent activity",
        };
        f.write_str(name)
    }
}

/// Backend reads the aggregator needs
#[async_trait]
pub trait MonitoringSource: Send + Sync {
    async fn children(&self) -> Result<Vec<ChildProfile>, GatewayError>;

    async fn analytics(&self, days: u32) -> Result<AnalyticsSummary, GatewayError>;

    /// Most recent entries first, at most `limit`
    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, GatewayError>;
}

/// Share of checked events that were blocked, as a whole percentage.
///
/// A window with no checks reports 0%. That is a display policy, not a
/// measurement: there is nothing to divide by.
pub fn block_rate_percent(analytics: &AnalyticsSummary) -> u32 {
    if analytics.total == 0 {
        return 0;
    }
    ((analytics.blocked as f64 / analytics.total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub children: Vec<ChildProfile>,
    pub analytics: AnalyticsSummary,
    pub recent_logs: Vec<ActivityLogEntry>,
    pub block_rate_percent: u32,
    /// Sources that failed under the partial policy; always empty otherwise
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DashboardSource>,
    /// When the slowest read resolved
    #[serde(skip)]
    pub ready_at: Instant,
}

impl DashboardSnapshot {
    fn assemble(
        children: Vec<ChildProfile>,
        analytics: AnalyticsSummary,
        recent_logs: Vec<ActivityLogEntry>,
        failures: Vec<DashboardSource>,
    ) -> Self {
        Self {
            block_rate_percent: block_rate_percent(&analytics),
            children,
            analytics,
            recent_logs,
            failures,
            ready_at: Instant::now(),
        }
    }

    pub fn monitored_profiles(&self) -> usize {
        self.children.len()
    }

    pub fn total_checks(&self) -> u64 {
        self.analytics.total
    }

    pub fn threats_blocked(&self) -> u64 {
        self.analytics.blocked
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct DashboardAggregator {
    source: Arc<dyn MonitoringSource>,
    window_days: u32,
    log_limit: u32,
    policy: JoinPolicy,
}

impl DashboardAggregator {
    pub fn new(source: Arc<dyn MonitoringSource>, config: &DashboardConfig) -> Self {
        Self {
            source,
            window_days: config.analytics_window_days,
            log_limit: config.recent_log_limit,
            policy: config.join_policy,
        }
    }

    pub fn with_policy(mut self, policy: JoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> JoinPolicy {
        self.policy
    }

    /// Issue the three reads concurrently and build a snapshot once all resolve
    pub async fn load(&self) -> Result<DashboardSnapshot, DashboardError> {
        tracing::debug!(
            "Loading dashboard: window={}d, logs={}, policy={:?}",
            self.window_days,
            self.log_limit,
            self.policy
        );

        match self.policy {
            JoinPolicy::FailTogether => self.load_all().await,
            JoinPolicy::Partial => self.load_settled().await,
        }
    }

    /// First failure wins; the other reads are dropped
    async fn load_all(&self) -> Result<DashboardSnapshot, DashboardError> {
        let (children, analytics, recent_logs) = tokio::try_join!(
            async {
                self.source
                    .children()
                    .await
                    .map_err(DashboardError::source_error(DashboardSource::Children))
            },
            async {
                self.source
                    .analytics(self.window_days)
                    .await
                    .map_err(DashboardError::source_error(DashboardSource::Analytics))
            },
            async {
                self.source
                    .recent_activity(self.log_limit)
                    .await
                    .map_err(DashboardError::source_error(DashboardSource::RecentActivity))
            },
        )?;

        Ok(DashboardSnapshot::assemble(children, analytics, recent_logs, Vec::new()))
    }

    /// Wait for every read; failed sources are listed on the snapshot.
    /// If nothing succeeded there is nothing to show and the first error is returned.
    async fn load_settled(&self) -> Result<DashboardSnapshot, DashboardError> {
        let (children, analytics, recent_logs) = tokio::join!(
            self.source.children(),
            self.source.analytics(self.window_days),
            self.source.recent_activity(self.log_limit),
        );

        let mut failures = Vec::new();
        let mut first_error = None;

        let children = settle(children, DashboardSource::Children, &mut failures, &mut first_error);
        let analytics = settle(analytics, DashboardSource::Analytics, &mut failures, &mut first_error);
        let recent_logs = settle(recent_logs, DashboardSource::RecentActivity, &mut failures, &mut first_error);

        if failures.len() == 3 {
            if let Some(error) = first_error {
                return Err(error);
            }
        }

        Ok(DashboardSnapshot::assemble(
            children.unwrap_or_default(),
            analytics.unwrap_or_default(),
            recent_logs.unwrap_or_default(),
            failures,
        ))
    }
}

fn settle<T>(
    result: Result<T, GatewayError>,
    which: DashboardSource,
    failures: &mut Vec<DashboardSource>,
    first_error: &mut Option<DashboardError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!("Dashboard source '{}' failed: {}", which, error);
            failures.push(which);
            if first_error.is_none() {
                *first_error = Some(DashboardError::Source { which, error });
            }
            None
        }
    }
}
