// Typed wrappers over the backend REST surface. Every call goes through the
// gateway; nothing here performs network I/O of its own.

pub mod activity;
pub mod auth;
pub mod child;

use std::sync::Arc;

use async_trait::async_trait;

use crate::dashboard::MonitoringSource;
use crate::error::GatewayError;
use crate::gateway::GatewayClient;
use crate::types::{ActivityLogEntry, AnalyticsQuery, AnalyticsSummary, ChildProfile, HistoryQuery};

pub use activity::ActivityApi;
pub use auth::AuthApi;
pub use child::ChildApi;

/// All endpoint groups sharing one gateway
#[derive(Clone)]
pub struct BackendApi {
    pub auth: AuthApi,
    pub child: ChildApi,
    pub activity: ActivityApi,
}

impl BackendApi {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self {
            auth: AuthApi::new(Arc::clone(&gateway)),
            child: ChildApi::new(Arc::clone(&gateway)),
            activity: ActivityApi::new(gateway),
        }
    }
}

#[async_trait]
impl MonitoringSource for BackendApi {
    async fn children(&self) -> Result<Vec<ChildProfile>, GatewayError> {
        self.child.list().await
    }

    async fn analytics(&self, days: u32) -> Result<AnalyticsSummary, GatewayError> {
        let query = AnalyticsQuery {
            days: Some(days),
            ..Default::default()
        };
        self.activity.analytics(&query).await
    }

    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, GatewayError> {
        let query = HistoryQuery {
            limit: Some(limit),
            ..Default::default()
        };
        let response = self.activity.history(&query).await?;
        Ok(response.logs)
    }
}
