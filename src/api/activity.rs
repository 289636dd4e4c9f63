use std::sync::Arc;

use crate::error::GatewayError;
use crate::gateway::GatewayClient;
use crate::types::{AnalyticsQuery, AnalyticsSummary, HistoryQuery, HistoryResponse};

/// `/activity/*` endpoints
#[derive(Clone)]
pub struct ActivityApi {
    gateway: Arc<GatewayClient>,
}

impl ActivityApi {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }

    /// GET /activity/history - newest-first log, bounded by `limit`
    pub async fn history(&self, query: &HistoryQuery) -> Result<HistoryResponse, GatewayError> {
        self.gateway.get_with("/activity/history", query).await
    }

    /// GET /activity/analytics - counts over the last `days` days
    pub async fn analytics(&self, query: &AnalyticsQuery) -> Result<AnalyticsSummary, GatewayError> {
        self.gateway.get_with("/activity/analytics", query).await
    }
}
