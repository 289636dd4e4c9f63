use std::sync::Arc;

use serde_json::Value;

use crate::error::GatewayError;
use crate::gateway::GatewayClient;
use crate::types::{ChildInput, ChildListResponse, ChildProfile, ChildResponse};

/// `/child/*` endpoints
#[derive(Clone)]
pub struct ChildApi {
    gateway: Arc<GatewayClient>,
}

impl ChildApi {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }

    pub async fn add(&self, input: &ChildInput) -> Result<ChildProfile, GatewayError> {
        let response: ChildResponse = self.gateway.post("/child/add", input).await?;
        Ok(response.into_child())
    }

    /// Every profile owned by the signed-in parent; an absent list reads as empty
    pub async fn list(&self) -> Result<Vec<ChildProfile>, GatewayError> {
        let response: ChildListResponse = self.gateway.get("/child/list").await?;
        Ok(response.children)
    }

    pub async fn get(&self, id: &str) -> Result<ChildProfile, GatewayError> {
        let response: ChildResponse = self.gateway.get(&format!("/child/{}", id)).await?;
        Ok(response.into_child())
    }

    pub async fn update(&self, id: &str, input: &ChildInput) -> Result<ChildProfile, GatewayError> {
        let response: ChildResponse = self.gateway.put(&format!("/child/{}", id), input).await?;
        Ok(response.into_child())
    }

    pub async fn remove(&self, id: &str) -> Result<Value, GatewayError> {
        self.gateway.delete(&format!("/child/remove/{}", id)).await
    }
}
