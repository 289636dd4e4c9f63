use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::gateway::GatewayClient;
use crate::session::AuthBackend;
use crate::types::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, ResetPasswordRequest, UserSummary};

/// `/auth/*` endpoints
#[derive(Clone)]
pub struct AuthApi {
    gateway: Arc<GatewayClient>,
}

impl AuthApi {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }

    /// POST /auth/register - create an account; a verification email follows
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, GatewayError> {
        self.gateway.post("/auth/register", request).await
    }

    /// POST /auth/login - exchange email and password for a credential
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, GatewayError> {
        self.gateway.post("/auth/login", request).await
    }

    /// POST /auth/verify - confirm an email-verification token
    pub async fn verify(&self, token: &str) -> Result<Value, GatewayError> {
        self.gateway.post("/auth/verify", &json!({ "token": token })).await
    }

    /// POST /auth/forgot-password - request a reset email
    pub async fn forgot_password(&self, email: &str) -> Result<Value, GatewayError> {
        self.gateway.post("/auth/forgot-password", &json!({ "email": email })).await
    }

    /// POST /auth/reset-password - complete a reset with the emailed token
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Value, GatewayError> {
        self.gateway.post("/auth/reset-password", request).await
    }

    /// GET /auth/me - current session check
    pub async fn me(&self) -> Result<UserSummary, GatewayError> {
        let response: MeResponse = self.gateway.get("/auth/me").await?;
        Ok(response.into_user())
    }
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn who_am_i(&self) -> Result<UserSummary, GatewayError> {
        self.me().await
    }

    async fn sign_in(&self, request: &LoginRequest) -> Result<LoginResponse, GatewayError> {
        self.login(request).await
    }
}
