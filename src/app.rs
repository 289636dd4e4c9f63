// Composition root - builds the object graph once and wires the gateway's
// rejection signal to the session and the navigator.

use std::sync::{Arc, Weak};

use crate::api::BackendApi;
use crate::config::AppConfig;
use crate::dashboard::{DashboardAggregator, DashboardView};
use crate::error::GatewayError;
use crate::gateway::credentials::default_config_dir;
use crate::gateway::{AuthRejected, CredentialStore, FileCredentialStore, GatewayClient};
use crate::guard::{self, Access, AccessGuard};
use crate::navigation::{Navigator, Route};
use crate::session::{SessionError, SessionState, SessionStore};
use crate::types::UserSummary;

pub struct App {
    config: AppConfig,
    credentials: Arc<dyn CredentialStore>,
    gateway: Arc<GatewayClient>,
    api: BackendApi,
    session: Arc<SessionStore>,
    navigator: Arc<Navigator>,
}

impl App {
    pub fn new(config: AppConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, GatewayError> {
        let gateway = Arc::new(GatewayClient::new(&config.api, Arc::clone(&credentials))?);
        let api = BackendApi::new(Arc::clone(&gateway));
        let session = Arc::new(SessionStore::new(
            Arc::new(api.auth.clone()),
            Arc::clone(&credentials),
        ));
        let navigator = Arc::new(Navigator::new(Route::Overview));

        // Weak: the session reaches the gateway through its backend
        let session_ref: Weak<SessionStore> = Arc::downgrade(&session);
        let navigator_ref: Weak<Navigator> = Arc::downgrade(&navigator);
        gateway.subscribe(Arc::new(move |event: &AuthRejected| {
            if let Some(session) = session_ref.upgrade() {
                session.on_auth_rejected();
            }
            if let Some(navigator) = navigator_ref.upgrade() {
                if navigator.redirect_to_login() {
                    tracing::info!("Redirected to sign-in after {} {} was rejected", event.method, event.path);
                }
            }
        }));

        Ok(Self {
            config,
            credentials,
            gateway,
            api,
            session,
            navigator,
        })
    }

    /// Build from the process configuration with the on-disk credential store
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let dir = default_config_dir(config.storage.config_dir.as_deref())?;
        let credentials = Arc::new(FileCredentialStore::open(&dir)?);
        Ok(Self::new(config, credentials)?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn gateway(&self) -> &Arc<GatewayClient> {
        &self.gateway
    }

    pub fn api(&self) -> &BackendApi {
        &self.api
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    pub fn guard(&self) -> AccessGuard {
        AccessGuard::new(Arc::clone(&self.session))
    }

    /// Startup identity check; precedes any protected render
    pub async fn start(&self) -> SessionState {
        self.session.initialize().await
    }

    /// Decide what `route` shows right now. A redirect also moves the navigator.
    pub fn render(&self, route: Route) -> Access {
        if !route.is_protected() {
            return Access::Render;
        }

        let access = guard::evaluate(&self.session.state());
        if let Access::Redirect(target) = access {
            self.navigator.navigate(target);
        }
        access
    }

    /// Navigate to `route` and render it
    pub fn open(&self, route: Route) -> Access {
        self.navigator.navigate(route);
        self.render(route)
    }

    /// Sign in and land on the overview
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary, SessionError> {
        let user = self.session.login(email, password).await?;
        self.navigator.navigate(Route::Overview);
        Ok(user)
    }

    /// Sign out and land on the sign-in page
    pub fn logout(&self) {
        self.session.logout();
        self.navigator.redirect_to_login();
    }

    /// A fresh Overview view; each activation recomputes its snapshot
    pub fn dashboard(&self) -> DashboardView {
        let aggregator = DashboardAggregator::new(Arc::new(self.api.clone()), &self.config.dashboard);
        DashboardView::new(aggregator)
    }
}
