// Session store - who is signed in, and whether we know yet
//
// State changes only through `initialize`, `login`, `logout` and
// `on_auth_rejected`. Observers read snapshots or subscribe to the watch
// channel; nothing else writes the state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::gateway::CredentialStore;
use crate::types::{LoginRequest, LoginResponse, UserSummary};

/// Identity calls the session depends on
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Check the stored credential with the server
    async fn who_am_i(&self) -> Result<UserSummary, GatewayError>;

    async fn sign_in(&self, request: &LoginRequest) -> Result<LoginResponse, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub user: Option<UserSummary>,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Initializing,
    Authenticated,
    Unauthenticated,
}

impl SessionState {
    pub fn initializing() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    fn authenticated(user: UserSummary) -> Self {
        Self {
            user: Some(user),
            loading: false,
        }
    }

    fn unauthenticated() -> Self {
        Self {
            user: None,
            loading: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.loading, &self.user) {
            (true, _) => SessionPhase::Initializing,
            (false, Some(_)) => SessionPhase::Authenticated,
            (false, None) => SessionPhase::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Failed to store credential: {0}")]
    Storage(anyhow::Error),
}

impl SessionError {
    /// Message for a transient notification
    pub fn message(&self) -> String {
        match self {
            SessionError::Gateway(e) => e.message(),
            SessionError::Storage(e) => format!("Failed to store credential: {}", e),
        }
    }
}

pub struct SessionStore {
    backend: Arc<dyn AuthBackend>,
    credentials: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
    started: AtomicBool,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn AuthBackend>, credentials: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::initializing());
        Self {
            backend,
            credentials,
            state,
            started: AtomicBool::new(false),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run the startup identity check. Only the first call talks to the server;
    /// later calls return the current state.
    ///
    /// The result is discarded if a login or logout already ended the
    /// initializing window while the check was in flight.
    pub async fn initialize(&self) -> SessionState {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session already initialized; skipping identity check");
            return self.state();
        }

        let next = match self.backend.who_am_i().await {
            Ok(user) => {
                tracing::info!("Session restored for {}", user.id);
                SessionState::authenticated(user)
            }
            Err(e) => {
                tracing::info!("No valid session at startup: {}", e);
                SessionState::unauthenticated()
            }
        };

        self.state.send_if_modified(|state| {
            if !state.loading {
                return false;
            }
            *state = next;
            true
        });

        self.state()
    }

    /// Exchange email and password for a credential.
    ///
    /// On failure the state is left untouched and the error is returned for display.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary, SessionError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self.backend.sign_in(&request).await?;
        self.credentials
            .set(&response.token)
            .map_err(SessionError::Storage)?;

        tracing::info!("Signed in as {}", response.user.id);
        self.state.send_replace(SessionState::authenticated(response.user.clone()));
        Ok(response.user)
    }

    /// Forget the credential and the user immediately; no server round-trip
    pub fn logout(&self) {
        self.credentials.clear();
        self.state.send_if_modified(|state| {
            let next = SessionState::unauthenticated();
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        tracing::info!("Signed out");
    }

    /// The server rejected the credential. Moves an authenticated session to
    /// unauthenticated; a no-op in any other phase. Returns whether it changed.
    pub fn on_auth_rejected(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.phase() != SessionPhase::Authenticated {
                return false;
            }
            *state = SessionState::unauthenticated();
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryCredentialStore;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        me: Mutex<VecDeque<Result<UserSummary, GatewayError>>>,
        logins: Mutex<VecDeque<Result<LoginResponse, GatewayError>>>,
        me_calls: AtomicUsize,
    }

    impl FakeBackend {
        fn me_returns(self, result: Result<UserSummary, GatewayError>) -> Self {
            self.me.lock().unwrap().push_back(result);
            self
        }

        fn login_returns(self, result: Result<LoginResponse, GatewayError>) -> Self {
            self.logins.lock().unwrap().push_back(result);
            self
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn who_am_i(&self) -> Result<UserSummary, GatewayError> {
            self.me_calls.fetch_add(1, Ordering::SeqCst);
            self.me
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(rejected()))
        }

        async fn sign_in(&self, _request: &LoginRequest) -> Result<LoginResponse, GatewayError> {
            self.logins
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(rejected()))
        }
    }

    fn parent() -> UserSummary {
        UserSummary {
            id: "u1".to_string(),
            name: "Parent".to_string(),
            email: None,
        }
    }

    fn rejected() -> GatewayError {
        GatewayError::Unauthorized {
            message: "Invalid token".to_string(),
        }
    }

    fn login_ok(token: &str) -> Result<LoginResponse, GatewayError> {
        Ok(LoginResponse {
            token: token.to_string(),
            user: parent(),
        })
    }

    fn store(backend: FakeBackend, credentials: Arc<MemoryCredentialStore>) -> (SessionStore, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (SessionStore::new(backend.clone(), credentials), backend)
    }

    #[tokio::test]
    async fn starts_initializing() {
        let (session, _) = store(FakeBackend::default(), Arc::new(MemoryCredentialStore::new()));
        assert_eq!(session.state(), SessionState::initializing());
        assert_eq!(session.state().phase(), SessionPhase::Initializing);
    }

    #[tokio::test]
    async fn successful_check_authenticates() {
        let (session, _) = store(
            FakeBackend::default().me_returns(Ok(parent())),
            Arc::new(MemoryCredentialStore::with_token("t0")),
        );

        let state = session.initialize().await;
        assert_eq!(state.user, Some(parent()));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn failed_check_is_unauthenticated() {
        let (session, _) = store(
            FakeBackend::default().me_returns(Err(GatewayError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "boom".to_string(),
            })),
            Arc::new(MemoryCredentialStore::new()),
        );

        let state = session.initialize().await;
        assert_eq!(state, SessionState { user: None, loading: false });
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let (session, backend) = store(
            FakeBackend::default().me_returns(Ok(parent())).me_returns(Ok(parent())),
            Arc::new(MemoryCredentialStore::with_token("t0")),
        );

        session.initialize().await;
        session.logout();
        let state = session.initialize().await;

        assert_eq!(backend.me_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.phase(), SessionPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn login_stores_credential_and_user() {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let (session, _) = store(FakeBackend::default().login_returns(login_ok("t1")), credentials.clone());
        session.initialize().await;

        let user = session.login("parent@example.com", "secret123").await.unwrap();
        assert_eq!(user, parent());
        assert_eq!(session.state(), SessionState { user: Some(parent()), loading: false });
        assert_eq!(credentials.get().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn failed_login_stays_unauthenticated_and_propagates() {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let (session, _) = store(
            FakeBackend::default().login_returns(Err(GatewayError::Api {
                status: StatusCode::BAD_REQUEST,
                message: "Please verify your email first".to_string(),
            })),
            credentials.clone(),
        );
        session.initialize().await;

        let err = session.login("parent@example.com", "secret123").await.unwrap_err();
        assert_eq!(err.message(), "Please verify your email first");
        assert_eq!(session.state().phase(), SessionPhase::Unauthenticated);
        assert_eq!(credentials.get(), None);
    }

    #[tokio::test]
    async fn logout_is_immediate_and_clears_credential() {
        let credentials = Arc::new(MemoryCredentialStore::with_token("t0"));
        let (session, _) = store(FakeBackend::default().me_returns(Ok(parent())), credentials.clone());
        session.initialize().await;
        assert!(session.state().is_authenticated());

        session.logout();
        assert_eq!(session.state(), SessionState { user: None, loading: false });
        assert_eq!(credentials.get(), None);
    }

    #[tokio::test]
    async fn loading_never_returns_after_cycles() {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let (session, _) = store(
            FakeBackend::default()
                .login_returns(login_ok("t1"))
                .login_returns(login_ok("t2"))
                .login_returns(login_ok("t3")),
            credentials.clone(),
        );
        let mut observer = session.subscribe();
        assert!(observer.borrow_and_update().loading);

        session.initialize().await;
        assert!(!observer.borrow_and_update().loading);

        for token in ["t1", "t2", "t3"] {
            session.login("parent@example.com", "pw").await.unwrap();
            assert!(!observer.borrow_and_update().loading);
            assert_eq!(credentials.get().as_deref(), Some(token));

            session.logout();
            assert!(!observer.borrow_and_update().loading);
        }
    }

    #[tokio::test]
    async fn rejection_only_affects_authenticated_sessions() {
        let (session, _) = store(
            FakeBackend::default().me_returns(Ok(parent())),
            Arc::new(MemoryCredentialStore::with_token("t0")),
        );

        // Still initializing: the pending check settles the state
        assert!(!session.on_auth_rejected());
        assert!(session.state().loading);

        session.initialize().await;
        assert!(session.on_auth_rejected());
        assert_eq!(session.state().phase(), SessionPhase::Unauthenticated);

        // Second signal is a no-op
        assert!(!session.on_auth_rejected());
    }

    #[tokio::test]
    async fn login_during_initialization_wins_over_late_check() {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let (session, _) = store(
            FakeBackend::default().login_returns(login_ok("t1")),
            credentials.clone(),
        );

        session.login("parent@example.com", "pw").await.unwrap();
        // The check now fails (no queued identity), but must not undo the login
        let state = session.initialize().await;
        assert_eq!(state.user, Some(parent()));
        assert!(!state.loading);
    }
}
