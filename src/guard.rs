// Access guard - decides whether protected content may render

use std::sync::Arc;

use serde::Serialize;

use crate::navigation::Route;
use crate::session::{SessionPhase, SessionState, SessionStore};

/// Outcome of a guarded render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "access", content = "to")]
pub enum Access {
    /// Initial identity check still in flight; show a neutral placeholder
    Loading,
    Render,
    Redirect(Route),
}

/// Pure decision over a session snapshot.
///
/// Never renders or redirects while the startup check is pending.
pub fn evaluate(state: &SessionState) -> Access {
    match state.phase() {
        SessionPhase::Initializing => Access::Loading,
        SessionPhase::Authenticated => Access::Render,
        SessionPhase::Unauthenticated => Access::Redirect(Route::ENTRY),
    }
}

/// Guard bound to a live session
#[derive(Clone)]
pub struct AccessGuard {
    session: Arc<SessionStore>,
}

impl AccessGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub fn check(&self) -> Access {
        evaluate(&self.session.state())
    }

    /// Wait until the startup check settles, then decide
    pub async fn settled(&self) -> Access {
        let mut states = self.session.subscribe();
        let settled = states
            .wait_for(|state| !state.loading)
            .await
            .map(|state| evaluate(&state));
        // Sender lives inside the session we hold; a closed channel falls back to the snapshot
        settled.unwrap_or_else(|_| self.check())
    }
}
