use std::sync::Arc;

use reqwest::Method;

/// Raised once per response the server answered with 401
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRejected {
    pub method: Method,
    pub path: String,
    /// Whether this rejection removed a stored credential (false when another
    /// failing call already cleared it)
    pub cleared_credential: bool,
}

/// Subscriber to authentication rejections.
///
/// Called synchronously from the gateway's response path, before the failing
/// call returns to its caller. Implementations must tolerate repeated calls.
pub trait RejectionListener: Send + Sync {
    fn on_rejected(&self, event: &AuthRejected);
}

impl<F> RejectionListener for F
where
    F: Fn(&AuthRejected) + Send + Sync,
{
    fn on_rejected(&self, event: &AuthRejected) {
        self(event)
    }
}

pub type ListenerBox = Arc<dyn RejectionListener>;
