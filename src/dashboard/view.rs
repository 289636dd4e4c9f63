// One dashboard view: activation, supersession and teardown
//
// Results of an activation that was deactivated or superseded are dropped
// without touching the published state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, Abortable};
use tokio::sync::watch;

use super::{DashboardAggregator, DashboardSnapshot};
use crate::error::DashboardError;

#[derive(Debug, Clone)]
pub enum DashboardState {
    Inactive,
    Loading,
    Ready(Arc<DashboardSnapshot>),
    Failed(String),
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DashboardState::Loading)
    }

    pub fn snapshot(&self) -> Option<&Arc<DashboardSnapshot>> {
        match self {
            DashboardState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

pub struct DashboardView {
    aggregator: DashboardAggregator,
    state: watch::Sender<DashboardState>,
    current: Mutex<Option<(u64, AbortHandle)>>,
    generation: AtomicU64,
}

impl DashboardView {
    pub fn new(aggregator: DashboardAggregator) -> Self {
        let (state, _) = watch::channel(DashboardState::Inactive);
        Self {
            aggregator,
            state,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Load a fresh snapshot, superseding any activation still in flight.
    ///
    /// Publishes `Loading` first and `Ready`/`Failed` only once every read has
    /// resolved. Returns `Cancelled` if the view was deactivated or reactivated
    /// before that happened.
    pub async fn activate(&self) -> Result<Arc<DashboardSnapshot>, DashboardError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (handle, registration) = AbortHandle::new_pair();

        if let Some((previous, previous_handle)) = self.swap_current(Some((generation, handle))) {
            tracing::debug!("Dashboard activation {} superseded by {}", previous, generation);
            previous_handle.abort();
        }
        self.state.send_replace(DashboardState::Loading);

        let outcome = match Abortable::new(self.aggregator.load(), registration).await {
            Ok(outcome) => outcome,
            Err(_aborted) => {
                tracing::debug!("Dashboard activation {} aborted", generation);
                return Err(DashboardError::Cancelled);
            }
        };

        if !self.finish(generation) {
            return Err(DashboardError::Cancelled);
        }

        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.state.send_replace(DashboardState::Ready(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Err(error) => {
                self.state.send_replace(DashboardState::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Tear the view down: abort the in-flight join and forget published data
    pub fn deactivate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some((generation, handle)) = self.swap_current(None) {
            tracing::debug!("Dashboard activation {} cancelled by deactivation", generation);
            handle.abort();
        }
        self.state.send_replace(DashboardState::Inactive);
    }

    fn swap_current(&self, next: Option<(u64, AbortHandle)>) -> Option<(u64, AbortHandle)> {
        match self.current.lock() {
            Ok(mut current) => std::mem::replace(&mut *current, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }

    /// Release the slot if `generation` still owns it
    fn finish(&self, generation: u64) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        let mut current = match self.current.lock() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        match current.as_ref() {
            Some((owner, _)) if *owner == generation => {
                *current = None;
                true
            }
            _ => false,
        }
    }
}
