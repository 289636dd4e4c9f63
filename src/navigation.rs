// Client-side routes and the navigator that owns the current one

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Register,
    Overview,
    Children,
    Activity,
    Analytics,
}

impl Route {
    /// Sidebar order of the protected views
    pub const NAV: [Route; 4] = [Route::Overview, Route::Children, Route::Activity, Route::Analytics];

    /// The unauthenticated entry point
    pub const ENTRY: Route = Route::Login;

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Overview => "/",
            Route::Children => "/children",
            Route::Activity => "/activity",
            Route::Analytics => "/analytics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Login => "Sign In",
            Route::Register => "Create Account",
            Route::Overview => "Overview",
            Route::Children => "Children",
            Route::Activity => "Activity",
            Route::Analytics => "Analytics",
        }
    }

    /// Whether rendering requires a signed-in session
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

/// Owner of the current route. Cheap to share behind an `Arc`.
pub struct Navigator {
    route: watch::Sender<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (route, _) = watch::channel(initial);
        Self { route }
    }

    pub fn current(&self) -> Route {
        *self.route.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.route.subscribe()
    }

    /// Move to `route`; returns false when already there
    pub fn navigate(&self, route: Route) -> bool {
        self.route.send_if_modified(|current| {
            if *current == route {
                return false;
            }
            tracing::debug!("Navigating {} -> {}", current.path(), route.path());
            *current = route;
            true
        })
    }

    /// Force the unauthenticated entry point over whatever route is active
    pub fn redirect_to_login(&self) -> bool {
        self.navigate(Route::ENTRY)
    }
}
