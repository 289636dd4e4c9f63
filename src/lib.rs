pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod navigation;
pub mod session;
pub mod types;

pub use app::App;
pub use error::{DashboardError, GatewayError};
