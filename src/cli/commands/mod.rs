pub mod activity;
pub mod auth;
pub mod child;
pub mod dashboard;
