//! HTTP API handlers for cinelog-web
//!
//! JSON in, JSON out. Every route except `/health` and `/login` requires a
//! login session cookie.

pub mod auth;
pub mod batch;
pub mod catalog;
pub mod health;

pub use auth::{auth_routes, LoggedIn};
pub use batch::batch_routes;
pub use catalog::catalog_routes;
pub use health::health_routes;
