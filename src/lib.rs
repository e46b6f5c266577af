#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "This crate contains the core business logic, domain models, authentication"]
#![doc = "and authorization mechanisms, routing configuration, and error handling for"]
#![doc = "the Taskboard application. It is used by the main binary (`main.rs`) and the"]
#![doc = "`seed` binary to construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

// Re-export key types for easier use of the library crate.
pub use crate::auth::{AuthMiddleware, CurrentUser};
pub use crate::error::AppError;
