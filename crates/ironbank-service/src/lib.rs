//! Ironbank HTTP API Service.
//!
//! This crate provides the HTTP API for the ironbank service, including:
//!
//! - Bank account management
//! - Transfer creation and history
//!
//! # Authentication
//!
//! State-changing requests carry an HS256-signed bearer JWT whose `sub`
//! claim names the acting user. The service validates signature and expiry
//! against a shared secret; it never issues tokens itself.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when the store is sync

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod transfer;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use transfer::TransferRequest;
