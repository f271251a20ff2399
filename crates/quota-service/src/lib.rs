//! Storage quota HTTP API service.
//!
//! This crate provides the HTTP API for wallet storage quotas, including:
//!
//! - Storage totals for a wallet, with lazy record creation
//! - Crediting confirmed storage plan payments
//! - Usage reporting and pre-flight checks for services
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **Wallet address** - The `Authorization` header carries the caller's
//!    wallet address, optionally as `Bearer <address>`
//! 2. **Service API keys** - For services reporting storage consumption

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Axum handlers are async even when they do not await

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
