//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `WalletAuth` - End-user requests, identified by the wallet address in
//!   the `Authorization` header
//! - `ServiceAuth` - Service-to-service requests via API key

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use quota_core::WalletAddress;

use crate::error::ApiError;
use crate::state::AppState;

/// Message returned when no usable `Authorization` header is present.
pub const MISSING_AUTH_MESSAGE: &str = "No authorization header";

/// A wallet address taken from the `Authorization` header.
///
/// The header carries the address itself, optionally prefixed with
/// `Bearer `. The address is lowercased so lookups ignore case.
#[derive(Debug, Clone)]
pub struct WalletAuth {
    /// The normalized wallet address.
    pub wallet: WalletAddress,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for WalletAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized(MISSING_AUTH_MESSAGE))?;

        let wallet = WalletAddress::from_credential(header).map_err(|e| {
            tracing::debug!(error = %e, "Rejected wallet credential");
            ApiError::Unauthorized(MISSING_AUTH_MESSAGE)
        })?;

        Ok(Self { wallet })
    }
}

/// Service authentication via API key.
///
/// Used by services that report storage consumption.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// The service name or identifier.
    pub service_name: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing API key"))?;

        let expected_key = state
            .config
            .service_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized("Service access is not configured"))?;

        if api_key != expected_key {
            return Err(ApiError::Unauthorized("Invalid API key"));
        }

        let service_name = parts
            .headers
            .get("x-service-name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self { service_name })
    }
}
