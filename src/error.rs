// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Error Taxonomy
//!
//! [`GatewayError`] is the domain error shared by registries, the access
//! control chain and the relay layer. [`ApiError`] is its HTTP rendering;
//! `From<GatewayError> for ApiError` is the only place where domain errors
//! become status codes.
//!
//! | Variant | Status | Notes |
//! |---------|--------|-------|
//! | `TenantNotFound`, `GasTankNotFound`, `UnsupportedChain` | 400 | client addressed an unknown resource |
//! | `Unauthorized`, `MalformedSignature` | 401 | every denial after the origin stage |
//! | `OriginDenied` | 404 | rendered as "Origin not found" |
//! | `RelayFailure` | 502 | engine or chain-read failure, message forwarded |
//! | `Store` | 500 | project store failure |
//! | `Validation` | 400 | structured field errors |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::registry::single_flight::LoadAborted;

/// A single request field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Body path of the offending field (e.g. `zeroWalletAddress`).
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Domain errors produced while resolving, authorizing and relaying.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Project '{0}' not found")]
    TenantNotFound(String),

    #[error("Gas tank '{chain}' not found")]
    GasTankNotFound { tenant_id: String, chain: String },

    #[error("Chain '{0}' is not supported")]
    UnsupportedChain(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Origin not found")]
    OriginDenied,

    #[error("{0}")]
    RelayFailure(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid request")]
    Validation(Vec<FieldError>),
}

impl GatewayError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::TenantNotFound(_) => "project_not_found",
            GatewayError::GasTankNotFound { .. } => "gas_tank_not_found",
            GatewayError::UnsupportedChain(_) => "unsupported_chain",
            GatewayError::MalformedSignature(_) | GatewayError::Unauthorized => "unauthorized",
            GatewayError::OriginDenied => "not_found",
            GatewayError::RelayFailure(_) => "relay_failure",
            GatewayError::Store(_) => "internal_error",
            GatewayError::Validation(_) => "invalid_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::TenantNotFound(_)
            | GatewayError::GasTankNotFound { .. }
            | GatewayError::UnsupportedChain(_)
            | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::MalformedSignature(_) | GatewayError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::OriginDenied => StatusCode::NOT_FOUND,
            GatewayError::RelayFailure(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LoadAborted> for GatewayError {
    fn from(_: LoadAborted) -> Self {
        GatewayError::Store("resource load aborted".to_string())
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
    pub errors: Vec<FieldError>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    error: String,
    error_code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid request".to_string(),
            code: "invalid_request",
            errors,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = err.status_code();
        let code = err.error_code();
        match err {
            GatewayError::Validation(errors) => ApiError::validation(errors),
            // Denials never say which check failed.
            GatewayError::MalformedSignature(_) => {
                ApiError::new(status, code, GatewayError::Unauthorized.to_string())
            }
            GatewayError::Store(ref detail) => {
                tracing::error!(error = %detail, "project store failure");
                ApiError::new(status, code, "Internal server error")
            }
            other => ApiError::new(status, code, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
            errors: self.errors,
        });
        (self.status, body).into_response()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
