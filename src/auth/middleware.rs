// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Origin gate for every tenant and dashboard route.
//!
//! Requests without an `Origin` header are refused before the body is read.
//! Allow-list membership depends on the addressed project and is checked
//! later by the access control chain.
//!
//! ```rust,ignore
//! let gated = Router::new()
//!     .route("/auth/{api_key}/authorize", post(authorize))
//!     .route_layer(axum::middleware::from_fn(require_origin));
//! ```

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::RequestOrigin;
use crate::error::GatewayError;

pub async fn require_origin(request: Request, next: Next) -> Response {
    if RequestOrigin::from_headers(request.headers()).0.is_none() {
        tracing::warn!(path = %request.uri().path(), "Request without Origin header refused");
        return GatewayError::OriginDenied.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::post, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/gated", post(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn(require_origin))
    }

    #[tokio::test]
    async fn missing_origin_is_not_found() {
        let response = app()
            .oneshot(Request::post("/gated").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn present_origin_passes_through() {
        let response = app()
            .oneshot(
                Request::post("/gated")
                    .header("origin", "https://a.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
