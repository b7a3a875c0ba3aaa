// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::require_origin,
    error::{ErrorBody, FieldError},
    models::{
        AddGasTankRequest, AuthRequest, BuildTxRequest, BuildTxResponse, CreateProjectRequest,
        CreateProjectResponse, DashboardAuth, DeployWalletRequest, DeployWalletResponse,
        NonceResponse, SendTxRequest, SendTxResponse, UpdateGasTankRequest, UpdateProjectRequest,
        WebHookAttributes, WhitelistRequest, WhitelistResponse,
    },
    state::AppState,
    storage::{GasTankRecord, ProjectRecord},
};

pub mod auth;
pub mod dashboard;
pub mod gasless;
pub mod health;
pub mod validation;

pub fn router(state: AppState) -> Router {
    // Every tenant and dashboard route requires an Origin header.
    let gated = Router::new()
        .route("/auth/{api_key}/authorize", post(auth::authorize))
        .route("/auth/{api_key}/getNonce", post(auth::get_nonce))
        .route("/auth/{api_key}/refreshNonce", post(auth::refresh_nonce))
        .route("/tx/{api_key}/build", post(gasless::build))
        .route("/tx/{api_key}/send", post(gasless::send))
        .route("/tx/{api_key}/deploy", post(gasless::deploy))
        .route("/dashboard/projects", post(dashboard::list_projects))
        .route("/dashboard/project", post(dashboard::create_project))
        .route(
            "/dashboard/project/{project_id}",
            post(dashboard::update_project),
        )
        .route(
            "/dashboard/project/{project_id}/gasTanks",
            post(dashboard::list_gas_tanks),
        )
        .route(
            "/dashboard/project/{project_id}/gasTank",
            post(dashboard::add_gas_tank),
        )
        .route(
            "/dashboard/project/{project_id}/gasTank/{chain}",
            post(dashboard::update_gas_tank),
        )
        .route(
            "/dashboard/project/{project_id}/gasTank/{chain}/whitelist",
            post(dashboard::add_to_whitelist).delete(dashboard::remove_from_whitelist),
        )
        .route_layer(middleware::from_fn(require_origin));

    Router::new()
        .merge(gated)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Origins are enforced per project, not by the browser CORS layer.
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::authorize,
        auth::get_nonce,
        auth::refresh_nonce,
        gasless::build,
        gasless::send,
        gasless::deploy,
        dashboard::list_projects,
        dashboard::create_project,
        dashboard::update_project,
        dashboard::list_gas_tanks,
        dashboard::add_gas_tank,
        dashboard::update_gas_tank,
        dashboard::add_to_whitelist,
        dashboard::remove_from_whitelist,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            WebHookAttributes,
            AuthRequest,
            NonceResponse,
            BuildTxRequest,
            BuildTxResponse,
            SendTxRequest,
            SendTxResponse,
            DeployWalletRequest,
            DeployWalletResponse,
            DashboardAuth,
            CreateProjectRequest,
            CreateProjectResponse,
            UpdateProjectRequest,
            AddGasTankRequest,
            UpdateGasTankRequest,
            WhitelistRequest,
            WhitelistResponse,
            ProjectRecord,
            GasTankRecord,
            ErrorBody,
            FieldError,
            health::HealthResponse,
            health::ReadyResponse
        )
    ),
    tags(
        (name = "Auth", description = "Nonce issue, lookup and rotation"),
        (name = "Gasless", description = "Gasless transaction relay"),
        (name = "Dashboard", description = "Project and gas tank provisioning"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
