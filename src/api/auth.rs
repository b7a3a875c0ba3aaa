// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Nonce endpoints.
//!
//! A wallet obtains its first nonce with `authorize`, may look it up with
//! `getNonce`, and rotates it with `refreshNonce` by signing the current one.
//! Sessions live on the gas tank named by `chainId`.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::validation::{AuthCommand, Valid},
    auth::{AccessContext, OperationCategory, RequestOrigin},
    error::{ApiError, FieldError, GatewayError},
    models::{AuthRequest, NonceResponse, TOKEN_EXPIRED},
    state::AppState,
};

/// Issue a nonce for a wallet, replacing any previous one.
#[utoipa::path(
    post,
    path = "/auth/{api_key}/authorize",
    tag = "Auth",
    params(("api_key" = String, Path, description = "Project API key")),
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Nonce issued", body = NonceResponse),
        (status = 400, description = "Unknown project or gas tank, or invalid body"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<AuthRequest>,
) -> Result<Json<NonceResponse>, ApiError> {
    let tenant = state.tenants.get_by_api_key(&api_key).await?;
    let origins = tenant.allowed_origins();
    let ctx = AccessContext::new(OperationCategory::AuthOnly, origin.as_deref(), &origins);
    state.access.evaluate(&ctx).await.into_result()?;

    let tank = tenant.gas_tanks().load_and_get(&cmd.chain, false).await?;
    let nonce = tank.nonces().issue(cmd.address).await;

    tracing::info!(
        tenant_id = %tenant.id(),
        chain_id = tank.chain_id(),
        address = %cmd.address,
        "Nonce issued"
    );
    Ok(Json(NonceResponse { nonce }))
}

/// Current nonce of a wallet, or `"Token expired"`.
#[utoipa::path(
    post,
    path = "/auth/{api_key}/getNonce",
    tag = "Auth",
    params(("api_key" = String, Path, description = "Project API key")),
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Live nonce or \"Token expired\"", body = NonceResponse),
        (status = 400, description = "Unknown project or gas tank, or invalid body"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn get_nonce(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<AuthRequest>,
) -> Result<Json<NonceResponse>, ApiError> {
    let tenant = state.tenants.get_by_api_key(&api_key).await?;
    let origins = tenant.allowed_origins();
    let ctx = AccessContext::new(OperationCategory::AuthOnly, origin.as_deref(), &origins);
    state.access.evaluate(&ctx).await.into_result()?;

    let tank = tenant.gas_tanks().load_and_get(&cmd.chain, false).await?;
    let nonce = tank
        .nonces()
        .verify(cmd.address)
        .await
        .unwrap_or_else(|| TOKEN_EXPIRED.to_string());

    Ok(Json(NonceResponse { nonce }))
}

/// Rotate the nonce of a wallet that signed its current one.
#[utoipa::path(
    post,
    path = "/auth/{api_key}/refreshNonce",
    tag = "Auth",
    params(("api_key" = String, Path, description = "Project API key")),
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Nonce rotated", body = NonceResponse),
        (status = 400, description = "Unknown project or gas tank, or invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn refresh_nonce(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<AuthRequest>,
) -> Result<Json<NonceResponse>, ApiError> {
    let AuthCommand {
        address,
        chain,
        hook,
    } = cmd;
    let hook = hook.ok_or_else(|| {
        GatewayError::Validation(vec![FieldError::new("webHookAttributes", "is required")])
    })?;

    let tenant = state.tenants.get_by_api_key(&api_key).await?;
    let origins = tenant.allowed_origins();
    state.access.screen_origin(origin.as_deref(), &origins)?;

    let tank = tenant.gas_tanks().load_and_get(&chain, false).await?;
    let ctx = AccessContext::new(OperationCategory::NonceRotation, origin.as_deref(), &origins)
        .with_session(&tank, Some(address), Some(&hook));
    let principal = state.access.evaluate(&ctx).await.into_result()?;
    let proof = principal.proof().ok_or(GatewayError::Unauthorized)?;

    let nonce = tank.nonces().refresh(proof).await?;

    tracing::info!(
        tenant_id = %tenant.id(),
        chain_id = tank.chain_id(),
        address = %address,
        "Nonce refreshed"
    );
    Ok(Json(NonceResponse { nonce }))
}
