// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gasless transaction endpoints.
//!
//! Every call is authenticated with the wallet's current nonce and requires
//! the wallet to be on the whitelist of the target gas tank.

use std::sync::Arc;

use alloy::primitives::Address;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::validation::{BuildTx, DeployWallet, SendTx, Valid},
    auth::{AccessContext, OperationCategory, RequestOrigin},
    blockchain::ChainRef,
    error::{ApiError, GatewayError},
    models::{
        BuildTxRequest, BuildTxResponse, DeployWalletRequest, DeployWalletResponse, SendTxRequest,
        SendTxResponse, WebHookAttributes,
    },
    registry::Tenant,
    state::AppState,
};

/// Resolve the project and run the relay checks for `owner` on `chain`.
async fn authorize_relay(
    state: &AppState,
    api_key: &str,
    origin: &RequestOrigin,
    chain: &ChainRef,
    owner: Address,
    hook: &WebHookAttributes,
) -> Result<Arc<Tenant>, GatewayError> {
    let tenant = state.tenants.get_by_api_key(api_key).await?;
    let origins = tenant.allowed_origins();
    state.access.screen_origin(origin.as_deref(), &origins)?;

    let tank = tenant.gas_tanks().load_and_get(chain, false).await?;
    let ctx = AccessContext::new(OperationCategory::GaslessRelay, origin.as_deref(), &origins)
        .with_session(&tank, Some(owner), Some(hook));
    state.access.evaluate(&ctx).await.into_result()?;

    Ok(tenant)
}

/// Prepare a gasless transaction for the caller's smart contract wallet.
#[utoipa::path(
    post,
    path = "/tx/{api_key}/build",
    tag = "Gasless",
    params(("api_key" = String, Path, description = "Project API key")),
    request_body = BuildTxRequest,
    responses(
        (status = 200, description = "Prepared transaction", body = BuildTxResponse),
        (status = 400, description = "Unknown project or gas tank, or invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Origin not found"),
        (status = 502, description = "Transaction engine failure")
    )
)]
pub async fn build(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<BuildTxRequest>,
) -> Result<Json<BuildTxResponse>, ApiError> {
    let BuildTx {
        owner,
        data,
        chain,
        hook,
    } = cmd;
    let tenant = authorize_relay(&state, &api_key, &origin, &chain, owner, &hook).await?;

    let prepared = state
        .relay
        .build(tenant.gas_tanks(), &chain, owner, data, hook)
        .await?;

    Ok(Json(BuildTxResponse {
        safe_tx_body: prepared.safe_tx_body,
        scw_address: prepared.scw_address.to_string(),
    }))
}

/// Submit a signed gasless transaction.
#[utoipa::path(
    post,
    path = "/tx/{api_key}/send",
    tag = "Gasless",
    params(("api_key" = String, Path, description = "Project API key")),
    request_body = SendTxRequest,
    responses(
        (status = 201, description = "Transaction submitted", body = SendTxResponse),
        (status = 400, description = "Unknown project or gas tank, or invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Origin not found"),
        (status = 502, description = "Transaction engine failure")
    )
)]
pub async fn send(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<SendTxRequest>,
) -> Result<(StatusCode, Json<SendTxResponse>), ApiError> {
    let SendTx {
        owner,
        safe_tx_body,
        signature,
        chain,
        hook,
    } = cmd;
    let tenant = authorize_relay(&state, &api_key, &origin, &chain, owner, &hook).await?;

    let tx_hash = state
        .relay
        .send(tenant.gas_tanks(), &chain, owner, safe_tx_body, signature, hook)
        .await?;

    Ok((StatusCode::CREATED, Json(SendTxResponse { tx_hash })))
}

/// Deploy the caller's proxy wallet.
#[utoipa::path(
    post,
    path = "/tx/{api_key}/deploy",
    tag = "Gasless",
    params(("api_key" = String, Path, description = "Project API key")),
    request_body = DeployWalletRequest,
    responses(
        (status = 201, description = "Wallet deployed", body = DeployWalletResponse),
        (status = 400, description = "Unknown project or gas tank, or invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Origin not found"),
        (status = 502, description = "Transaction engine failure")
    )
)]
pub async fn deploy(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<DeployWalletRequest>,
) -> Result<(StatusCode, Json<DeployWalletResponse>), ApiError> {
    let DeployWallet { owner, chain, hook } = cmd;
    let tenant = authorize_relay(&state, &api_key, &origin, &chain, owner, &hook).await?;

    let scw = state
        .relay
        .deploy(tenant.gas_tanks(), &chain, owner, hook)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DeployWalletResponse {
            scw_address: scw.to_string(),
        }),
    ))
}
