// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All wire names are
//! camelCase. Requests carry raw strings for addresses; they are parsed and
//! checked by [`crate::api::validation`] before a handler runs.
//!
//! ## Model Categories
//!
//! - **Auth**: nonce issue, lookup and rotation
//! - **Gasless**: build, send and deploy
//! - **Dashboard**: project and gas tank provisioning

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::blockchain::ChainRef;

// =============================================================================
// Signed Challenge
// =============================================================================

/// Signed-challenge envelope attached to authenticated requests.
///
/// Fields other than `nonce`, `signedNonce` and `to` are forwarded to the
/// transaction engine untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebHookAttributes {
    /// Nonce previously issued by `authorize` or `refreshNonce`.
    pub nonce: String,
    /// 65-byte signature over the nonce, hex encoded.
    pub signed_nonce: String,
    /// Target contract of the relayed call.
    #[serde(default, alias = "targetAddress", skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Auth Models
// =============================================================================

/// Body of `authorize`, `getNonce` and `refreshNonce`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// Wallet owner (EOA) address.
    pub zero_wallet_address: String,
    /// Chain of the gas tank, by ID (`5`, `"5"`) or name (`"goerli"`).
    pub chain_id: ChainRef,
    /// Required by `refreshNonce`.
    #[serde(default)]
    pub web_hook_attributes: Option<WebHookAttributes>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct NonceResponse {
    /// Live nonce, or `"Token expired"` when none is live.
    pub nonce: String,
}

/// Value of [`NonceResponse::nonce`] when no session is live.
pub const TOKEN_EXPIRED: &str = "Token expired";

// =============================================================================
// Gasless Models
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildTxRequest {
    pub zero_wallet_address: String,
    /// ABI-encoded call data.
    pub data: String,
    pub chain_id: ChainRef,
    pub web_hook_attributes: WebHookAttributes,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildTxResponse {
    /// Prepared Safe transaction, to be signed and passed to `send`.
    #[serde(rename = "safeTXBody")]
    #[schema(value_type = Object)]
    pub safe_tx_body: Value,
    pub scw_address: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendTxRequest {
    #[schema(value_type = Object)]
    pub exec_transaction_body: Value,
    pub zero_wallet_address: String,
    /// Owner signature over the prepared transaction.
    pub signature: String,
    pub chain_id: ChainRef,
    pub web_hook_attributes: WebHookAttributes,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendTxResponse {
    pub tx_hash: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployWalletRequest {
    pub zero_wallet_address: String,
    pub chain_id: ChainRef,
    pub web_hook_attributes: WebHookAttributes,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployWalletResponse {
    pub scw_address: String,
}

// =============================================================================
// Dashboard Models
// =============================================================================

/// Fields shared by every dashboard request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAuth {
    /// Smart contract wallet the caller claims to own.
    pub owner_scw: String,
    pub web_hook_attributes: WebHookAttributes,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(flatten)]
    pub auth: DashboardAuth,
    pub name: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    pub id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(flatten)]
    pub auth: DashboardAuth,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddGasTankRequest {
    #[serde(flatten)]
    pub auth: DashboardAuth,
    pub chain_id: ChainRef,
    #[serde(rename = "providerURL")]
    pub provider_url: String,
    #[serde(default, alias = "whiteList")]
    pub whitelist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGasTankRequest {
    #[serde(flatten)]
    pub auth: DashboardAuth,
    #[serde(rename = "providerURL")]
    pub provider_url: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistRequest {
    #[serde(flatten)]
    pub auth: DashboardAuth,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistResponse {
    /// Whether membership changed.
    pub changed: bool,
    pub whitelist: Vec<String>,
}
