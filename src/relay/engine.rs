// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction engine client.
//!
//! The engine owns transaction construction, signing and broadcasting. The
//! gateway connects one [`Relayer`] per gas tank and forwards build, send and
//! deploy calls to it.
//!
//! ## Wire Protocol
//!
//! | Call | Request |
//! |------|---------|
//! | connect | `POST {base}/relayers` with `{projectId, chainId, providerURL}` -> `{relayerId}` |
//! | build | `POST {base}/relayers/{id}/build` -> `{safeTXBody, scwAddress}` |
//! | send | `POST {base}/relayers/{id}/send` -> `{txHash}` |
//! | deploy | `POST {base}/relayers/{id}/deploy` -> `{scwAddress}` |
//! | wallet lookup | `POST {base}/relayers/{id}/wallet` -> `{walletAddress, isDeployed}` |
//!
//! Non-2xx responses carry `{"error": "..."}`; the message is surfaced as-is.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::GatewayError;
use crate::models::WebHookAttributes;

/// Default timeout for engine calls.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(30);

/// Gas tank a relayer is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayTarget {
    pub project_id: String,
    pub chain_id: u64,
    #[serde(rename = "providerURL")]
    pub provider_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub zero_wallet_address: Address,
    pub populated_tx: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_contract_address: Option<String>,
    pub web_hook_attributes: WebHookAttributes,
}

/// Prepared (unsigned) Safe transaction and the wallet it targets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    #[serde(rename = "safeTXBody")]
    pub safe_tx_body: Value,
    pub scw_address: Address,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(rename = "safeTXBody")]
    pub safe_tx_body: Value,
    pub zero_wallet_address: Address,
    pub scw_address: Address,
    pub signature: String,
    pub web_hook_attributes: WebHookAttributes,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub zero_wallet_address: Address,
    pub web_hook_attributes: WebHookAttributes,
}

/// Smart contract wallet derived for an owner address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyWallet {
    pub wallet_address: Address,
    pub is_deployed: bool,
}

/// Errors from the transaction engine.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("transaction engine request failed: {0}")]
    Request(String),

    /// The engine answered with an error; `message` is its own text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("transaction engine response was invalid: {0}")]
    InvalidResponse(String),
}

impl From<RelayError> for GatewayError {
    fn from(err: RelayError) -> Self {
        GatewayError::RelayFailure(err.to_string())
    }
}

/// A relayer bound to one gas tank.
#[async_trait]
pub trait Relayer: Send + Sync {
    async fn build_transaction(&self, request: BuildRequest)
        -> Result<PreparedTransaction, RelayError>;

    /// Submit a signed transaction; returns the transaction hash.
    async fn send_gasless_transaction(&self, request: SendRequest) -> Result<String, RelayError>;

    /// Deploy the owner's proxy wallet; returns its address.
    async fn deploy_proxy_wallet(&self, request: DeployRequest) -> Result<Address, RelayError>;

    async fn does_proxy_wallet_exist(&self, owner: Address) -> Result<ProxyWallet, RelayError>;
}

/// Factory for relayers.
#[async_trait]
pub trait TransactionEngine: Send + Sync {
    async fn connect(&self, target: &RelayTarget) -> Result<Arc<dyn Relayer>, RelayError>;
}

/// reqwest-backed engine client.
#[derive(Debug, Clone)]
pub struct HttpTransactionEngine {
    base_url: Url,
    http: Client,
}

impl HttpTransactionEngine {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectResponse {
    relayer_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletLookup {
    zero_wallet_address: Address,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    tx_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployResponse {
    scw_address: Address,
}

#[async_trait]
impl TransactionEngine for HttpTransactionEngine {
    async fn connect(&self, target: &RelayTarget) -> Result<Arc<dyn Relayer>, RelayError> {
        let connected: ConnectResponse =
            post_json(&self.http, &self.endpoint("/relayers"), target).await?;

        tracing::info!(
            project_id = %target.project_id,
            chain_id = target.chain_id,
            "Relayer connected"
        );

        Ok(Arc::new(HttpRelayer {
            http: self.http.clone(),
            base: self.endpoint(&format!("/relayers/{}", connected.relayer_id)),
        }))
    }
}

/// Relayer handle returned by [`HttpTransactionEngine::connect`].
struct HttpRelayer {
    http: Client,
    base: String,
}

#[async_trait]
impl Relayer for HttpRelayer {
    async fn build_transaction(
        &self,
        request: BuildRequest,
    ) -> Result<PreparedTransaction, RelayError> {
        post_json(&self.http, &format!("{}/build", self.base), &request).await
    }

    async fn send_gasless_transaction(&self, request: SendRequest) -> Result<String, RelayError> {
        let sent: SendResponse =
            post_json(&self.http, &format!("{}/send", self.base), &request).await?;
        Ok(sent.tx_hash)
    }

    async fn deploy_proxy_wallet(&self, request: DeployRequest) -> Result<Address, RelayError> {
        let deployed: DeployResponse =
            post_json(&self.http, &format!("{}/deploy", self.base), &request).await?;
        Ok(deployed.scw_address)
    }

    async fn does_proxy_wallet_exist(&self, owner: Address) -> Result<ProxyWallet, RelayError> {
        let lookup = WalletLookup {
            zero_wallet_address: owner,
        };
        post_json(&self.http, &format!("{}/wallet", self.base), &lookup).await
    }
}

async fn post_json<B, T>(http: &Client, url: &str, body: &B) -> Result<T, RelayError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = http
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| RelayError::Request(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(RelayError::Rejected {
            status,
            message: engine_message(&body),
        });
    }

    response
        .json()
        .await
        .map_err(|e| RelayError::InvalidResponse(e.to_string()))
}

/// Pull `error` out of an engine error body, falling back to the raw text.
fn engine_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn spawn_fake_engine() -> Url {
        let app = Router::new()
            .route(
                "/relayers",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["chainId"], 5);
                    Json(json!({ "relayerId": "r-5" }))
                }),
            )
            .route(
                "/relayers/{id}/build",
                post(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    assert_eq!(id, "r-5");
                    assert_eq!(body["populatedTx"], "0xdead");
                    Json(json!({
                        "safeTXBody": { "to": "0x01" },
                        "scwAddress": Address::with_last_byte(0xcc)
                    }))
                }),
            )
            .route(
                "/relayers/{id}/send",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": "execution reverted" })),
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/").parse().unwrap()
    }

    fn target() -> RelayTarget {
        RelayTarget {
            project_id: "p1".into(),
            chain_id: 5,
            provider_url: "https://rpc.example".into(),
        }
    }

    fn hook() -> WebHookAttributes {
        WebHookAttributes {
            nonce: "0x01".into(),
            signed_nonce: "0x02".into(),
            to: None,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn build_round_trips_through_engine() {
        let engine = HttpTransactionEngine::new(spawn_fake_engine().await, DEFAULT_ENGINE_TIMEOUT)
            .unwrap();
        let relayer = engine.connect(&target()).await.unwrap();

        let prepared = relayer
            .build_transaction(BuildRequest {
                zero_wallet_address: Address::repeat_byte(0xaa),
                populated_tx: "0xdead".into(),
                target_contract_address: None,
                web_hook_attributes: hook(),
            })
            .await
            .unwrap();

        assert_eq!(prepared.scw_address, Address::with_last_byte(0xcc));
        assert_eq!(prepared.safe_tx_body["to"], "0x01");
    }

    #[tokio::test]
    async fn engine_error_message_is_forwarded_verbatim() {
        let engine = HttpTransactionEngine::new(spawn_fake_engine().await, DEFAULT_ENGINE_TIMEOUT)
            .unwrap();
        let relayer = engine.connect(&target()).await.unwrap();

        let err = relayer
            .send_gasless_transaction(SendRequest {
                safe_tx_body: json!({}),
                zero_wallet_address: Address::repeat_byte(0xaa),
                scw_address: Address::repeat_byte(0xcc),
                signature: "0x".into(),
                web_hook_attributes: hook(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Rejected { status: 400, .. }));
        assert!(matches!(
            GatewayError::from(err),
            GatewayError::RelayFailure(msg) if msg == "execution reverted"
        ));
    }

    #[test]
    fn engine_message_falls_back_to_raw_body() {
        assert_eq!(engine_message(r#"{"error":"nope"}"#), "nope");
        assert_eq!(engine_message("gateway timeout\n"), "gateway timeout");
    }
}
