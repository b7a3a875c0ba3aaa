// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Validation
//!
//! Handlers never see raw request bodies. [`Valid<T>`] deserializes the JSON
//! body into `T` and runs [`Validate::validate`], which parses addresses and
//! URLs and collects every bad field before rejecting:
//!
//! ```rust,ignore
//! async fn build(Valid(cmd): Valid<BuildTxRequest>) -> ... {
//!     // cmd.owner is an Address, cmd.hook is complete
//! }
//! ```
//!
//! A body that is not valid JSON for `T` is reported as a single `body`
//! field error.

use alloy::primitives::Address;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::blockchain::ChainRef;
use crate::error::{ApiError, FieldError};
use crate::models::{
    AddGasTankRequest, AuthRequest, BuildTxRequest, CreateProjectRequest, DashboardAuth,
    DeployWalletRequest, SendTxRequest, UpdateGasTankRequest, UpdateProjectRequest,
    WebHookAttributes, WhitelistRequest,
};
use crate::storage::ProjectUpdate;

/// Conversion of a wire DTO into a checked command.
pub trait Validate: Sized {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldError>>;
}

/// Extractor yielding the validated form of a JSON body.
pub struct Valid<T: Validate>(pub T::Output);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::validation(vec![FieldError::new("body", rejection.body_text())])
            })?;

        raw.validate().map(Valid).map_err(|errors| {
            tracing::debug!(fields = errors.len(), "Request failed validation");
            ApiError::validation(errors)
        })
    }
}

/// Accumulates field errors across one request.
#[derive(Default)]
struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    fn address(&mut self, field: &str, raw: &str) -> Address {
        match raw.trim().parse::<Address>() {
            Ok(address) => address,
            Err(_) => {
                self.0.push(FieldError::new(field, "must be a 20-byte hex address"));
                Address::ZERO
            }
        }
    }

    fn non_empty(&mut self, field: &str, raw: &str) {
        if raw.trim().is_empty() {
            self.0.push(FieldError::new(field, "must not be empty"));
        }
    }

    fn url(&mut self, field: &str, raw: &str) {
        match url::Url::parse(raw.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => self.0.push(FieldError::new(field, "must be an http(s) URL")),
        }
    }

    fn hook(&mut self, field: &str, hook: &WebHookAttributes) {
        self.non_empty(&format!("{field}.nonce"), &hook.nonce);
        self.non_empty(&format!("{field}.signedNonce"), &hook.signed_nonce);
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone)]
pub struct AuthCommand {
    pub address: Address,
    pub chain: ChainRef,
    pub hook: Option<WebHookAttributes>,
}

impl Validate for AuthRequest {
    type Output = AuthCommand;

    fn validate(self) -> Result<AuthCommand, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let address = errors.address("zeroWalletAddress", &self.zero_wallet_address);
        if let Some(hook) = &self.web_hook_attributes {
            errors.hook("webHookAttributes", hook);
        }
        errors.finish(AuthCommand {
            address,
            chain: self.chain_id,
            hook: self.web_hook_attributes,
        })
    }
}

// =============================================================================
// Gasless
// =============================================================================

#[derive(Debug, Clone)]
pub struct BuildTx {
    pub owner: Address,
    pub data: String,
    pub chain: ChainRef,
    pub hook: WebHookAttributes,
}

impl Validate for BuildTxRequest {
    type Output = BuildTx;

    fn validate(self) -> Result<BuildTx, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let owner = errors.address("zeroWalletAddress", &self.zero_wallet_address);
        if alloy::hex::decode(self.data.trim()).is_err() {
            errors.0.push(FieldError::new("data", "must be hex-encoded call data"));
        }
        errors.hook("webHookAttributes", &self.web_hook_attributes);
        errors.finish(BuildTx {
            owner,
            data: self.data.trim().to_string(),
            chain: self.chain_id,
            hook: self.web_hook_attributes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SendTx {
    pub owner: Address,
    pub safe_tx_body: Value,
    pub signature: String,
    pub chain: ChainRef,
    pub hook: WebHookAttributes,
}

impl Validate for SendTxRequest {
    type Output = SendTx;

    fn validate(self) -> Result<SendTx, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let owner = errors.address("zeroWalletAddress", &self.zero_wallet_address);
        if !self.exec_transaction_body.is_object() {
            errors
                .0
                .push(FieldError::new("execTransactionBody", "must be an object"));
        }
        errors.non_empty("signature", &self.signature);
        errors.hook("webHookAttributes", &self.web_hook_attributes);
        errors.finish(SendTx {
            owner,
            safe_tx_body: self.exec_transaction_body,
            signature: self.signature,
            chain: self.chain_id,
            hook: self.web_hook_attributes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeployWallet {
    pub owner: Address,
    pub chain: ChainRef,
    pub hook: WebHookAttributes,
}

impl Validate for DeployWalletRequest {
    type Output = DeployWallet;

    fn validate(self) -> Result<DeployWallet, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let owner = errors.address("zeroWalletAddress", &self.zero_wallet_address);
        errors.hook("webHookAttributes", &self.web_hook_attributes);
        errors.finish(DeployWallet {
            owner,
            chain: self.chain_id,
            hook: self.web_hook_attributes,
        })
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Claimed smart contract wallet plus the signed challenge of its owner.
#[derive(Debug, Clone)]
pub struct DashboardCredentials {
    pub owner_scw: Address,
    pub hook: WebHookAttributes,
}

fn dashboard_credentials(errors: &mut FieldErrors, auth: DashboardAuth) -> DashboardCredentials {
    let owner_scw = errors.address("ownerScw", &auth.owner_scw);
    errors.hook("webHookAttributes", &auth.web_hook_attributes);
    DashboardCredentials {
        owner_scw,
        hook: auth.web_hook_attributes,
    }
}

impl Validate for DashboardAuth {
    type Output = DashboardCredentials;

    fn validate(self) -> Result<DashboardCredentials, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let credentials = dashboard_credentials(&mut errors, self);
        errors.finish(credentials)
    }
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub auth: DashboardCredentials,
    pub name: String,
    pub allowed_origins: Vec<String>,
}

impl Validate for CreateProjectRequest {
    type Output = CreateProject;

    fn validate(self) -> Result<CreateProject, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let auth = dashboard_credentials(&mut errors, self.auth);
        errors.non_empty("name", &self.name);
        errors.finish(CreateProject {
            auth,
            name: self.name.trim().to_string(),
            allowed_origins: self.allowed_origins,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProject {
    pub auth: DashboardCredentials,
    pub update: ProjectUpdate,
}

impl Validate for UpdateProjectRequest {
    type Output = UpdateProject;

    fn validate(self) -> Result<UpdateProject, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let auth = dashboard_credentials(&mut errors, self.auth);
        if let Some(name) = &self.name {
            errors.non_empty("name", name);
        }
        errors.finish(UpdateProject {
            auth,
            update: ProjectUpdate {
                name: self.name.map(|name| name.trim().to_string()),
                allowed_origins: self.allowed_origins,
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct AddGasTank {
    pub auth: DashboardCredentials,
    pub chain: ChainRef,
    pub provider_url: String,
    pub whitelist: Vec<Address>,
}

impl Validate for AddGasTankRequest {
    type Output = AddGasTank;

    fn validate(self) -> Result<AddGasTank, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let auth = dashboard_credentials(&mut errors, self.auth);
        errors.url("providerURL", &self.provider_url);
        let whitelist = self
            .whitelist
            .iter()
            .enumerate()
            .map(|(i, raw)| errors.address(&format!("whitelist[{i}]"), raw))
            .collect();
        errors.finish(AddGasTank {
            auth,
            chain: self.chain_id,
            provider_url: self.provider_url.trim().to_string(),
            whitelist,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateGasTank {
    pub auth: DashboardCredentials,
    pub provider_url: String,
}

impl Validate for UpdateGasTankRequest {
    type Output = UpdateGasTank;

    fn validate(self) -> Result<UpdateGasTank, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let auth = dashboard_credentials(&mut errors, self.auth);
        errors.url("providerURL", &self.provider_url);
        errors.finish(UpdateGasTank {
            auth,
            provider_url: self.provider_url.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WhitelistChange {
    pub auth: DashboardCredentials,
    pub address: Address,
}

impl Validate for WhitelistRequest {
    type Output = WhitelistChange;

    fn validate(self) -> Result<WhitelistChange, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let auth = dashboard_credentials(&mut errors, self.auth);
        let address = errors.address("address", &self.address);
        errors.finish(WhitelistChange { auth, address })
    }
}
