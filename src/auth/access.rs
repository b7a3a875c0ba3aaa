// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control Chain
//!
//! Every privileged request runs an ordered list of checks chosen by its
//! [`OperationCategory`]. The first failing check ends evaluation; later
//! checks never run and never touch state.
//!
//! | Category | Stages |
//! |----------|--------|
//! | `AuthOnly` | origin |
//! | `NonceRotation` | origin, nonce |
//! | `DashboardAdmin` | origin, nonce, contract ownership, resource ownership |
//! | `GaslessRelay` | origin, nonce, whitelist |
//!
//! Resource ownership is skipped when the request addresses no project
//! (listing or creating projects). The addressed project is only looked up
//! once the caller is authenticated, and an unknown project is denied like a
//! foreign one.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;

use super::nonce::Authenticated;
use super::signature::SignatureVerifier;
use crate::blockchain::ChainReader;
use crate::error::GatewayError;
use crate::models::WebHookAttributes;
use crate::registry::{GasTank, Tenant, TenantRegistry};

/// A single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Origin,
    NonceAuthentication,
    ContractOwnership,
    ResourceOwnership,
    Whitelist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Origin => "origin",
            Stage::NonceAuthentication => "nonce_authentication",
            Stage::ContractOwnership => "contract_ownership",
            Stage::ResourceOwnership => "resource_ownership",
            Stage::Whitelist => "whitelist",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    AuthOnly,
    NonceRotation,
    DashboardAdmin,
    GaslessRelay,
}

impl OperationCategory {
    pub fn stages(self) -> &'static [Stage] {
        match self {
            OperationCategory::AuthOnly => &[Stage::Origin],
            OperationCategory::NonceRotation => &[Stage::Origin, Stage::NonceAuthentication],
            OperationCategory::DashboardAdmin => &[
                Stage::Origin,
                Stage::NonceAuthentication,
                Stage::ContractOwnership,
                Stage::ResourceOwnership,
            ],
            OperationCategory::GaslessRelay => &[
                Stage::Origin,
                Stage::NonceAuthentication,
                Stage::Whitelist,
            ],
        }
    }
}

/// Inputs to one evaluation.
pub struct AccessContext<'a> {
    category: OperationCategory,
    origin: Option<&'a str>,
    allowed_origins: &'a [String],
    gas_tank: Option<&'a GasTank>,
    claimed_address: Option<Address>,
    hook: Option<&'a WebHookAttributes>,
    owner_scw: Option<Address>,
    project: Option<(&'a TenantRegistry, &'a str)>,
}

impl<'a> AccessContext<'a> {
    pub fn new(
        category: OperationCategory,
        origin: Option<&'a str>,
        allowed_origins: &'a [String],
    ) -> Self {
        Self {
            category,
            origin,
            allowed_origins,
            gas_tank: None,
            claimed_address: None,
            hook: None,
            owner_scw: None,
            project: None,
        }
    }

    /// Gas tank holding the caller's nonce session, and the signed challenge.
    ///
    /// Without `claimed`, the session is looked up for the recovered signer.
    pub fn with_session(
        mut self,
        gas_tank: &'a GasTank,
        claimed: Option<Address>,
        hook: Option<&'a WebHookAttributes>,
    ) -> Self {
        self.gas_tank = Some(gas_tank);
        self.claimed_address = claimed;
        self.hook = hook;
        self
    }

    pub fn with_owner_scw(mut self, owner_scw: Address) -> Self {
        self.owner_scw = Some(owner_scw);
        self
    }

    /// Project the request addresses, resolved by the resource ownership stage.
    pub fn with_project(mut self, registry: &'a TenantRegistry, project_id: &'a str) -> Self {
        self.project = Some((registry, project_id));
        self
    }
}

/// Identity established by a successful evaluation.
#[derive(Clone, Default)]
pub struct Principal {
    authenticated: Option<Authenticated>,
    owner_scw: Option<Address>,
    tenant: Option<Arc<Tenant>>,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("authenticated", &self.authenticated)
            .field("owner_scw", &self.owner_scw)
            .field("tenant", &self.tenant.as_ref().map(|tenant| tenant.id()))
            .finish()
    }
}

impl Principal {
    /// Address that signed the current nonce, if the category authenticates.
    pub fn address(&self) -> Option<Address> {
        self.authenticated.as_ref().map(Authenticated::address)
    }

    pub fn proof(&self) -> Option<&Authenticated> {
        self.authenticated.as_ref()
    }

    /// Smart contract wallet verified as owned by the signer.
    pub fn owner_scw(&self) -> Option<Address> {
        self.owner_scw
    }

    /// Project resolved and found owned by the caller.
    pub fn tenant(&self) -> Option<&Arc<Tenant>> {
        self.tenant.as_ref()
    }
}

/// The failing stage and the error reported to the caller.
#[derive(Debug, Clone)]
pub struct Denial {
    pub stage: Stage,
    pub error: GatewayError,
}

#[derive(Debug, Clone)]
pub enum AccessDecision {
    Allow(Principal),
    Deny(Denial),
}

impl AccessDecision {
    pub fn into_result(self) -> Result<Principal, GatewayError> {
        match self {
            AccessDecision::Allow(principal) => Ok(principal),
            AccessDecision::Deny(denial) => Err(denial.error),
        }
    }
}

/// Check that `origin` is present and, when `allowed` is non-empty, listed.
pub fn check_origin(origin: Option<&str>, allowed: &[String]) -> Result<(), GatewayError> {
    let origin = origin
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .ok_or(GatewayError::OriginDenied)?;

    if allowed.is_empty() || allowed.iter().any(|entry| entry == origin) {
        Ok(())
    } else {
        Err(GatewayError::OriginDenied)
    }
}

pub struct AccessControlChain {
    verifier: SignatureVerifier,
    chain_reader: Arc<dyn ChainReader>,
    dashboard_chain_id: u64,
}

impl AccessControlChain {
    /// `dashboard_chain_id` is the chain on which `owner()` of dashboard
    /// smart contract wallets is read.
    pub fn new(chain_reader: Arc<dyn ChainReader>, dashboard_chain_id: u64) -> Self {
        Self {
            verifier: SignatureVerifier::new(),
            chain_reader,
            dashboard_chain_id,
        }
    }

    pub fn verifier(&self) -> SignatureVerifier {
        self.verifier
    }

    /// Origin stage on its own, run before any resource is resolved.
    pub fn screen_origin(&self, origin: Option<&str>, allowed: &[String]) -> Result<(), GatewayError> {
        check_origin(origin, allowed).inspect_err(|_| {
            tracing::warn!(stage = %Stage::Origin, "Access denied");
        })
    }

    pub async fn evaluate(&self, ctx: &AccessContext<'_>) -> AccessDecision {
        let mut principal = Principal::default();

        for &stage in ctx.category.stages() {
            let outcome = match stage {
                Stage::Origin => check_origin(ctx.origin, ctx.allowed_origins),
                Stage::NonceAuthentication => {
                    let proof = self.authenticate_nonce(ctx).await;
                    proof.map(|proof| principal.authenticated = Some(proof))
                }
                Stage::ContractOwnership => {
                    let owned = self.check_scw_owner(ctx, &principal).await;
                    owned.map(|scw| principal.owner_scw = Some(scw))
                }
                Stage::ResourceOwnership => match ctx.project {
                    Some((registry, project_id)) => {
                        let owned = owned_project(registry, project_id, &principal).await;
                        owned.map(|tenant| principal.tenant = Some(tenant))
                    }
                    None => Ok(()),
                },
                Stage::Whitelist => self.check_whitelist(ctx, &principal).await,
            };

            if let Err(error) = outcome {
                tracing::warn!(
                    stage = %stage,
                    category = ?ctx.category,
                    tenant_id = ctx.project.map(|(_, id)| id).or(ctx.gas_tank.map(GasTank::tenant_id)),
                    "Access denied"
                );
                return AccessDecision::Deny(Denial { stage, error });
            }
        }

        AccessDecision::Allow(principal)
    }

    /// Recover the signer of the presented nonce and match it against the
    /// live session.
    async fn authenticate_nonce(&self, ctx: &AccessContext<'_>) -> Result<Authenticated, GatewayError> {
        let (Some(tank), Some(hook)) = (ctx.gas_tank, ctx.hook) else {
            return Err(GatewayError::Unauthorized);
        };

        let recovered = self
            .verifier
            .recover_address(&hook.nonce, &hook.signed_nonce)
            .map_err(|e| GatewayError::MalformedSignature(e.to_string()))?;
        let address = ctx.claimed_address.unwrap_or(recovered);

        let session = tank
            .nonces()
            .session(address)
            .await
            .ok_or(GatewayError::Unauthorized)?;
        if session.nonce != hook.nonce || session.address != recovered {
            return Err(GatewayError::Unauthorized);
        }

        Ok(Authenticated::new(recovered, session.nonce))
    }

    /// `owner()` of the claimed smart contract wallet must be the signer.
    async fn check_scw_owner(
        &self,
        ctx: &AccessContext<'_>,
        principal: &Principal,
    ) -> Result<Address, GatewayError> {
        let (Some(scw), Some(signer)) = (ctx.owner_scw, principal.address()) else {
            return Err(GatewayError::Unauthorized);
        };

        let owner = self
            .chain_reader
            .contract_owner(self.dashboard_chain_id, scw)
            .await
            .map_err(|e| GatewayError::RelayFailure(e.to_string()))?;

        if owner == signer {
            Ok(scw)
        } else {
            Err(GatewayError::Unauthorized)
        }
    }

    async fn check_whitelist(
        &self,
        ctx: &AccessContext<'_>,
        principal: &Principal,
    ) -> Result<(), GatewayError> {
        let (Some(tank), Some(address)) = (ctx.gas_tank, principal.address()) else {
            return Err(GatewayError::Unauthorized);
        };

        if tank.whitelist().contains(address).await {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }
}

/// The project must exist and belong to the verified wallet (or, outside
/// dashboard flows, to the signer).
async fn owned_project(
    registry: &TenantRegistry,
    project_id: &str,
    principal: &Principal,
) -> Result<Arc<Tenant>, GatewayError> {
    let caller = principal
        .owner_scw()
        .or_else(|| principal.address())
        .ok_or(GatewayError::Unauthorized)?;

    let tenant = registry.get_by_id(project_id).await.map_err(|e| match e {
        GatewayError::TenantNotFound(_) => GatewayError::Unauthorized,
        other => other,
    })?;

    if tenant.owner() == caller {
        Ok(tenant)
    } else {
        Err(GatewayError::Unauthorized)
    }
}
