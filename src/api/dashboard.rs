// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Dashboard API endpoints.
//!
//! Operators authenticate with a nonce issued on the dashboard project's gas
//! tank and act on behalf of a smart contract wallet (`ownerScw`) whose
//! on-chain `owner()` is the signer. Projects are owned by that wallet.
//!
//! All routes are `POST` so the signed challenge can travel in the body;
//! removing a whitelist entry uses `DELETE` with a body.

use std::sync::Arc;

use alloy::primitives::Address;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::validation::{
        AddGasTank, CreateProject, DashboardCredentials, UpdateGasTank, UpdateProject, Valid,
        WhitelistChange,
    },
    auth::{AccessContext, OperationCategory, RequestOrigin},
    blockchain::ChainRef,
    error::{ApiError, GatewayError},
    models::{
        AddGasTankRequest, CreateProjectRequest, CreateProjectResponse, DashboardAuth,
        UpdateGasTankRequest, UpdateProjectRequest, WhitelistRequest, WhitelistResponse,
    },
    registry::{NewProject, Tenant},
    state::AppState,
    storage::{GasTankRecord, ProjectRecord},
};

/// Run the dashboard checks. With `project_id`, the project must belong to
/// the verified wallet; it is only looked up after the caller authenticated.
/// Returns that wallet and the resolved project.
async fn authorize_dashboard(
    state: &AppState,
    origin: &RequestOrigin,
    credentials: &DashboardCredentials,
    project_id: Option<&str>,
) -> Result<(Address, Option<Arc<Tenant>>), GatewayError> {
    let origins = &state.dashboard.allowed_origins;
    state.access.screen_origin(origin.as_deref(), origins)?;

    let tank = state.dashboard_tank().await?;
    let mut ctx = AccessContext::new(OperationCategory::DashboardAdmin, origin.as_deref(), origins)
        .with_session(&tank, None, Some(&credentials.hook))
        .with_owner_scw(credentials.owner_scw);
    if let Some(project_id) = project_id {
        ctx = ctx.with_project(&state.tenants, project_id);
    }
    let principal = state.access.evaluate(&ctx).await.into_result()?;
    let owner_scw = principal.owner_scw().ok_or(GatewayError::Unauthorized)?;

    Ok((owner_scw, principal.tenant().cloned()))
}

/// Same as [`authorize_dashboard`] for routes that address a project.
async fn authorize_project(
    state: &AppState,
    origin: &RequestOrigin,
    credentials: &DashboardCredentials,
    project_id: &str,
) -> Result<Arc<Tenant>, GatewayError> {
    let (_, tenant) = authorize_dashboard(state, origin, credentials, Some(project_id)).await?;
    tenant.ok_or(GatewayError::Unauthorized)
}

/// Chain of a `{chain}` path segment, resolved against the supported set.
fn chain_id(tenant: &Tenant, raw: &str) -> Result<u64, GatewayError> {
    let chain = ChainRef::parse(raw);
    chain.resolve().ok_or_else(|| GatewayError::GasTankNotFound {
        tenant_id: tenant.id().to_string(),
        chain: chain.to_string(),
    })
}

async fn gas_tank_record(tenant: &Tenant, chain_id: u64) -> Result<GasTankRecord, GatewayError> {
    tenant
        .gas_tanks()
        .list()
        .await?
        .into_iter()
        .find(|tank| tank.chain_id == chain_id)
        .ok_or_else(|| GatewayError::GasTankNotFound {
            tenant_id: tenant.id().to_string(),
            chain: chain_id.to_string(),
        })
}

// =============================================================================
// Projects
// =============================================================================

/// List projects owned by the caller's wallet.
#[utoipa::path(
    post,
    path = "/dashboard/projects",
    tag = "Dashboard",
    request_body = DashboardAuth,
    responses(
        (status = 200, description = "Projects owned by ownerScw", body = Vec<ProjectRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Valid(credentials): Valid<DashboardAuth>,
) -> Result<Json<Vec<ProjectRecord>>, ApiError> {
    let (owner, _) = authorize_dashboard(&state, &origin, &credentials, None).await?;
    Ok(Json(state.tenants.list_by_owner(owner).await?))
}

/// Create a project owned by the caller's wallet.
#[utoipa::path(
    post,
    path = "/dashboard/project",
    tag = "Dashboard",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = CreateProjectResponse),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    origin: RequestOrigin,
    Valid(cmd): Valid<CreateProjectRequest>,
) -> Result<(StatusCode, Json<CreateProjectResponse>), ApiError> {
    let CreateProject {
        auth,
        name,
        allowed_origins,
    } = cmd;
    let (owner, _) = authorize_dashboard(&state, &origin, &auth, None).await?;

    let record = state
        .tenants
        .create(NewProject {
            name,
            owner,
            allowed_origins,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            id: record.id,
            api_key: record.api_key,
        }),
    ))
}

/// Rename a project or replace its allowed origins.
#[utoipa::path(
    post,
    path = "/dashboard/project/{project_id}",
    tag = "Dashboard",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectRecord),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Unauthorized or unknown project"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<UpdateProjectRequest>,
) -> Result<Json<ProjectRecord>, ApiError> {
    let UpdateProject { auth, update } = cmd;
    authorize_project(&state, &origin, &auth, &project_id).await?;

    Ok(Json(state.tenants.update(&project_id, update).await?))
}

// =============================================================================
// Gas Tanks
// =============================================================================

/// List the gas tanks of a project.
#[utoipa::path(
    post,
    path = "/dashboard/project/{project_id}/gasTanks",
    tag = "Dashboard",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body = DashboardAuth,
    responses(
        (status = 200, description = "Gas tanks of the project", body = Vec<GasTankRecord>),
        (status = 401, description = "Unauthorized or unknown project"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn list_gas_tanks(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    origin: RequestOrigin,
    Valid(credentials): Valid<DashboardAuth>,
) -> Result<Json<Vec<GasTankRecord>>, ApiError> {
    let tenant = authorize_project(&state, &origin, &credentials, &project_id).await?;
    Ok(Json(tenant.gas_tanks().list().await?))
}

/// Add a gas tank to a project.
#[utoipa::path(
    post,
    path = "/dashboard/project/{project_id}/gasTank",
    tag = "Dashboard",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body = AddGasTankRequest,
    responses(
        (status = 201, description = "Gas tank added", body = GasTankRecord),
        (status = 400, description = "Unsupported chain, duplicate tank or invalid body"),
        (status = 401, description = "Unauthorized or unknown project"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn add_gas_tank(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    origin: RequestOrigin,
    Valid(cmd): Valid<AddGasTankRequest>,
) -> Result<(StatusCode, Json<GasTankRecord>), ApiError> {
    let AddGasTank {
        auth,
        chain,
        provider_url,
        whitelist,
    } = cmd;
    let tenant = authorize_project(&state, &origin, &auth, &project_id).await?;

    let chain_id = chain
        .resolve()
        .ok_or_else(|| GatewayError::UnsupportedChain(chain.to_string()))?;
    let record = tenant
        .gas_tanks()
        .add_gas_tank(GasTankRecord {
            chain_id,
            provider_url,
            whitelist,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Point a gas tank at a new provider URL.
#[utoipa::path(
    post,
    path = "/dashboard/project/{project_id}/gasTank/{chain}",
    tag = "Dashboard",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("chain" = String, Path, description = "Chain ID or name")
    ),
    request_body = UpdateGasTankRequest,
    responses(
        (status = 200, description = "Gas tank updated", body = GasTankRecord),
        (status = 400, description = "Unknown gas tank or invalid body"),
        (status = 401, description = "Unauthorized or unknown project"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn update_gas_tank(
    State(state): State<AppState>,
    Path((project_id, chain)): Path<(String, String)>,
    origin: RequestOrigin,
    Valid(cmd): Valid<UpdateGasTankRequest>,
) -> Result<Json<GasTankRecord>, ApiError> {
    let UpdateGasTank { auth, provider_url } = cmd;
    let tenant = authorize_project(&state, &origin, &auth, &project_id).await?;
    let chain_id = chain_id(&tenant, &chain)?;

    tenant
        .gas_tanks()
        .update_provider(chain_id, &provider_url)
        .await?;

    Ok(Json(gas_tank_record(&tenant, chain_id).await?))
}

// =============================================================================
// Whitelist
// =============================================================================

async fn change_whitelist(
    state: &AppState,
    project_id: &str,
    chain: &str,
    origin: &RequestOrigin,
    cmd: WhitelistChange,
    add: bool,
) -> Result<WhitelistResponse, GatewayError> {
    let tenant = authorize_project(state, origin, &cmd.auth, project_id).await?;
    let chain_id = chain_id(&tenant, chain)?;
    let tank = tenant
        .gas_tanks()
        .load_and_get(&ChainRef::Id(chain_id), false)
        .await?;

    let whitelist = tank.whitelist();
    let changed = if add {
        whitelist.add(cmd.address).await?
    } else {
        whitelist.remove(cmd.address).await?
    };

    Ok(WhitelistResponse {
        changed,
        whitelist: whitelist
            .members()
            .await
            .iter()
            .map(Address::to_string)
            .collect(),
    })
}

/// Add an address to a gas tank whitelist.
#[utoipa::path(
    post,
    path = "/dashboard/project/{project_id}/gasTank/{chain}/whitelist",
    tag = "Dashboard",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("chain" = String, Path, description = "Chain ID or name")
    ),
    request_body = WhitelistRequest,
    responses(
        (status = 200, description = "Whitelist after the change", body = WhitelistResponse),
        (status = 400, description = "Unknown gas tank or invalid body"),
        (status = 401, description = "Unauthorized or unknown project"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn add_to_whitelist(
    State(state): State<AppState>,
    Path((project_id, chain)): Path<(String, String)>,
    origin: RequestOrigin,
    Valid(cmd): Valid<WhitelistRequest>,
) -> Result<Json<WhitelistResponse>, ApiError> {
    Ok(Json(
        change_whitelist(&state, &project_id, &chain, &origin, cmd, true).await?,
    ))
}

/// Remove an address from a gas tank whitelist.
#[utoipa::path(
    delete,
    path = "/dashboard/project/{project_id}/gasTank/{chain}/whitelist",
    tag = "Dashboard",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("chain" = String, Path, description = "Chain ID or name")
    ),
    request_body = WhitelistRequest,
    responses(
        (status = 200, description = "Whitelist after the change", body = WhitelistResponse),
        (status = 400, description = "Unknown gas tank or invalid body"),
        (status = 401, description = "Unauthorized or unknown project"),
        (status = 404, description = "Origin not found")
    )
)]
pub async fn remove_from_whitelist(
    State(state): State<AppState>,
    Path((project_id, chain)): Path<(String, String)>,
    origin: RequestOrigin,
    Valid(cmd): Valid<WhitelistRequest>,
) -> Result<Json<WhitelistResponse>, ApiError> {
    Ok(Json(
        change_whitelist(&state, &project_id, &chain, &origin, cmd, false).await?,
    ))
}
