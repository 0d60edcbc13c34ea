use aivault_db::{Pagination, limits};
use aivault_strategy::{VaultRegistration, parse_total_assets};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    dto::{ApiResponse, ExecutionDto, Page, PaginationQuery, RegisterVaultRequest, VaultDto},
    errors::{ApiError, AppJson},
    helpers,
};

#[utoipa::path(
    post,
    path = "/api/v1/vaults",
    tag = "Vaults",
    request_body = RegisterVaultRequest,
    responses(
        (status = 201, description = "Vault registered", body = ApiResponse<VaultDto>),
        (status = 400, description = "Invalid request or duplicate address")
    )
)]
pub async fn register_vault(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterVaultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = VaultRegistration {
        address: helpers::address("address", &payload.address)?,
        token_address: state.operations.resolve_token(&payload.token_address)?,
        token_symbol: helpers::bounded("token_symbol", &payload.token_symbol, limits::TOKEN_SYMBOL)?
            .to_string(),
        token_name: helpers::bounded("token_name", &payload.token_name, limits::TOKEN_NAME)?
            .to_string(),
        total_assets: parse_total_assets(payload.total_assets.as_deref().unwrap_or("0"))?,
    };

    let vault = state.strategies.register_vault(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            VaultDto::from(vault),
            "Vault registered",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/vaults",
    tag = "Vaults",
    params(PaginationQuery),
    responses((status = 200, description = "Vaults, newest first", body = ApiResponse<Page<VaultDto>>))
)]
pub async fn list_vaults(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = Pagination::from(query);
    let vaults = state.strategies.list_vaults(pagination).await?;

    Ok(Json(ApiResponse::ok(Page {
        items: vaults.into_iter().map(VaultDto::from).collect(),
        limit: pagination.limit,
        offset: pagination.offset,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/vaults/{vault_id}",
    tag = "Vaults",
    params(("vault_id" = String, Path, description = "Vault identifier")),
    responses(
        (status = 200, description = "Vault", body = ApiResponse<VaultDto>),
        (status = 404, description = "Vault not found")
    )
)]
pub async fn get_vault(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = helpers::parse_id(&vault_id, "vault")?;
    let vault = state.strategies.get_vault(id).await?;

    Ok(Json(ApiResponse::ok(VaultDto::from(vault))))
}

#[utoipa::path(
    post,
    path = "/api/v1/vaults/{vault_id}/withdraw-all",
    tag = "Vaults",
    params(("vault_id" = String, Path, description = "Vault identifier")),
    responses(
        (status = 200, description = "All investments withdrawn", body = ApiResponse<ExecutionDto>),
        (status = 404, description = "Vault not found"),
        (status = 500, description = "Submission or confirmation failed")
    )
)]
pub async fn withdraw_all_investments(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = helpers::parse_id(&vault_id, "vault")?;
    let execution = state.strategies.withdraw_all_investments(id).await?;

    Ok(Json(ApiResponse::ok_with_message(
        ExecutionDto::from(execution),
        "All investments withdrawn",
    )))
}
