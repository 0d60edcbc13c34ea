use aivault_strategy::{AllocationDraft, StrategyDraft};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    dto::{
        ApiResponse, CreateStrategyRequest, ExecuteStrategyRequest, ExecutionDto, Page,
        PaginationQuery, StrategyDto,
    },
    errors::{ApiError, AppJson},
    helpers,
};
use aivault_db::{Pagination, limits};

fn draft_from_request(request: CreateStrategyRequest) -> Result<StrategyDraft, ApiError> {
    let name = helpers::bounded("name", &request.name, limits::STRATEGY_NAME)?.to_string();
    if request.allocations.is_empty() {
        return Err(ApiError::BadRequest(
            "allocations must not be empty".to_string(),
        ));
    }

    let allocations = request
        .allocations
        .into_iter()
        .map(|allocation| {
            Ok(AllocationDraft {
                adapter_index: helpers::adapter_index(allocation.adapter_index)?,
                percentage: helpers::percentage("percentage", allocation.percentage)?,
                protocol: helpers::bounded("protocol", &allocation.protocol, limits::PROTOCOL)?
                    .to_string(),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(StrategyDraft {
        name,
        description: request.description,
        allocations,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/strategies",
    tag = "Strategies",
    request_body = CreateStrategyRequest,
    responses(
        (status = 201, description = "Strategy created", body = ApiResponse<StrategyDto>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_strategy(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStrategyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = draft_from_request(payload)?;
    let created = state.strategies.create_strategy(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            StrategyDto::from(created),
            "Strategy created",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/strategies",
    tag = "Strategies",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Strategies, newest first", body = ApiResponse<Page<StrategyDto>>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_strategies(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = Pagination::from(query);
    let strategies = state.strategies.list_strategies(pagination).await?;

    Ok(Json(ApiResponse::ok(Page {
        items: strategies.into_iter().map(StrategyDto::from).collect(),
        limit: pagination.limit,
        offset: pagination.offset,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/strategies/{strategy_id}",
    tag = "Strategies",
    params(("strategy_id" = String, Path, description = "Strategy identifier")),
    responses(
        (status = 200, description = "Strategy with its allocations", body = ApiResponse<StrategyDto>),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "Strategy not found")
    )
)]
pub async fn get_strategy(
    State(state): State<AppState>,
    Path(strategy_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = helpers::parse_id(&strategy_id, "strategy")?;
    let strategy = state.strategies.get_strategy(id).await?;

    Ok(Json(ApiResponse::ok(StrategyDto::from(strategy))))
}

#[utoipa::path(
    post,
    path = "/api/v1/strategies/execute",
    tag = "Strategies",
    request_body = ExecuteStrategyRequest,
    responses(
        (status = 200, description = "Strategy executed", body = ApiResponse<ExecutionDto>),
        (status = 400, description = "Invalid request or strategy not pending"),
        (status = 404, description = "Strategy or vault not found"),
        (status = 500, description = "Submission or confirmation failed")
    )
)]
pub async fn execute_strategy(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ExecuteStrategyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let strategy_id = helpers::parse_id(&payload.strategy_id, "strategy")?;
    let vault_id = helpers::parse_id(&payload.vault_id, "vault")?;

    let execution = state
        .strategies
        .execute_strategy(strategy_id, vault_id)
        .await?;

    Ok(Json(ApiResponse::ok_with_message(
        ExecutionDto::from(execution),
        "Strategy executed",
    )))
}
