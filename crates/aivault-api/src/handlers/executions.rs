use aivault_db::Pagination;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    AppState,
    dto::{ApiResponse, ExecutionDto, Page, PaginationQuery},
    errors::ApiError,
    helpers,
};

#[utoipa::path(
    get,
    path = "/api/v1/executions",
    tag = "Executions",
    params(PaginationQuery),
    responses((status = 200, description = "Executions, newest first", body = ApiResponse<Page<ExecutionDto>>))
)]
pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = Pagination::from(query);
    let executions = state.strategies.list_executions(pagination).await?;

    Ok(Json(ApiResponse::ok(Page {
        items: executions.into_iter().map(ExecutionDto::from).collect(),
        limit: pagination.limit,
        offset: pagination.offset,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/executions/{execution_id}",
    tag = "Executions",
    params(("execution_id" = String, Path, description = "Execution identifier")),
    responses(
        (status = 200, description = "Execution with its strategy, vault and transactions", body = ApiResponse<ExecutionDto>),
        (status = 404, description = "Execution not found")
    )
)]
pub async fn get_execution(
    State(state): State<AppState>,
    Path(execution_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = helpers::parse_id(&execution_id, "execution")?;
    let execution = state.strategies.get_execution(id).await?;

    Ok(Json(ApiResponse::ok(ExecutionDto::from(execution))))
}
