use aivault_chain::{AllocationTarget, DivestLeg, InvestLeg, ReallocationPlan};
use aivault_strategy::parse_amount;
use axum::{Json, extract::State, response::IntoResponse};
use ethers::types::U256;

use crate::{
    AppState,
    dto::{
        AccountResponse, ApiResponse, PartialUpdateRequest, SubmittedTransaction,
        UpdateAllocationsRequest, WithdrawRequest,
    },
    errors::{ApiError, AppJson},
    helpers,
};

#[utoipa::path(
    post,
    path = "/api/v1/allocations",
    tag = "Vault manager",
    request_body = UpdateAllocationsRequest,
    responses(
        (status = 200, description = "Allocation update broadcast", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn update_allocations(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAllocationsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.operations.resolve_token(&payload.token_address)?;
    if payload.allocations.is_empty() {
        return Err(ApiError::BadRequest(
            "allocations must not be empty".to_string(),
        ));
    }

    let targets = payload
        .allocations
        .iter()
        .map(|allocation| {
            Ok(AllocationTarget {
                adapter_index: U256::from(helpers::adapter_index(allocation.adapter_index)?),
                allocation: U256::from(helpers::percentage("percentage", allocation.percentage)?),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let tx_hash = state.operations.update_allocations(token, &targets).await?;

    Ok(Json(ApiResponse::ok_with_message(
        SubmittedTransaction::pending(tx_hash),
        "Allocation update submitted",
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/allocations/partial",
    tag = "Vault manager",
    request_body = PartialUpdateRequest,
    responses(
        (status = 200, description = "Partial reallocation broadcast", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn partial_update_allocations(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PartialUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.operations.resolve_token(&payload.token_address)?;

    let divest = payload
        .divest
        .iter()
        .map(|leg| {
            Ok(DivestLeg {
                adapter_index: U256::from(helpers::adapter_index(leg.adapter_index)?),
                amount: parse_amount(&leg.amount)?,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    let invest = payload
        .invest
        .iter()
        .map(|leg| {
            Ok(InvestLeg {
                adapter_index: U256::from(helpers::adapter_index(leg.adapter_index)?),
                amount: parse_amount(&leg.amount)?,
                allocation: U256::from(helpers::percentage("allocation", leg.allocation)?),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let plan = ReallocationPlan { divest, invest };
    let tx_hash = state
        .operations
        .partial_update_allocations(token, &plan)
        .await?;

    Ok(Json(ApiResponse::ok_with_message(
        SubmittedTransaction::pending(tx_hash),
        "Partial reallocation submitted",
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/withdraw",
    tag = "Vault manager",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal broadcast", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    AppJson(payload): AppJson<WithdrawRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.operations.resolve_token(&payload.token_address)?;
    let tx_hash = state.operations.withdraw_all(token).await?;

    Ok(Json(ApiResponse::ok_with_message(
        SubmittedTransaction::pending(tx_hash),
        "Withdrawal submitted",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/account",
    tag = "Vault manager",
    responses(
        (status = 200, description = "Signer account state", body = ApiResponse<AccountResponse>),
        (status = 500, description = "RPC failure")
    )
)]
pub async fn get_account(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let account = state.operations.account().await?;
    Ok(Json(ApiResponse::ok(AccountResponse::from(account))))
}
