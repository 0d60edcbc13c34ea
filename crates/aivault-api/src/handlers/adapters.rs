use aivault_chain::PositionRange;
use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    AppState,
    dto::{
        AaveConfigureRequest, ApiResponse, SlippageRequest, SubmittedTransaction,
        UniswapV2ConfigureRequest, UniswapV2UpdateRequest, UniswapV3ConfigureRequest,
        UniswapV3UpdateRequest,
    },
    errors::{ApiError, AppJson},
    helpers,
};

fn position_range(fee_tier: i64, tick_lower: i64, tick_upper: i64) -> Result<PositionRange, ApiError> {
    let range = PositionRange {
        fee_tier: helpers::fee_tier(fee_tier)?,
        tick_lower: helpers::tick("tick_lower", tick_lower)?,
        tick_upper: helpers::tick("tick_upper", tick_upper)?,
    };
    if range.tick_lower >= range.tick_upper {
        return Err(ApiError::BadRequest(
            "tick_lower must be below tick_upper".to_string(),
        ));
    }
    Ok(range)
}

fn submitted(tx_hash: ethers::types::H256) -> Json<ApiResponse<SubmittedTransaction>> {
    Json(ApiResponse::ok_with_message(
        SubmittedTransaction::pending(tx_hash),
        "Adapter call submitted",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/adapters/aave/configure",
    tag = "Adapters",
    request_body = AaveConfigureRequest,
    responses(
        (status = 200, description = "Token vault set", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn configure_aave(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AaveConfigureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx_hash = state
        .operations
        .configure_aave(
            helpers::adapter_index(payload.adapter_index)?,
            state.operations.resolve_token(&payload.token_address)?,
            helpers::address("vault_address", &payload.vault_address)?,
        )
        .await?;

    Ok(submitted(tx_hash))
}

#[utoipa::path(
    post,
    path = "/api/v1/adapters/uniswapv2/configure",
    tag = "Adapters",
    request_body = UniswapV2ConfigureRequest,
    responses(
        (status = 200, description = "Token config set", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn configure_uniswap_v2(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UniswapV2ConfigureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx_hash = state
        .operations
        .configure_uniswap_v2(
            helpers::adapter_index(payload.adapter_index)?,
            state.operations.resolve_token(&payload.token_address)?,
            helpers::slippage(payload.slippage_tolerance)?,
            state.operations.resolve_token(&payload.counter_party_token)?,
            helpers::address("vault_address", &payload.vault_address)?,
        )
        .await?;

    Ok(submitted(tx_hash))
}

#[utoipa::path(
    post,
    path = "/api/v1/adapters/uniswapv2/slippage",
    tag = "Adapters",
    request_body = SlippageRequest,
    responses(
        (status = 200, description = "Slippage tolerance updated", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn update_uniswap_v2_slippage(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SlippageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx_hash = state
        .operations
        .update_uniswap_v2_slippage(
            helpers::adapter_index(payload.adapter_index)?,
            state.operations.resolve_token(&payload.token_address)?,
            helpers::slippage(payload.slippage_tolerance)?,
        )
        .await?;

    Ok(submitted(tx_hash))
}

#[utoipa::path(
    post,
    path = "/api/v1/adapters/uniswapv2/update",
    tag = "Adapters",
    request_body = UniswapV2UpdateRequest,
    responses(
        (status = 200, description = "Counter-party token updated and position reinvested", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn update_uniswap_v2_config(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UniswapV2UpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx_hash = state
        .operations
        .update_uniswap_v2_config(
            helpers::adapter_index(payload.adapter_index)?,
            state.operations.resolve_token(&payload.token_address)?,
            state.operations.resolve_token(&payload.counter_party_token)?,
        )
        .await?;

    Ok(submitted(tx_hash))
}

#[utoipa::path(
    post,
    path = "/api/v1/adapters/uniswapv3/configure",
    tag = "Adapters",
    request_body = UniswapV3ConfigureRequest,
    responses(
        (status = 200, description = "Token config set", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn configure_uniswap_v3(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UniswapV3ConfigureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let range = position_range(payload.fee_tier, payload.tick_lower, payload.tick_upper)?;
    let tx_hash = state
        .operations
        .configure_uniswap_v3(
            helpers::adapter_index(payload.adapter_index)?,
            state.operations.resolve_token(&payload.token_address)?,
            state.operations.resolve_token(&payload.counter_party_token)?,
            helpers::slippage(payload.slippage_tolerance)?,
            range,
            helpers::address("vault_address", &payload.vault_address)?,
        )
        .await?;

    Ok(submitted(tx_hash))
}

#[utoipa::path(
    post,
    path = "/api/v1/adapters/uniswapv3/slippage",
    tag = "Adapters",
    request_body = SlippageRequest,
    responses(
        (status = 200, description = "Slippage tolerance updated", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn update_uniswap_v3_slippage(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SlippageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx_hash = state
        .operations
        .update_uniswap_v3_slippage(
            helpers::adapter_index(payload.adapter_index)?,
            state.operations.resolve_token(&payload.token_address)?,
            helpers::slippage(payload.slippage_tolerance)?,
        )
        .await?;

    Ok(submitted(tx_hash))
}

#[utoipa::path(
    post,
    path = "/api/v1/adapters/uniswapv3/update",
    tag = "Adapters",
    request_body = UniswapV3UpdateRequest,
    responses(
        (status = 200, description = "Pool config updated", body = ApiResponse<SubmittedTransaction>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn update_uniswap_v3_config(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UniswapV3UpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let range = position_range(payload.fee_tier, payload.tick_lower, payload.tick_upper)?;
    let tx_hash = state
        .operations
        .update_uniswap_v3_config(
            helpers::adapter_index(payload.adapter_index)?,
            state.operations.resolve_token(&payload.token_address)?,
            state.operations.resolve_token(&payload.counter_party_token)?,
            range,
        )
        .await?;

    Ok(submitted(tx_hash))
}
