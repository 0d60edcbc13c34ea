use axum::Router;
use axum::response::IntoResponse;
use axum::routing::{get, post};

use utoipa::OpenApi as OpenApiT;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ApiError;
use crate::{AppState, handlers};

pub fn api_router<T: OpenApiT>() -> Router<AppState> {
    let open_api = T::openapi();

    let strategies_router = Router::new()
        .route(
            "/",
            post(handlers::create_strategy).get(handlers::list_strategies),
        )
        .route("/execute", post(handlers::execute_strategy))
        .route("/{strategy_id}", get(handlers::get_strategy));

    let vaults_router = Router::new()
        .route(
            "/",
            post(handlers::register_vault).get(handlers::list_vaults),
        )
        .route("/{vault_id}", get(handlers::get_vault))
        .route(
            "/{vault_id}/withdraw-all",
            post(handlers::withdraw_all_investments),
        );

    let executions_router = Router::new()
        .route("/", get(handlers::list_executions))
        .route("/{execution_id}", get(handlers::get_execution));

    let adapters_router = Router::new()
        .route("/aave/configure", post(handlers::configure_aave))
        .route("/uniswapv2/configure", post(handlers::configure_uniswap_v2))
        .route(
            "/uniswapv2/slippage",
            post(handlers::update_uniswap_v2_slippage),
        )
        .route("/uniswapv2/update", post(handlers::update_uniswap_v2_config))
        .route("/uniswapv3/configure", post(handlers::configure_uniswap_v3))
        .route(
            "/uniswapv3/slippage",
            post(handlers::update_uniswap_v3_slippage),
        )
        .route("/uniswapv3/update", post(handlers::update_uniswap_v3_config));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1/strategies", strategies_router)
        .nest("/api/v1/vaults", vaults_router)
        .nest("/api/v1/executions", executions_router)
        .nest("/api/v1/adapters", adapters_router)
        .route("/api/v1/allocations", post(handlers::update_allocations))
        .route(
            "/api/v1/allocations/partial",
            post(handlers::partial_update_allocations),
        )
        .route("/api/v1/withdraw", post(handlers::withdraw))
        .route("/api/v1/account", get(handlers::get_account))
        .merge(SwaggerUi::new("/api/v1/docs").url("/api/v1/docs/openapi.json", open_api))
        .fallback(handler_404)
}

async fn handler_404() -> impl IntoResponse {
    ApiError::NotFound("The requested resource was not found".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aivault_chain::testing::{MockChainClient, ReceiptMode};
    use aivault_chain::{ContractService, TokenBook, parse_address};
    use aivault_metrics::MetricsRegistry;
    use aivault_strategy::testing::InMemoryRepository;
    use aivault_strategy::{StrategyService, VaultOperations};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use ethers::types::Address;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use utoipa::OpenApi;

    use super::*;

    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    #[derive(OpenApi)]
    #[openapi()]
    struct TestDoc;

    struct TestApp {
        router: Router,
        chain: Arc<MockChainClient>,
    }

    fn app() -> TestApp {
        let chain = Arc::new(MockChainClient::new());
        let repository = Arc::new(InMemoryRepository::new());
        let contracts = Arc::new(ContractService::new(
            chain.clone(),
            Address::repeat_byte(0x42),
        ));
        let metrics = MetricsRegistry::new();
        let tokens = TokenBook::default().with_token("WETH", parse_address(WETH).unwrap());

        let state = AppState {
            strategies: StrategyService::new(repository, contracts.clone(), metrics.clone()),
            operations: VaultOperations::new(contracts, tokens, metrics),
        };

        TestApp {
            router: api_router::<TestDoc>().with_state(state),
            chain,
        }
    }

    async fn call(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn raw_post(app: &TestApp, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn strategy_body() -> Value {
        json!({
            "name": "balanced",
            "description": "60/40 lending and liquidity",
            "allocations": [
                {"adapter_index": 0, "percentage": 600, "protocol": "aave"},
                {"adapter_index": 1, "percentage": 400, "protocol": "uniswap_v3"}
            ]
        })
    }

    async fn create_strategy(app: &TestApp) -> String {
        let (status, body) = call(app, Method::POST, "/api/v1/strategies", Some(strategy_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn register_vault(app: &TestApp) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/v1/vaults",
            Some(json!({
                "address": "0x7777777777777777777777777777777777777777",
                "token_address": "weth",
                "token_symbol": "WETH",
                "token_name": "Wrapped Ether",
                "total_assets": "12.5"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_is_bare_json() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].as_i64().unwrap() > 0);
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_returns_error_envelope() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/v2/nothing", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_create_then_fetch_strategy() {
        let app = app();
        let id = create_strategy(&app).await;

        let (status, body) = call(&app, Method::GET, &format!("/api/v1/strategies/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["data"]["name"], "balanced");
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["allocations"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["allocations"][0]["percentage"], 600);

        let (status, body) = call(&app, Method::GET, "/api/v1/strategies?limit=500", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["limit"], 100);
        assert_eq!(body["data"]["offset"], 0);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_strategy_validation_errors() {
        let app = app();

        let mut too_large = strategy_body();
        too_large["allocations"][0]["percentage"] = json!(1001);
        let (status, body) = call(&app, Method::POST, "/api/v1/strategies", Some(too_large)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("percentage"));

        let mut unnamed = strategy_body();
        unnamed["name"] = json!("  ");
        let (status, _) = call(&app, Method::POST, "/api/v1/strategies", Some(unnamed)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut empty = strategy_body();
        empty["allocations"] = json!([]);
        let (status, _) = call(&app, Method::POST, "/api/v1/strategies", Some(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_overlong_text_fields_are_rejected_before_storage() {
        let app = app();

        let mut long_name = strategy_body();
        long_name["name"] = json!("x".repeat(256));
        let (status, body) = call(&app, Method::POST, "/api/v1/strategies", Some(long_name)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("name"));

        let mut long_protocol = strategy_body();
        long_protocol["allocations"][0]["protocol"] = json!("p".repeat(65));
        let (status, _) = call(&app, Method::POST, "/api/v1/strategies", Some(long_protocol)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/vaults",
            Some(json!({
                "address": "0x7777777777777777777777777777777777777777",
                "token_address": WETH,
                "token_symbol": "S".repeat(33),
                "token_name": "Wrapped Ether"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("token_symbol"));

        let (_, body) = call(&app, Method::GET, "/api/v1/strategies", None).await;
        assert!(body["data"]["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fractional_total_assets_are_kept() {
        let app = app();
        let vault_id = register_vault(&app).await;

        let (status, body) = call(&app, Method::GET, &format!("/api/v1/vaults/{vault_id}"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_assets"], "12.5");
    }

    #[tokio::test]
    async fn test_malformed_json_gets_envelope() {
        let app = app();
        let (status, body) = raw_post(&app, "/api/v1/strategies", "{\"name\": ").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_bad_and_unknown_identifiers() {
        let app = app();

        let (status, _) = call(&app, Method::GET, "/api/v1/strategies/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let unknown = "9b2f3c1e-8d4a-4f6b-a1c2-3d4e5f6a7b8c";
        let (status, body) = call(&app, Method::GET, &format!("/api/v1/vaults/{unknown}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_execute_strategy_once() {
        let app = app();
        let strategy_id = create_strategy(&app).await;
        let vault_id = register_vault(&app).await;
        let request = json!({"strategy_id": strategy_id, "vault_id": vault_id});

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/strategies/execute",
            Some(request.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["kind"], "strategy");
        assert!(body["data"]["tx_hash"].as_str().unwrap().starts_with("0x"));
        assert_eq!(app.chain.sent().len(), 1);

        let (status, body) = call(&app, Method::POST, "/api/v1/strategies/execute", Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("pending"));
        assert_eq!(app.chain.sent().len(), 1);

        let (status, body) = call(&app, Method::GET, &format!("/api/v1/strategies/{strategy_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");

        let (status, body) = call(&app, Method::GET, "/api/v1/executions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reverted_withdraw_all_reports_details() {
        let app = app();
        let vault_id = register_vault(&app).await;
        app.chain.set_receipt_mode(ReceiptMode::Reverted);

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/vaults/{vault_id}/withdraw-all"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["details"].as_str().unwrap().contains("0x"));

        let (_, body) = call(&app, Method::GET, "/api/v1/executions", None).await;
        let execution = &body["data"]["items"][0];
        assert_eq!(execution["status"], "failed");
        assert_eq!(execution["kind"], "withdraw_all");
        assert!(execution["strategy_id"].is_null());
    }

    #[tokio::test]
    async fn test_allocations_accept_token_symbol() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/allocations",
            Some(json!({
                "token_address": "WETH",
                "allocations": [
                    {"adapter_index": 0, "percentage": 700},
                    {"adapter_index": 1, "percentage": 300}
                ]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(app.chain.sent().len(), 1);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/withdraw",
            Some(json!({"token_address": "SHIB"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_uniswap_v3_rejects_inverted_ticks() {
        let app = app();
        let mut body = json!({
            "adapter_index": 2,
            "token_address": WETH,
            "counter_party_token": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "slippage_tolerance": 50,
            "fee_tier": 3000,
            "tick_lower": -600,
            "tick_upper": 600,
            "vault_address": "0x7777777777777777777777777777777777777777"
        });

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/adapters/uniswapv3/configure",
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        body["tick_lower"] = json!(600);
        body["tick_upper"] = json!(-600);
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/adapters/uniswapv3/configure",
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_slippage_above_limit_is_rejected() {
        let app = app();
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/adapters/uniswapv2/slippage",
            Some(json!({
                "adapter_index": 1,
                "token_address": WETH,
                "slippage_tolerance": 10_001
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(app.chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_aave_configure_submits_execute() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/adapters/aave/configure",
            Some(json!({
                "adapter_index": 0,
                "token_address": "weth",
                "vault_address": "0x7777777777777777777777777777777777777777"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "pending");
        let sent = app.chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Address::repeat_byte(0x42));
    }

    #[tokio::test]
    async fn test_account_snapshot() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/account", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["address"],
            format!("{:#x}", Address::repeat_byte(0x5e))
        );
        assert_eq!(body["data"]["tokens"][0]["symbol"], "WETH");
        assert_eq!(body["data"]["next_transaction"]["chain_id"], 31_337);
    }
}
