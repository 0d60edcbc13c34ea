pub mod docs;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod helpers;
pub mod router;

use std::net::SocketAddr;
use std::time::Duration;

use aivault_strategy::{StrategyService, VaultOperations};
use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum_tracing_opentelemetry::middleware::{OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use pragma_common::services::{Service, ServiceRunner};

use docs::ApiDoc;
use router::api_router;

#[derive(Clone)]
pub struct AppState {
    pub strategies: StrategyService,
    pub operations: VaultOperations,
}

/// Middleware settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Comma separated origins. `None` means permissive CORS.
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,
    pub rate_limit_cleanup_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: None,
            rate_limit_enabled: true,
            rate_limit_per_second: 5,
            rate_limit_burst_size: 20,
            rate_limit_cleanup_interval: Duration::from_secs(60),
        }
    }
}

pub struct ApiService {
    state: AppState,
    host: String,
    port: u16,
    http: HttpConfig,
}

impl ApiService {
    pub fn new(state: AppState, host: &str, port: u16, http: HttpConfig) -> Self {
        Self {
            state,
            host: host.to_owned(),
            port,
            http,
        }
    }
}

fn parse_origins(origins: &str) -> Vec<HeaderValue> {
    origins
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                return None;
            }
            match HeaderValue::from_str(trimmed) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(
                        origin = trimmed,
                        error = %err,
                        "Invalid origin in CORS_ALLOWED_ORIGINS, skipping",
                    );
                    None
                }
            }
        })
        .collect()
}

pub fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let Some(origins) = allowed else {
        tracing::info!("CORS_ALLOWED_ORIGINS not set; using permissive CORS configuration");
        return CorsLayer::permissive();
    };

    let allowed_origins = parse_origins(origins);
    if allowed_origins.is_empty() {
        tracing::warn!(
            "CORS_ALLOWED_ORIGINS was set but no valid origins were parsed; falling back to permissive CORS",
        );
        return CorsLayer::permissive();
    }

    tracing::info!(allowed = %origins, "Configured restricted CORS origins");

    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_origin(AllowOrigin::list(allowed_origins))
}

#[async_trait::async_trait]
impl Service for ApiService {
    async fn start<'a>(&mut self, mut runner: ServiceRunner<'a>) -> anyhow::Result<()> {
        ApiDoc::generate_openapi_json("./".into())?;

        let host = self.host.clone();
        let port = self.port;
        let state = self.state.clone();
        let http = self.http.clone();

        runner.spawn_loop(move |ctx| async move {
            let address = format!("{host}:{port}");
            let socket_addr: SocketAddr = address.parse()?;
            let listener = TcpListener::bind(socket_addr).await?;

            #[allow(clippy::default_constructed_unit_structs)]
            let app = {
                let base = api_router::<ApiDoc>()
                    .with_state(state)
                    // include trace context as header into the response
                    //start OpenTelemetry trace on incoming request
                    .layer(OtelAxumLayer::default())
                    .layer(OtelInResponseLayer::default());

                let base = if http.rate_limit_enabled {
                    let governor_conf = GovernorConfigBuilder::default()
                        .per_second(http.rate_limit_per_second)
                        .burst_size(http.rate_limit_burst_size)
                        .use_headers()
                        .finish()
                        .context("invalid rate limit configuration")?;

                    // Periodic cleanup of the limiter's internal storage, with graceful shutdown.
                    let governor_limiter = governor_conf.limiter().clone();
                    let cancel_token = ctx.token.clone();
                    let cleanup_every = http.rate_limit_cleanup_interval;
                    tokio::spawn(async move {
                        let mut ticker = tokio::time::interval(cleanup_every);
                        loop {
                            tokio::select! {
                                _ = ticker.tick() => {
                                    tracing::debug!("rate limiting storage size: {}", governor_limiter.len());
                                    governor_limiter.retain_recent();
                                }
                                () = cancel_token.cancelled() => {
                                    tracing::debug!("rate limiter cleanup task shutting down");
                                    break;
                                }
                            }
                        }
                    });

                    base.layer(GovernorLayer::new(governor_conf))
                } else {
                    tracing::info!("rate limiter disabled");
                    base
                };

                base.layer(cors_layer(http.cors_allowed_origins.as_deref()))
            };

            tracing::info!("🧩 API started at http://{}", socket_addr);

            let token = ctx.token.clone();
            let shutdown = async move { token.cancelled().await };

            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown)
            .await
            .context("😱 API server stopped!")
        });

        Ok(())
    }
}
