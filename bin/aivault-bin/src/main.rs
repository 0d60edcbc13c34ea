mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use ethers::types::U256;
use pragma_common::{
    services::{Service, ServiceGroup},
    telemetry::init_telemetry,
};
use tracing_subscriber::EnvFilter;

use aivault_api::{ApiService, AppState};
use aivault_chain::{ChainConfig, ContractService, EvmClient, NonceSyncTask, TokenBook, parse_address};
use aivault_db::{init_pool, run_migrations};
use aivault_metrics::MetricsRegistry;
use aivault_strategy::{PgStrategyRepository, StrategyService, VaultOperations};

use crate::cli::AivaultCli;

const APP_NAME: &str = "aivault_backend";

fn init_logging(otel_collector_endpoint: Option<String>, log_level: &str) -> Result<()> {
    if otel_collector_endpoint.is_some() {
        return init_telemetry(APP_NAME, otel_collector_endpoint)
            .map_err(|e| anyhow::anyhow!("Could not init telemetry: {e}"));
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .init();
    Ok(())
}

fn chain_config(cli: &AivaultCli) -> Result<ChainConfig> {
    let mut config = ChainConfig::new(&cli.eth_rpc_url, &cli.private_key, &cli.vault_manager_address)
        .context("Invalid chain configuration")?;

    config.max_gas_limit = U256::from(cli.max_gas_limit);
    config.receipt_poll_interval = Duration::from_millis(cli.receipt_poll_interval_ms);
    config.receipt_timeout = Duration::from_secs(cli.receipt_timeout_secs);
    config.nonce_resync_interval = Duration::from_secs(cli.nonce_resync_interval_secs);

    let mut tokens = TokenBook::default();
    for (symbol, address) in cli.tokens() {
        let address = parse_address(address)
            .with_context(|| format!("Invalid {symbol}_ADDRESS '{address}'"))?;
        tokens = tokens.with_token(symbol, address);
    }
    config.tokens = tokens;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = AivaultCli::parse();
    init_logging(cli.otel_collector_endpoint.clone(), &cli.log_level)?;

    let config = chain_config(&cli)?;
    tracing::info!(?config, "Starting AI vault backend");

    let evm_client = Arc::new(
        EvmClient::connect(&config)
            .await
            .context("Could not connect to the Ethereum node")?,
    );

    let pool = init_pool(APP_NAME, &cli.database_url()).context("Could not init the database pool")?;
    run_migrations(&pool)
        .await
        .context("Could not run database migrations")?;

    let metrics = MetricsRegistry::new();
    let contracts = Arc::new(ContractService::new(evm_client.clone(), config.vault_manager));
    let repository = Arc::new(PgStrategyRepository::new(pool));

    let app_state = AppState {
        strategies: StrategyService::new(repository, contracts.clone(), metrics.clone()),
        operations: VaultOperations::new(contracts, config.tokens.clone(), metrics),
    };

    let api_service = ApiService::new(
        app_state,
        &cli.server_host,
        cli.server_port,
        cli.http_config(),
    );
    let nonce_service = NonceSyncTask::new(evm_client, config.nonce_resync_interval);

    ServiceGroup::default()
        .with(api_service)
        .with(nonce_service)
        .start_and_drive_to_end()
        .await?;

    Ok(())
}
