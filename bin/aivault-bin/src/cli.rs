use std::time::Duration;

use aivault_api::HttpConfig;
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about = "AI vault strategy execution backend", long_about = None)]
pub struct AivaultCli {
    /// Address the HTTP server binds to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub server_host: String,

    /// API port
    #[arg(long, env = "SERVER_PORT", default_value = "8080")]
    pub server_port: u16,

    /// Ethereum JSON-RPC endpoint
    #[arg(long, env = "ETH_RPC_URL", default_value = "http://localhost:8545")]
    pub eth_rpc_url: String,

    /// Hex encoded signing key, `0x` prefix optional
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    #[arg(long, env = "VAULT_MANAGER_ADDRESS")]
    pub vault_manager_address: String,

    /// Gas limit cap applied to every transaction
    #[arg(long, env = "MAX_GAS_LIMIT", default_value = "15000000")]
    pub max_gas_limit: u64,

    #[arg(long, env = "WETH_ADDRESS")]
    pub weth_address: Option<String>,

    #[arg(long, env = "USDC_ADDRESS")]
    pub usdc_address: Option<String>,

    #[arg(long, env = "DAI_ADDRESS")]
    pub dai_address: Option<String>,

    /// Full database URL. Assembled from the `DB_*` values when absent.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value = "5432")]
    pub db_port: u16,

    #[arg(long, env = "DB_USER", default_value = "postgres")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,

    #[arg(long, env = "DB_NAME", default_value = "ai_vault")]
    pub db_name: String,

    /// Default log filter when `RUST_LOG` is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// OTEL collector endpoint
    #[arg(long, env = "OTEL_COLLECTOR_ENDPOINT")]
    pub otel_collector_endpoint: Option<String>,

    #[arg(long, env = "RECEIPT_POLL_INTERVAL_MS", default_value = "2000")]
    pub receipt_poll_interval_ms: u64,

    #[arg(long, env = "RECEIPT_TIMEOUT_SECS", default_value = "180")]
    pub receipt_timeout_secs: u64,

    #[arg(long, env = "NONCE_RESYNC_INTERVAL_SECS", default_value = "60")]
    pub nonce_resync_interval_secs: u64,

    /// Comma separated list of allowed origins, permissive when absent
    #[arg(long, env = "CORS_ALLOWED_ORIGINS")]
    pub cors_allowed_origins: Option<String>,

    #[arg(long, env = "RATE_LIMIT_ENABLED", default_value = "true", action = clap::ArgAction::Set)]
    pub rate_limit_enabled: bool,

    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "5")]
    pub rate_limit_per_second: u64,

    #[arg(long, env = "RATE_LIMIT_BURST_SIZE", default_value = "20")]
    pub rate_limit_burst_size: u32,

    #[arg(long, env = "RATE_LIMIT_CLEANUP_INTERVAL_SECS", default_value = "60")]
    pub rate_limit_cleanup_interval_secs: u64,
}

impl AivaultCli {
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        let credentials = if self.db_password.is_empty() {
            self.db_user.clone()
        } else {
            format!("{}:{}", self.db_user, self.db_password)
        };
        format!(
            "postgres://{credentials}@{}:{}/{}",
            self.db_host, self.db_port, self.db_name
        )
    }

    /// Configured `(symbol, address)` pairs.
    pub fn tokens(&self) -> Vec<(&'static str, &str)> {
        [
            ("WETH", &self.weth_address),
            ("USDC", &self.usdc_address),
            ("DAI", &self.dai_address),
        ]
        .into_iter()
        .filter_map(|(symbol, address)| address.as_deref().map(|address| (symbol, address)))
        .collect()
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            cors_allowed_origins: self.cors_allowed_origins.clone(),
            rate_limit_enabled: self.rate_limit_enabled,
            rate_limit_per_second: self.rate_limit_per_second,
            rate_limit_burst_size: self.rate_limit_burst_size,
            rate_limit_cleanup_interval: Duration::from_secs(self.rate_limit_cleanup_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AivaultCli {
        let mut argv = vec![
            "aivault",
            "--private-key",
            "0x01",
            "--vault-manager-address",
            "0x4242424242424242424242424242424242424242",
        ];
        argv.extend_from_slice(args);
        AivaultCli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_database_url_is_assembled_from_parts() {
        let cli = parse(&[
            "--db-host",
            "db",
            "--db-user",
            "vault",
            "--db-password",
            "secret",
            "--db-name",
            "vaults",
        ]);
        if cli.database_url.is_none() {
            assert_eq!(cli.database_url(), "postgres://vault:secret@db:5432/vaults");
        }
    }

    #[test]
    fn test_explicit_database_url_wins() {
        let cli = parse(&["--database-url", "postgres://u@h/d"]);
        assert_eq!(cli.database_url(), "postgres://u@h/d");
    }

    #[test]
    fn test_only_configured_tokens_are_listed() {
        let cli = parse(&["--dai-address", "0x6b175474e89094c44da98b954eedeac495271d0f"]);
        let symbols: Vec<_> = cli.tokens().into_iter().map(|(symbol, _)| symbol).collect();
        if cli.weth_address.is_none() && cli.usdc_address.is_none() {
            assert_eq!(symbols, vec!["DAI"]);
        }
        assert!(symbols.contains(&"DAI"));
    }

    #[test]
    fn test_rate_limit_can_be_disabled() {
        let cli = parse(&["--rate-limit-enabled", "false"]);
        assert!(!cli.http_config().rate_limit_enabled);
    }
}
