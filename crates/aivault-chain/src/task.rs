use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pragma_common::services::{Service, ServiceRunner};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::EvmClient;

/// Periodically realigns the cached nonce with the node, so a transaction
/// sent from the same key by another process does not wedge submissions.
pub struct NonceSyncTask {
    client: Arc<EvmClient>,
    interval: Duration,
}

impl NonceSyncTask {
    pub fn new(client: Arc<EvmClient>, interval: Duration) -> Self {
        Self { client, interval }
    }

    pub async fn run_forever(&self, shutdown: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Nonce sync shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.client.resync_nonce().await {
                        warn!(?err, "Failed to resync nonce");
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Service for NonceSyncTask {
    async fn start<'a>(&mut self, mut runner: ServiceRunner<'a>) -> Result<()> {
        let client = self.client.clone();
        let interval = self.interval;

        runner.spawn_loop(move |ctx| async move {
            let task = Self::new(client, interval);
            if let Some(result) = ctx
                .run_until_cancelled(task.run_forever(ctx.token.clone()))
                .await
            {
                result?;
            }
            Ok::<(), anyhow::Error>(())
        });

        Ok(())
    }
}
