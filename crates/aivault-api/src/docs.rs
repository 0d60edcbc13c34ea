#![allow(clippy::needless_for_each)]

use anyhow::Result;
use serde_json::to_string_pretty;
use std::path::PathBuf;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::{ServerBuilder, ServerVariableBuilder};
use utoipauto::utoipauto;

pub struct ServerAddon;

impl Modify for ServerAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let host_variable = ServerVariableBuilder::new()
            .default_value("localhost:8080")
            .build();
        openapi.servers = Some(vec![
            ServerBuilder::new()
                .url("http://{host}")
                .parameter("host", host_variable)
                .build(),
        ]);
    }
}

#[utoipauto(paths = "./crates/aivault-api/src/")]
#[derive(OpenApi)]
#[openapi(
    modifiers(&ServerAddon),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Strategies", description = "Strategy creation and execution"),
        (name = "Vaults", description = "Vault registry and withdrawals"),
        (name = "Executions", description = "Recorded executions and their transactions"),
        (name = "Vault manager", description = "Direct VaultManager calls"),
        (name = "Adapters", description = "Adapter configuration through execute")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn generate_openapi_json(output_path: PathBuf) -> Result<()> {
        let openapi = Self::openapi();
        let json = to_string_pretty(&openapi)?;

        let file_path = output_path.join("openapi.json");

        tracing::info!("Saving OpenAPI specs to {}...", file_path.display());

        std::fs::write(&file_path, json)?;
        tracing::info!("OpenAPI specs saved!");
        Ok(())
    }
}
