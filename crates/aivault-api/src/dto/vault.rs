use aivault_db::models::Vault;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterVaultRequest {
    pub address: String,
    pub token_address: String,
    pub token_symbol: String,
    pub token_name: String,
    /// Decimal string, defaults to 0
    #[serde(default)]
    pub total_assets: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VaultDto {
    pub id: Uuid,
    pub address: String,
    pub token_address: String,
    pub token_symbol: String,
    pub token_name: String,
    pub is_active: bool,
    /// Decimal string
    pub total_assets: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vault> for VaultDto {
    fn from(vault: Vault) -> Self {
        Self {
            id: vault.id,
            address: vault.address,
            token_address: vault.token_address,
            token_symbol: vault.token_symbol,
            token_name: vault.token_name,
            is_active: vault.is_active,
            total_assets: vault.total_assets.to_string(),
            created_at: vault.created_at,
            updated_at: vault.updated_at,
        }
    }
}
