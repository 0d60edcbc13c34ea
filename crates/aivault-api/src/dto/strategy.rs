use aivault_db::models::{Allocation, Strategy, StrategyWithAllocations};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocationRequest {
    /// Position of the adapter in the vault manager registry
    pub adapter_index: i64,
    /// Tenths of a percent, 0 to 1000
    pub percentage: i64,
    pub protocol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateStrategyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub allocations: Vec<AllocationRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecuteStrategyRequest {
    pub strategy_id: String,
    pub vault_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocationDto {
    pub id: Uuid,
    pub adapter_index: i64,
    pub percentage: i32,
    pub protocol: String,
    pub created_at: DateTime<Utc>,
}

impl From<Allocation> for AllocationDto {
    fn from(allocation: Allocation) -> Self {
        Self {
            id: allocation.id,
            adapter_index: allocation.adapter_index,
            percentage: allocation.percentage,
            protocol: allocation.protocol,
            created_at: allocation.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StrategySummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl From<Strategy> for StrategySummary {
    fn from(strategy: Strategy) -> Self {
        Self {
            id: strategy.id,
            name: strategy.name,
            description: strategy.description,
            status: strategy.status,
            created_at: strategy.created_at,
            updated_at: strategy.updated_at,
            executed_at: strategy.executed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StrategyDto {
    #[serde(flatten)]
    pub strategy: StrategySummary,
    pub allocations: Vec<AllocationDto>,
}

impl From<StrategyWithAllocations> for StrategyDto {
    fn from(value: StrategyWithAllocations) -> Self {
        Self {
            strategy: value.strategy.into(),
            allocations: value.allocations.into_iter().map(Into::into).collect(),
        }
    }
}
