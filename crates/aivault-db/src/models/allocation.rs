use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::strategy::Strategy;
use crate::schema::allocations;

/// Share of a vault's funds routed to one adapter, in tenths of a percent.
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(belongs_to(Strategy))]
#[diesel(table_name = allocations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Allocation {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub position: i32,
    pub adapter_index: i64,
    pub percentage: i32,
    pub protocol: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = allocations)]
pub struct NewAllocation {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub position: i32,
    pub adapter_index: i64,
    pub percentage: i32,
    pub protocol: String,
}

impl Allocation {
    pub fn for_strategy(
        strategy: &Strategy,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<Self>> {
        Self::belonging_to(strategy)
            .select(Self::as_select())
            .order(allocations::position.asc())
            .load(conn)
    }

    /// Loads the allocations of every strategy in one query, grouped in the
    /// same order as `strategies`.
    pub fn grouped_for(
        strategies: &[Strategy],
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<Vec<Self>>> {
        let allocations = Self::belonging_to(strategies)
            .select(Self::as_select())
            .order(allocations::position.asc())
            .load(conn)?;

        Ok(allocations.grouped_by(strategies))
    }
}
