use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Pagination;
use crate::models::allocation::{Allocation, NewAllocation};
use crate::schema::{allocations, strategies};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = strategies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Strategy {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = strategies)]
pub struct NewStrategy {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
}

/// Lifecycle of a strategy. Transitions only move forward:
/// `pending -> executing -> completed | failed`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StrategyStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl StrategyStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy together with its allocations, in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyWithAllocations {
    #[serde(flatten)]
    pub strategy: Strategy,
    pub allocations: Vec<Allocation>,
}

impl Strategy {
    /// Parsed status, `None` when the column holds something unknown.
    pub fn status(&self) -> Option<StrategyStatus> {
        self.status.parse().ok()
    }

    pub fn find_by_id(id: Uuid, conn: &mut diesel::PgConnection) -> QueryResult<Self> {
        strategies::table.find(id).first(conn)
    }

    pub fn find_many(ids: &[Uuid], conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        strategies::table
            .filter(strategies::id.eq_any(ids))
            .load(conn)
    }

    /// Newest first, windowed by `pagination`.
    pub fn list_query(pagination: Pagination) -> strategies::BoxedQuery<'static, Pg> {
        strategies::table
            .order(strategies::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .into_boxed()
    }

    pub fn list(pagination: Pagination, conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        Self::list_query(pagination).load(conn)
    }

    /// Inserts the strategy and all of its allocations atomically.
    pub fn create_with_allocations(
        new_strategy: &NewStrategy,
        new_allocations: &[NewAllocation],
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<StrategyWithAllocations> {
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let strategy: Self = diesel::insert_into(strategies::table)
                .values(new_strategy)
                .get_result(conn)?;

            let mut allocations: Vec<Allocation> = diesel::insert_into(allocations::table)
                .values(new_allocations)
                .get_results(conn)?;
            allocations.sort_by_key(|allocation| allocation.position);

            Ok(StrategyWithAllocations {
                strategy,
                allocations,
            })
        })
    }

    pub fn find_with_allocations(
        id: Uuid,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<StrategyWithAllocations> {
        let strategy = Self::find_by_id(id, conn)?;
        let allocations = Allocation::for_strategy(&strategy, conn)?;
        Ok(StrategyWithAllocations {
            strategy,
            allocations,
        })
    }

    pub fn list_with_allocations(
        pagination: Pagination,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<StrategyWithAllocations>> {
        let strategies = Self::list(pagination, conn)?;
        let grouped = Allocation::grouped_for(&strategies, conn)?;

        Ok(strategies
            .into_iter()
            .zip(grouped)
            .map(|(strategy, allocations)| StrategyWithAllocations {
                strategy,
                allocations,
            })
            .collect())
    }

    /// Moves a pending strategy to `executing`.
    ///
    /// Returns `None` when the strategy is no longer pending, which happens
    /// when two executions race for the same strategy.
    pub fn claim_for_execution(
        id: Uuid,
        now: DateTime<Utc>,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Option<Self>> {
        diesel::update(
            strategies::table
                .filter(strategies::id.eq(id))
                .filter(strategies::status.eq(StrategyStatus::Pending.as_str())),
        )
        .set((
            strategies::status.eq(StrategyStatus::Executing.as_str()),
            strategies::executed_at.eq(Some(now)),
            strategies::updated_at.eq(now),
        ))
        .get_result(conn)
        .optional()
    }

    pub fn update_status(
        id: Uuid,
        status: StrategyStatus,
        now: DateTime<Utc>,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Self> {
        diesel::update(strategies::table.find(id))
            .set((
                strategies::status.eq(status.as_str()),
                strategies::updated_at.eq(now),
            ))
            .get_result(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_column_value() {
        for status in [
            StrategyStatus::Pending,
            StrategyStatus::Executing,
            StrategyStatus::Completed,
            StrategyStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<StrategyStatus>(), Ok(status));
        }
        assert!("archived".parse::<StrategyStatus>().is_err());
    }

    #[test]
    fn test_only_completed_and_failed_are_terminal() {
        assert!(!StrategyStatus::Pending.is_terminal());
        assert!(!StrategyStatus::Executing.is_terminal());
        assert!(StrategyStatus::Completed.is_terminal());
        assert!(StrategyStatus::Failed.is_terminal());
    }

    #[test]
    fn test_list_query_orders_newest_first_and_windows() {
        let query = Strategy::list_query(Pagination::new(Some(10), Some(0)));
        let sql = diesel::debug_query::<Pg, _>(&query).to_string();

        assert!(sql.contains(r#"ORDER BY "strategies"."created_at" DESC"#), "{sql}");
        assert!(sql.contains("LIMIT $1 OFFSET $2"), "{sql}");
        assert!(sql.ends_with("-- binds: [10, 0]"), "{sql}");
    }
}
