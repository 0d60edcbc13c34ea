use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::execution::Execution;
use crate::schema::transactions;

/// Durable record of one broadcast transaction. Rows are never updated.
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(belongs_to(Execution))]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransactionRecord {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub value: BigDecimal,
    pub gas_used: Option<i64>,
    pub gas_price: Option<BigDecimal>,
    pub status: String,
    pub block_number: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = transactions)]
pub struct NewTransactionRecord {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub value: BigDecimal,
    pub gas_used: Option<i64>,
    pub gas_price: Option<BigDecimal>,
    pub status: String,
    pub block_number: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionStatus {
    /// Broadcast, but no receipt was observed.
    Pending,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransactionRecord {
    pub fn create(
        new_transaction: &NewTransactionRecord,
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Self> {
        diesel::insert_into(transactions::table)
            .values(new_transaction)
            .get_result(conn)
    }

    pub fn grouped_for(
        executions: &[Execution],
        conn: &mut diesel::PgConnection,
    ) -> QueryResult<Vec<Vec<Self>>> {
        let records = Self::belonging_to(executions)
            .select(Self::as_select())
            .order(transactions::created_at.asc())
            .load(conn)?;

        Ok(records.grouped_by(executions))
    }
}
