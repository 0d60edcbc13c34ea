use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Pagination;
use crate::schema::vaults;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = vaults)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Vault {
    pub id: Uuid,
    pub address: String,
    pub token_address: String,
    pub token_symbol: String,
    pub token_name: String,
    pub is_active: bool,
    pub total_assets: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = vaults)]
pub struct NewVault {
    pub id: Uuid,
    pub address: String,
    pub token_address: String,
    pub token_symbol: String,
    pub token_name: String,
    pub is_active: bool,
    pub total_assets: BigDecimal,
}

impl Vault {
    pub fn find_by_id(id: Uuid, conn: &mut diesel::PgConnection) -> QueryResult<Self> {
        vaults::table.find(id).first(conn)
    }

    pub fn find_many(ids: &[Uuid], conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        vaults::table.filter(vaults::id.eq_any(ids)).load(conn)
    }

    pub fn list(pagination: Pagination, conn: &mut diesel::PgConnection) -> QueryResult<Vec<Self>> {
        vaults::table
            .order(vaults::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(conn)
    }

    pub fn create(new_vault: &NewVault, conn: &mut diesel::PgConnection) -> QueryResult<Self> {
        diesel::insert_into(vaults::table)
            .values(new_vault)
            .get_result(conn)
    }
}
