use crate::schema::blocks;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize, AsChangeset, Identifiable,
)]
#[diesel(table_name = blocks)]
#[diesel(primary_key(hash))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlockModel {
    pub hash: String,
    pub height: i64,
    pub version: i64,
    pub timestamp: NaiveDateTime,
    pub size: i64,
    pub weight: i64,
    pub merkle_root: String,
    pub nonce: i64,
    pub bits: String,
    pub difficulty: f64,
    pub previous_hash: Option<String>,
    // Backfilled once the successor block is persisted, never set at insert.
    pub next_hash: Option<String>,
}
