use crate::models::BlockModel;
use crate::schema::transactions;
use crate::BlockHash;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize, AsChangeset, Associations, Identifiable,
)]
#[diesel(table_name = transactions)]
#[diesel(primary_key(txid))]
#[diesel(belongs_to(BlockModel, foreign_key = block_hash))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransactionModel {
    pub txid: String,
    pub block_hash: BlockHash,
    pub version: i64,
    pub size: i64,
    pub weight: i64,
    // Null when the node cannot resolve the prevouts (pruned history) and
    // always null for coinbase.
    pub fee_sats: Option<i64>,
}
