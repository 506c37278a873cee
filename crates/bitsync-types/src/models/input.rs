use crate::models::TransactionModel;
use crate::schema::inputs;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize, AsChangeset, Associations, Identifiable,
)]
#[diesel(table_name = inputs)]
#[diesel(primary_key(txid, input_index))]
#[diesel(belongs_to(TransactionModel, foreign_key = txid))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InputModel {
    pub txid: String,
    pub input_index: i64,
    // Logical reference only: the spent output may be outside the synced
    // range, and the coinbase sentinel never resolves.
    pub previous_txid: String,
    pub previous_vout: i64,
    pub sequence: i64,
    pub script_sig: String,
}
