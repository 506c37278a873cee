use crate::models::TransactionModel;
use crate::schema::outputs;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize, AsChangeset, Associations, Identifiable,
)]
#[diesel(table_name = outputs)]
#[diesel(primary_key(txid, vout))]
#[diesel(belongs_to(TransactionModel, foreign_key = txid))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutputModel {
    pub txid: String,
    pub vout: i64,
    pub value_sats: i64,
    pub script_pubkey: String,
    // Resolved by the node for standard script forms only.
    pub address: Option<String>,
}
