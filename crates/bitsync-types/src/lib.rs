pub mod errors;
pub mod models;
pub mod repository;
pub mod schema;
pub mod utils;

use diesel_async::{
    pooled_connection::bb8::{Pool, PooledConnection},
    AsyncPgConnection,
};
pub use models::*;
use serde::{Deserialize, Serialize};

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbPoolConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

pub type BlockHash = String;
pub type Txid = String;

/// Sort order for paged listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

/// Block structure as returned by `getblock <hash> 2` (verbosity 2 includes
/// the full transaction objects).
#[derive(Deserialize, Debug, Clone)]
pub struct RawBlock {
    pub hash: String,
    pub height: i64,
    pub version: i64,
    pub time: i64,
    pub size: i64,
    pub weight: i64,
    #[serde(rename = "merkleroot")]
    pub merkle_root: String,
    pub nonce: i64,
    pub bits: String,
    pub difficulty: f64,
    #[serde(rename = "previousblockhash")]
    pub previous_hash: Option<BlockHash>,
    #[serde(rename = "nextblockhash")]
    pub next_hash: Option<BlockHash>,
    #[serde(default)]
    pub tx: Vec<RawTransaction>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawTransaction {
    pub txid: Txid,
    pub version: i64,
    pub size: i64,
    pub weight: i64,
    // Reported in BTC, and only when the node can resolve every prevout.
    pub fee: Option<f64>,
    #[serde(default)]
    pub vin: Vec<RawVin>,
    #[serde(default)]
    pub vout: Vec<RawVout>,
}

/// A transaction input. Exactly one of `coinbase` or `txid`/`vout` is
/// populated by the node.
#[derive(Deserialize, Debug, Clone)]
pub struct RawVin {
    pub coinbase: Option<String>,
    pub txid: Option<Txid>,
    pub vout: Option<i64>,
    #[serde(rename = "scriptSig")]
    pub script_sig: Option<RawScriptSig>,
    #[serde(default)]
    pub sequence: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawScriptSig {
    pub asm: String,
    pub hex: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawVout {
    // BTC, converted to integer satoshis by the mapper.
    pub value: f64,
    pub n: i64,
    #[serde(rename = "scriptPubKey")]
    pub script_pubkey: RawScriptPubKey,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawScriptPubKey {
    pub asm: Option<String>,
    pub hex: String,
    #[serde(rename = "type")]
    pub script_type: Option<String>,
    // Populated by the node only for standard script forms; older nodes
    // report a list instead of the single `address` field.
    pub address: Option<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// Subset of `getblockchaininfo` the sync loop cares about.
#[derive(Deserialize, Debug, Clone)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: i64,
    #[serde(default)]
    pub pruned: bool,
    #[serde(rename = "pruneheight")]
    pub prune_height: Option<i64>,
}
