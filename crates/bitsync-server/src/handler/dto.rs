use bitsync_types::models::{BlockModel, InputModel, OutputModel, TransactionModel};
use bitsync_types::Order;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BlockDto {
    pub hash: String,
    pub height: i64,
    pub version: i64,
    /// Unix seconds.
    pub timestamp: i64,
    pub size: i64,
    pub weight: i64,
    pub merkle_root: String,
    pub nonce: i64,
    pub bits: String,
    pub difficulty: f64,
    pub previous_hash: Option<String>,
    pub next_hash: Option<String>,
}

impl From<BlockModel> for BlockDto {
    fn from(model: BlockModel) -> Self {
        Self {
            hash: model.hash,
            height: model.height,
            version: model.version,
            timestamp: model.timestamp.and_utc().timestamp(),
            size: model.size,
            weight: model.weight,
            merkle_root: model.merkle_root,
            nonce: model.nonce,
            bits: model.bits,
            difficulty: model.difficulty,
            previous_hash: model.previous_hash,
            next_hash: model.next_hash,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionDto {
    pub txid: String,
    pub block_hash: String,
    pub version: i64,
    pub size: i64,
    pub weight: i64,
    pub fee_sats: Option<i64>,
}

impl From<TransactionModel> for TransactionDto {
    fn from(model: TransactionModel) -> Self {
        Self {
            txid: model.txid,
            block_hash: model.block_hash,
            version: model.version,
            size: model.size,
            weight: model.weight,
            fee_sats: model.fee_sats,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InputDto {
    pub txid: String,
    pub input_index: i64,
    pub previous_txid: String,
    pub previous_vout: i64,
    pub sequence: i64,
    pub script_sig: String,
}

impl From<InputModel> for InputDto {
    fn from(model: InputModel) -> Self {
        Self {
            txid: model.txid,
            input_index: model.input_index,
            previous_txid: model.previous_txid,
            previous_vout: model.previous_vout,
            sequence: model.sequence,
            script_sig: model.script_sig,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OutputDto {
    pub txid: String,
    pub vout: i64,
    pub value_sats: i64,
    pub script_pubkey: String,
    pub address: Option<String>,
}

impl From<OutputModel> for OutputDto {
    fn from(model: OutputModel) -> Self {
        Self {
            txid: model.txid,
            vout: model.vout,
            value_sats: model.value_sats,
            script_pubkey: model.script_pubkey,
            address: model.address,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct BlocksQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// "asc" (default) or "desc" by height.
    pub order: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct BlockByHashQuery {
    pub hash: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct BlockByHeightQuery {
    pub height: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct TransactionByTxidQuery {
    pub txid: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct OutputsByAddressQuery {
    pub address: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub fn parse_order(raw: Option<&str>) -> Order {
    match raw {
        Some("desc") => Order::Desc,
        _ => Order::Asc,
    }
}
