use async_trait::async_trait;
use bitsync_types::errors::RpcError;
use bitsync_types::{BlockchainInfo, RawBlock};
use serde_json::json;

use super::Client;

/// The node surface the sync loop and the server health check consume.
#[async_trait]
pub trait NodeProvider: Send + Sync {
    /// Height of the node's current chain tip.
    async fn get_block_count(&self) -> Result<i64, RpcError>;

    async fn get_block_hash(&self, height: i64) -> Result<String, RpcError>;

    /// Block with full transaction detail (verbosity 2).
    async fn get_block(&self, block_hash: &str) -> Result<RawBlock, RpcError>;

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError>;
}

#[async_trait]
impl NodeProvider for Client {
    async fn get_block_count(&self) -> Result<i64, RpcError> {
        self.call("getblockcount", json!([])).await
    }

    async fn get_block_hash(&self, height: i64) -> Result<String, RpcError> {
        self.call("getblockhash", json!([height])).await
    }

    async fn get_block(&self, block_hash: &str) -> Result<RawBlock, RpcError> {
        self.call("getblock", json!([block_hash, 2])).await
    }

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        self.call("getblockchaininfo", json!([])).await
    }
}
