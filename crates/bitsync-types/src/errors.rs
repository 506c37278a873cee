use thiserror::Error;

/// Bitcoin Core's RPC_INVALID_ADDRESS_OR_KEY, used for unknown and pruned
/// blocks alike.
pub const RPC_BLOCK_NOT_FOUND: i64 = -5;
/// RPC_MISC_ERROR, reported by pruned nodes for heights below the prune
/// point ("Block not available (pruned data)").
pub const RPC_MISC_ERROR: i64 = -1;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc request timed out")]
    Timeout,

    #[error("connection to node refused")]
    ConnectionRefused,

    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),
}

impl RpcError {
    /// Transient failures are worth retrying with backoff; everything else
    /// surfaces immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, RpcError::Timeout | RpcError::ConnectionRefused)
    }

    /// True when the node reports the requested block as unknown or pruned.
    /// The sync loop skips such heights instead of aborting the cycle.
    pub fn is_not_found(&self) -> bool {
        match self {
            RpcError::Node { code, message } => {
                *code == RPC_BLOCK_NOT_FOUND
                    || (*code == RPC_MISC_ERROR && message.to_lowercase().contains("pruned"))
            }
            _ => false,
        }
    }
}

/// Cycle-level error composition for the sync worker. Persistence failures
/// abort the cycle with the current block rolled back; RPC failures carry the
/// classification the per-block policy is built on.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("persistence failure: {0}")]
    Store(#[from] anyhow::Error),
}
