use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bitsync_types::errors::{RpcError, SyncError};
use bitsync_types::models::convert_raw_block_to_models;
use bitsync_types::repository::{get_block_by_height, get_max_height, persist_block_atomically};
use bitsync_types::{DbPool, RawBlock};
use tokio::time::MissedTickBehavior;

use super::state::{StateHandle, SyncState};
use crate::client::NodeProvider;
use crate::db::{new_db_pool, run_pending_migrations};

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Time between cycle ticks.
    pub interval: Duration,
    /// Optional floor below which heights are never fetched.
    pub start_height: Option<i64>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { interval: Duration::from_secs(300), start_height: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A cycle was still in flight; this tick was dropped.
    Skipped,
    UpToDate { height: i64 },
    Completed(CycleSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleSummary {
    pub synced: u64,
    pub skipped: u64,
    /// Highest height persisted so far.
    pub frontier: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Unavailable,
    Malformed,
    HashMismatch,
}

enum BlockFailure {
    Skip(SkipReason),
    Abort(SyncError),
}

/// The synchronization orchestrator: per tick it determines the missing
/// range and drives fetch -> map -> persist for each height, strictly in
/// ascending order so predecessors are always in place before their
/// successor's `next_hash` backfill.
pub struct Worker<P: NodeProvider> {
    pub db_pool: Arc<DbPool>,
    pub provider: Arc<P>,
    pub db_url: String,
    pub opts: SyncOptions,
    state: StateHandle,
}

impl<P: NodeProvider> Worker<P> {
    pub async fn new(
        provider: Arc<P>,
        db_url: String,
        db_pool_size: Option<u32>,
        opts: SyncOptions,
    ) -> Result<Self> {
        let db_pool = new_db_pool(&db_url, db_pool_size).await?;
        Ok(Self { db_pool, provider, db_url, opts, state: StateHandle::new() })
    }

    pub fn run_migrations(&self) -> Result<()> {
        run_pending_migrations(&self.db_url)
    }

    pub fn state(&self) -> SyncState {
        self.state.current()
    }

    /// Ticker-driven loop. Ticks that fire while a cycle is still running
    /// are dropped, not queued; cycle errors are logged and the worker waits
    /// for the next tick.
    pub async fn run(&self) -> Result<()> {
        self.run_migrations()?;
        tracing::info!(interval_secs = self.opts.interval.as_secs(), "starting sync worker");

        let mut interval = tokio::time::interval(self.opts.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            match self.run_cycle().await {
                Ok(CycleOutcome::Completed(summary)) => {
                    tracing::info!(
                        synced = summary.synced,
                        skipped = summary.skipped,
                        frontier = summary.frontier,
                        "sync cycle completed"
                    );
                }
                Ok(CycleOutcome::UpToDate { height }) => {
                    tracing::info!(height, "store is up to date");
                }
                Ok(CycleOutcome::Skipped) => {}
                Err(err) => {
                    tracing::error!(error = %err, "sync cycle aborted, awaiting next tick");
                }
            }
        }
    }

    /// One guarded cycle. Refuses to overlap a running cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, SyncError> {
        if !self.state.begin_cycle() {
            tracing::warn!("previous sync cycle still running, dropping tick");
            return Ok(CycleOutcome::Skipped);
        }
        let result = self.cycle_inner().await;
        self.state.finish_cycle(result.is_err());
        result
    }

    async fn cycle_inner(&self) -> Result<CycleOutcome, SyncError> {
        let node_height = self.provider.get_block_count().await?;
        let chain_info = self.provider.get_blockchain_info().await?;
        let stored_height = get_max_height(&self.db_pool).await?;

        let start =
            plan_start_height(stored_height, chain_info.prune_height, self.opts.start_height);
        if start > node_height {
            return Ok(CycleOutcome::UpToDate { height: node_height });
        }

        tracing::info!(from = start, to = node_height, "syncing missing range");
        let mut summary =
            CycleSummary { frontier: stored_height.unwrap_or(0), ..Default::default() };

        for height in start..=node_height {
            match self.sync_height(height).await {
                Ok(()) => {
                    summary.synced += 1;
                    summary.frontier = height;
                }
                Err(BlockFailure::Skip(reason)) => {
                    tracing::debug!(height, ?reason, "height skipped");
                    summary.skipped += 1;
                }
                Err(BlockFailure::Abort(err)) => {
                    tracing::warn!(
                        synced = summary.synced,
                        skipped = summary.skipped,
                        frontier = summary.frontier,
                        "cycle aborted mid-range, will resume next tick"
                    );
                    return Err(err);
                }
            }
        }

        Ok(CycleOutcome::Completed(summary))
    }

    async fn sync_height(&self, height: i64) -> Result<(), BlockFailure> {
        let raw = match fetch_block_at_height(self.provider.as_ref(), height).await {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => {
                tracing::warn!(height, error = %err, "block unavailable on node, skipping height");
                return Err(BlockFailure::Skip(SkipReason::Unavailable));
            }
            Err(RpcError::MalformedResponse(detail)) => {
                tracing::error!(height, detail = %detail, "malformed node response, skipping height");
                return Err(BlockFailure::Skip(SkipReason::Malformed));
            }
            Err(err) => {
                tracing::error!(height, error = %err, "rpc failure after retries, aborting cycle");
                return Err(BlockFailure::Abort(SyncError::Rpc(err)));
            }
        };

        // A different hash at an already-stored height is a reorg. The
        // mirror never rewrites history: log it and leave the stored block.
        match get_block_by_height(&self.db_pool, height).await {
            Ok(Some(existing)) if existing.hash != raw.hash => {
                tracing::error!(
                    height,
                    stored_hash = %existing.hash,
                    node_hash = %raw.hash,
                    "hash mismatch at stored height, keeping stored block"
                );
                return Err(BlockFailure::Skip(SkipReason::HashMismatch));
            }
            Ok(_) => {}
            Err(err) => return Err(BlockFailure::Abort(SyncError::Store(err))),
        }

        let models = convert_raw_block_to_models(&raw);
        persist_block_atomically(&self.db_pool, &models).await.map_err(|err| {
            tracing::error!(
                height,
                hash = %models.block.hash,
                error = %err,
                "failed to persist block, aborting cycle"
            );
            BlockFailure::Abort(SyncError::Store(err))
        })
    }
}

/// Fetch one block by height: hash lookup, then the full block.
pub async fn fetch_block_at_height<P: NodeProvider + ?Sized>(
    provider: &P,
    height: i64,
) -> Result<RawBlock, RpcError> {
    let block_hash = provider.get_block_hash(height).await?;
    provider.get_block(&block_hash).await
}

/// First height a cycle should fetch: one past the stored frontier, raised
/// to the node's prune point and any configured floor.
fn plan_start_height(
    stored_height: Option<i64>,
    prune_height: Option<i64>,
    configured_floor: Option<i64>,
) -> i64 {
    (stored_height.unwrap_or(0) + 1)
        .max(prune_height.unwrap_or(0))
        .max(configured_floor.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bitsync_types::BlockchainInfo;
    use mockall::predicate::*;
    use mockall::*;
    use rstest::rstest;

    mock! {
        pub Node {}

        #[async_trait]
        impl NodeProvider for Node {
            async fn get_block_count(&self) -> Result<i64, RpcError>;

            async fn get_block_hash(&self, height: i64) -> Result<String, RpcError>;

            async fn get_block(&self, block_hash: &str) -> Result<RawBlock, RpcError>;

            async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError>;
        }
    }

    fn test_block(hash: &str, height: i64) -> RawBlock {
        RawBlock {
            hash: hash.to_string(),
            height,
            version: 536870912,
            time: 1690168629,
            size: 1234,
            weight: 4936,
            merkle_root: "m".repeat(64),
            nonce: 42,
            bits: "17053894".to_string(),
            difficulty: 1.0,
            previous_hash: Some("p".repeat(64)),
            next_hash: None,
            tx: vec![],
        }
    }

    #[rstest]
    #[case(None, None, None, 1)] // empty store starts at height 1
    #[case(Some(100), None, None, 101)]
    #[case(Some(100), Some(200), None, 200)] // prune point wins over frontier
    #[case(Some(100), Some(50), None, 101)]
    #[case(None, None, Some(500_000), 500_000)] // configured floor
    #[case(Some(600_000), Some(550_000), Some(500_000), 600_001)]
    fn start_height_planning(
        #[case] stored: Option<i64>,
        #[case] prune: Option<i64>,
        #[case] floor: Option<i64>,
        #[case] expected: i64,
    ) {
        assert_eq!(plan_start_height(stored, prune, floor), expected);
    }

    #[tokio::test]
    async fn fetch_block_chains_hash_and_block_lookups() {
        let mut mock_node = MockNode::new();
        let block_hash = "a".repeat(64);

        let expected_hash = block_hash.clone();
        mock_node
            .expect_get_block_hash()
            .with(eq(42))
            .times(1)
            .returning(move |_| Ok(expected_hash.clone()));

        let wanted_hash = block_hash.clone();
        let returned_hash = block_hash.clone();
        mock_node
            .expect_get_block()
            .withf(move |requested| requested == wanted_hash)
            .times(1)
            .returning(move |_| Ok(test_block(&returned_hash, 42)));

        let raw = fetch_block_at_height(&mock_node, 42).await.expect("fetch should succeed");
        assert_eq!(raw.height, 42);
        assert_eq!(raw.hash, block_hash);
    }

    #[tokio::test]
    async fn fetch_block_surfaces_not_found_from_hash_lookup() {
        let mut mock_node = MockNode::new();

        mock_node.expect_get_block_hash().with(eq(7)).times(1).returning(|_| {
            Err(RpcError::Node { code: -5, message: "Block not found".to_string() })
        });
        // get_block must not be called when the hash lookup already failed.
        mock_node.expect_get_block().times(0);

        let err = fetch_block_at_height(&mock_node, 7).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn fetch_block_surfaces_transient_failure_from_block_lookup() {
        let mut mock_node = MockNode::new();
        let block_hash = "b".repeat(64);

        let expected_hash = block_hash.clone();
        mock_node
            .expect_get_block_hash()
            .with(eq(9))
            .times(1)
            .returning(move |_| Ok(expected_hash.clone()));
        mock_node
            .expect_get_block()
            .withf(move |requested| requested == block_hash)
            .times(1)
            .returning(|_| Err(RpcError::Timeout));

        let err = fetch_block_at_height(&mock_node, 9).await.unwrap_err();
        assert!(err.is_transient());
    }
}
