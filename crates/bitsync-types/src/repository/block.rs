use std::sync::Arc;

use anyhow::Result;
use diesel::upsert::excluded;
use diesel::{insert_into, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::models::{BlockModel, BlockModels};
use crate::repository::transaction::{upsert_inputs, upsert_outputs, upsert_transaction};
use crate::{DbPool, Order};

/// Insert or refresh a block row. `next_hash` is deliberately excluded from
/// the conflict update: it is owned by [`backfill_next_hash`], and a re-sync
/// of an already-linked block must not un-link it.
pub async fn upsert_block(conn: &mut AsyncPgConnection, block: &BlockModel) -> Result<()> {
    use crate::schema::blocks;

    insert_into(blocks::table)
        .values(block)
        .on_conflict(blocks::hash)
        .do_update()
        .set((
            blocks::height.eq(excluded(blocks::height)),
            blocks::version.eq(excluded(blocks::version)),
            blocks::timestamp.eq(excluded(blocks::timestamp)),
            blocks::size.eq(excluded(blocks::size)),
            blocks::weight.eq(excluded(blocks::weight)),
            blocks::merkle_root.eq(excluded(blocks::merkle_root)),
            blocks::nonce.eq(excluded(blocks::nonce)),
            blocks::bits.eq(excluded(blocks::bits)),
            blocks::difficulty.eq(excluded(blocks::difficulty)),
            blocks::previous_hash.eq(excluded(blocks::previous_hash)),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// Point the predecessor's `next_hash` at a freshly persisted block. Returns
/// the number of updated rows; zero means the predecessor is not in the store
/// (sync started mid-chain), which is not an error.
pub async fn backfill_next_hash(
    conn: &mut AsyncPgConnection,
    previous_hash_value: &str,
    new_hash_value: &str,
) -> Result<usize> {
    use crate::schema::blocks::dsl::*;

    let updated = diesel::update(blocks.filter(hash.eq(previous_hash_value)))
        .set(next_hash.eq(new_hash_value))
        .execute(conn)
        .await?;
    Ok(updated)
}

/// Write a block and all of its transactions, inputs, and outputs as one
/// all-or-nothing unit, then link the predecessor inside the same database
/// transaction. A failure anywhere rolls the whole block back; a partially
/// written block is never observable.
pub async fn persist_block_atomically(db: &Arc<DbPool>, models: &BlockModels) -> Result<()> {
    let mut pooled = db.get().await?;
    let conn = &mut *pooled;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        async move {
            upsert_block(conn, &models.block).await?;

            for bundle in &models.transactions {
                upsert_transaction(conn, &bundle.transaction).await?;
                upsert_inputs(conn, &bundle.inputs).await?;
                upsert_outputs(conn, &bundle.outputs).await?;
            }

            if let Some(previous) = models.block.previous_hash.as_deref() {
                let updated = backfill_next_hash(conn, previous, &models.block.hash).await?;
                if updated == 0 {
                    tracing::debug!(
                        height = models.block.height,
                        previous_hash = previous,
                        "predecessor not in store, skipping next_hash backfill"
                    );
                }
            }

            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    tracing::info!(
        height = models.block.height,
        hash = %models.block.hash,
        tx_count = models.transactions.len(),
        "persisted block"
    );
    Ok(())
}

/// Highest stored height, the sync frontier. None for an empty store.
pub async fn get_max_height(db: &Arc<DbPool>) -> Result<Option<i64>> {
    use crate::schema::blocks::dsl::*;

    let mut conn = db.get().await?;
    let max_height: Option<i64> = blocks.select(diesel::dsl::max(height)).first(&mut conn).await?;
    Ok(max_height)
}

pub async fn get_block_by_hash(db: &Arc<DbPool>, block_hash_value: &str) -> Result<Option<BlockModel>> {
    use crate::schema::blocks::dsl::*;

    let mut conn = db.get().await?;
    let block = blocks
        .filter(hash.eq(block_hash_value))
        .select(BlockModel::as_select())
        .first(&mut conn)
        .await
        .optional()?;
    Ok(block)
}

pub async fn get_block_by_height(db: &Arc<DbPool>, height_value: i64) -> Result<Option<BlockModel>> {
    use crate::schema::blocks::dsl::*;

    let mut conn = db.get().await?;
    let block = blocks
        .filter(height.eq(height_value))
        .select(BlockModel::as_select())
        .first(&mut conn)
        .await
        .optional()?;
    Ok(block)
}

/// Get blocks, ordered by height.
pub async fn get_blocks(
    db: &Arc<DbPool>,
    limit: i64,
    offset: i64,
    order: Option<Order>,
) -> Result<Vec<BlockModel>> {
    use crate::schema::blocks::dsl::*;

    let mut conn = db.get().await?;
    match order {
        Some(Order::Desc) => {
            let block_models = blocks
                .limit(limit)
                .offset(offset)
                .select(BlockModel::as_select())
                .order(height.desc())
                .load(&mut conn)
                .await?;
            Ok(block_models)
        }
        _ => {
            let block_models = blocks
                .limit(limit)
                .offset(offset)
                .select(BlockModel::as_select())
                .order(height.asc())
                .load(&mut conn)
                .await?;
            Ok(block_models)
        }
    }
}
