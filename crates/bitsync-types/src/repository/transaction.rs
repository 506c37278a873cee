use std::sync::Arc;

use anyhow::Result;
use diesel::upsert::excluded;
use diesel::{insert_into, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::{InputModel, OutputModel, TransactionModel};
use crate::DbPool;

/// Insert or refresh a transaction row. `block_hash` is immutable after
/// creation (transactions are never moved between blocks) and is excluded
/// from the conflict update.
pub async fn upsert_transaction(
    conn: &mut AsyncPgConnection,
    transaction: &TransactionModel,
) -> Result<()> {
    use crate::schema::transactions;

    insert_into(transactions::table)
        .values(transaction)
        .on_conflict(transactions::txid)
        .do_update()
        .set((
            transactions::version.eq(excluded(transactions::version)),
            transactions::size.eq(excluded(transactions::size)),
            transactions::weight.eq(excluded(transactions::weight)),
            transactions::fee_sats.eq(excluded(transactions::fee_sats)),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn upsert_inputs(conn: &mut AsyncPgConnection, input_models: &[InputModel]) -> Result<()> {
    use crate::schema::inputs;

    if input_models.is_empty() {
        return Ok(());
    }
    insert_into(inputs::table)
        .values(input_models)
        .on_conflict((inputs::txid, inputs::input_index))
        .do_update()
        .set((
            inputs::previous_txid.eq(excluded(inputs::previous_txid)),
            inputs::previous_vout.eq(excluded(inputs::previous_vout)),
            inputs::sequence.eq(excluded(inputs::sequence)),
            inputs::script_sig.eq(excluded(inputs::script_sig)),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn upsert_outputs(conn: &mut AsyncPgConnection, output_models: &[OutputModel]) -> Result<()> {
    use crate::schema::outputs;

    if output_models.is_empty() {
        return Ok(());
    }
    insert_into(outputs::table)
        .values(output_models)
        .on_conflict((outputs::txid, outputs::vout))
        .do_update()
        .set((
            outputs::value_sats.eq(excluded(outputs::value_sats)),
            outputs::script_pubkey.eq(excluded(outputs::script_pubkey)),
            outputs::address.eq(excluded(outputs::address)),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn get_transaction_by_txid(
    db: &Arc<DbPool>,
    txid_value: &str,
) -> Result<Option<TransactionModel>> {
    use crate::schema::transactions::dsl::*;

    let mut conn = db.get().await?;
    let transaction = transactions
        .filter(txid.eq(txid_value))
        .select(TransactionModel::as_select())
        .first(&mut conn)
        .await
        .optional()?;
    Ok(transaction)
}

/// Transactions of a block, ordered by txid for a stable listing.
pub async fn get_block_transactions(
    db: &Arc<DbPool>,
    block_hash_value: &str,
) -> Result<Vec<TransactionModel>> {
    use crate::schema::transactions::dsl::*;

    let mut conn = db.get().await?;
    let transaction_models = transactions
        .filter(block_hash.eq(block_hash_value))
        .order(txid.asc())
        .select(TransactionModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(transaction_models)
}

pub async fn get_transaction_inputs(
    db: &Arc<DbPool>,
    txid_value: &str,
) -> Result<Vec<InputModel>> {
    use crate::schema::inputs::dsl::*;

    let mut conn = db.get().await?;
    let input_models = inputs
        .filter(txid.eq(txid_value))
        .order(input_index.asc())
        .select(InputModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(input_models)
}

pub async fn get_transaction_outputs(
    db: &Arc<DbPool>,
    txid_value: &str,
) -> Result<Vec<OutputModel>> {
    use crate::schema::outputs::dsl::*;

    let mut conn = db.get().await?;
    let output_models = outputs
        .filter(txid.eq(txid_value))
        .order(vout.asc())
        .select(OutputModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(output_models)
}

/// Outputs paying to a resolved address, newest txid first.
pub async fn get_outputs_by_address(
    db: &Arc<DbPool>,
    address_value: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<OutputModel>> {
    use crate::schema::outputs::dsl::*;

    let mut conn = db.get().await?;
    let output_models = outputs
        .filter(address.eq(address_value))
        .order(txid.desc())
        .limit(limit)
        .offset(offset)
        .select(OutputModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(output_models)
}
