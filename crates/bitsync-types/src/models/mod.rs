use crate::{RawBlock, RawScriptPubKey, RawTransaction, RawVin};

pub mod block;
pub mod input;
pub mod output;
pub mod transaction;

pub use block::BlockModel;
pub use input::InputModel;
pub use output::OutputModel;
pub use transaction::TransactionModel;

/// Sentinel prevout reference carried by the coinbase input.
pub const COINBASE_PREVIOUS_TXID: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
pub const COINBASE_PREVIOUS_VOUT: i64 = -1;

/// One transaction with its rows, ready for a single atomic write.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBundle {
    pub transaction: TransactionModel,
    pub inputs: Vec<InputModel>,
    pub outputs: Vec<OutputModel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockModels {
    pub block: BlockModel,
    pub transactions: Vec<TransactionBundle>,
}

/// Convert a verbosity-2 block into its relational models. Pure; pruning
/// degrades `fee_sats` to null but never fails the block.
pub fn convert_raw_block_to_models(raw: &RawBlock) -> BlockModels {
    let block = BlockModel {
        hash: raw.hash.clone(),
        height: raw.height,
        version: raw.version,
        timestamp: crate::utils::unix_seconds_to_naive_datetime(raw.time),
        size: raw.size,
        weight: raw.weight,
        merkle_root: raw.merkle_root.clone(),
        nonce: raw.nonce,
        bits: raw.bits.clone(),
        difficulty: raw.difficulty,
        previous_hash: raw.previous_hash.clone(),
        // The node reports `nextblockhash` for settled blocks, but linkage is
        // backfilled only after the successor is persisted locally.
        next_hash: None,
    };

    let transactions =
        raw.tx.iter().map(|tx| convert_raw_transaction(&raw.hash, tx)).collect::<Vec<_>>();

    BlockModels { block, transactions }
}

pub fn convert_raw_transaction(block_hash: &str, raw: &RawTransaction) -> TransactionBundle {
    let coinbase = raw.vin.first().is_some_and(|vin| vin.coinbase.is_some());

    let transaction = TransactionModel {
        txid: raw.txid.clone(),
        block_hash: block_hash.to_string(),
        version: raw.version,
        size: raw.size,
        weight: raw.weight,
        // No real prevout to compute a coinbase fee from.
        fee_sats: if coinbase { None } else { raw.fee.map(crate::utils::btc_to_sats) },
    };

    let inputs = raw
        .vin
        .iter()
        .enumerate()
        .map(|(index, vin)| convert_raw_vin(&raw.txid, index as i64, vin))
        .collect::<Vec<_>>();

    let outputs = raw
        .vout
        .iter()
        .map(|vout| OutputModel {
            txid: raw.txid.clone(),
            vout: vout.n,
            value_sats: crate::utils::btc_to_sats(vout.value),
            script_pubkey: vout.script_pubkey.hex.clone(),
            address: resolve_address(&vout.script_pubkey),
        })
        .collect::<Vec<_>>();

    TransactionBundle { transaction, inputs, outputs }
}

fn convert_raw_vin(txid: &str, index: i64, vin: &RawVin) -> InputModel {
    match &vin.coinbase {
        Some(coinbase_script) => InputModel {
            txid: txid.to_string(),
            input_index: index,
            previous_txid: COINBASE_PREVIOUS_TXID.to_string(),
            previous_vout: COINBASE_PREVIOUS_VOUT,
            sequence: vin.sequence,
            script_sig: coinbase_script.clone(),
        },
        None => InputModel {
            txid: txid.to_string(),
            input_index: index,
            previous_txid: vin.txid.clone().unwrap_or_default(),
            previous_vout: vin.vout.unwrap_or(0),
            sequence: vin.sequence,
            script_sig: vin.script_sig.as_ref().map(|s| s.hex.clone()).unwrap_or_default(),
        },
    }
}

/// The node decodes standard script forms to an address; anything else stays
/// null. Older nodes report a one-element `addresses` list instead.
fn resolve_address(script_pubkey: &RawScriptPubKey) -> Option<String> {
    script_pubkey.address.clone().or_else(|| script_pubkey.addresses.first().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawScriptSig, RawVout};
    use rstest::rstest;

    fn raw_script_pubkey(address: Option<&str>) -> RawScriptPubKey {
        RawScriptPubKey {
            asm: Some("OP_DUP OP_HASH160".to_string()),
            hex: "76a914".to_string(),
            script_type: Some("pubkeyhash".to_string()),
            address: address.map(str::to_string),
            addresses: vec![],
        }
    }

    fn raw_spend(txid: &str, fee: Option<f64>) -> RawTransaction {
        RawTransaction {
            txid: txid.to_string(),
            version: 2,
            size: 225,
            weight: 900,
            fee,
            vin: vec![RawVin {
                coinbase: None,
                txid: Some("aa".repeat(32)),
                vout: Some(1),
                script_sig: Some(RawScriptSig { asm: "3045..".to_string(), hex: "483045".to_string() }),
                sequence: 4294967293,
            }],
            vout: vec![RawVout {
                value: 0.5,
                n: 0,
                script_pubkey: raw_script_pubkey(Some("bc1qexample")),
            }],
        }
    }

    fn raw_coinbase(txid: &str) -> RawTransaction {
        RawTransaction {
            txid: txid.to_string(),
            version: 1,
            size: 120,
            weight: 480,
            fee: None,
            vin: vec![RawVin {
                coinbase: Some("04ffff001d0104".to_string()),
                txid: None,
                vout: None,
                script_sig: None,
                sequence: 4294967295,
            }],
            vout: vec![RawVout {
                value: 50.0,
                n: 0,
                script_pubkey: raw_script_pubkey(Some("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa")),
            }],
        }
    }

    fn raw_block() -> RawBlock {
        RawBlock {
            hash: "00000000000000000002a7c4c1e48d76c5a37902165a270156b7a8d72728a054".to_string(),
            height: 800_000,
            version: 536870912,
            time: 1690168629,
            size: 1_500_000,
            weight: 3_993_000,
            merkle_root: "91f01a00530a8c6e7a6e4dbb5a1a5d0c7a8e1f3e9a6d8a1b2c3d4e5f60718293".to_string(),
            nonce: 1765974955,
            bits: "17053894".to_string(),
            difficulty: 53911173001054.59,
            previous_hash: Some("00000000000000000000e26b2a8c0b9d5a3f6e7d8c9b0a1f2e3d4c5b6a798897".to_string()),
            next_hash: Some("0000000000000000000139a7e9a3a9e9d1c2b3a4958677869504132231405968".to_string()),
            tx: vec![raw_coinbase("c0ffee"), raw_spend("beef01", Some(0.0001))],
        }
    }

    #[test]
    fn block_mapping_drops_node_reported_next_hash() {
        let models = convert_raw_block_to_models(&raw_block());

        assert_eq!(models.block.height, 800_000);
        assert_eq!(models.block.next_hash, None, "next_hash is a backfill-only field");
        assert_eq!(
            models.block.previous_hash.as_deref(),
            Some("00000000000000000000e26b2a8c0b9d5a3f6e7d8c9b0a1f2e3d4c5b6a798897")
        );
        assert_eq!(models.block.timestamp.and_utc().timestamp(), 1690168629);
        assert_eq!(models.transactions.len(), 2);
    }

    #[test]
    fn coinbase_maps_to_sentinel_prevout() {
        let bundle = convert_raw_transaction("blockhash", &raw_coinbase("c0ffee"));

        assert_eq!(bundle.inputs.len(), 1);
        let input = &bundle.inputs[0];
        assert_eq!(input.previous_txid, COINBASE_PREVIOUS_TXID);
        assert_eq!(input.previous_txid.len(), 64);
        assert_eq!(input.previous_vout, COINBASE_PREVIOUS_VOUT);
        assert_eq!(input.script_sig, "04ffff001d0104", "coinbase script is required");
        assert_eq!(bundle.transaction.fee_sats, None, "coinbase has no real prevout");
    }

    #[test]
    fn coinbase_fee_is_null_even_if_reported() {
        let mut raw = raw_coinbase("c0ffee");
        raw.fee = Some(0.5);

        let bundle = convert_raw_transaction("blockhash", &raw);
        assert_eq!(bundle.transaction.fee_sats, None);
    }

    #[test]
    fn missing_fee_degrades_to_null_without_touching_other_fields() {
        let bundle = convert_raw_transaction("blockhash", &raw_spend("beef01", None));

        assert_eq!(bundle.transaction.fee_sats, None);
        assert_eq!(bundle.transaction.size, 225);
        assert_eq!(bundle.inputs.len(), 1, "input rows are still written");
        assert_eq!(bundle.outputs.len(), 1, "output rows are still written");
        assert_eq!(bundle.outputs[0].value_sats, 50_000_000);
    }

    #[test]
    fn reported_fee_converts_to_sats() {
        let bundle = convert_raw_transaction("blockhash", &raw_spend("beef01", Some(0.0001)));
        assert_eq!(bundle.transaction.fee_sats, Some(10_000));
    }

    #[test]
    fn inputs_keep_vin_order() {
        let mut raw = raw_spend("beef01", Some(0.0001));
        raw.vin.push(RawVin {
            coinbase: None,
            txid: Some("bb".repeat(32)),
            vout: Some(0),
            script_sig: None,
            sequence: 0,
        });

        let bundle = convert_raw_transaction("blockhash", &raw);
        assert_eq!(bundle.inputs[0].input_index, 0);
        assert_eq!(bundle.inputs[1].input_index, 1);
        assert_eq!(bundle.inputs[1].previous_txid, "bb".repeat(32));
    }

    #[rstest]
    #[case(Some("bc1qaddr"), vec![], Some("bc1qaddr"))]
    #[case(None, vec!["1legacy".to_string()], Some("1legacy"))]
    #[case(None, vec![], None)]
    fn address_resolution(
        #[case] address: Option<&str>,
        #[case] addresses: Vec<String>,
        #[case] expected: Option<&str>,
    ) {
        let mut spk = raw_script_pubkey(address);
        spk.addresses = addresses;
        if expected.is_none() {
            // Non-standard script: the node decodes no address at all.
            spk.script_type = Some("nulldata".to_string());
        }

        assert_eq!(resolve_address(&spk).as_deref(), expected);
    }
}
