use chrono::{DateTime, NaiveDateTime};

pub const SATS_PER_BTC: f64 = 100_000_000.0;

/// Block timestamps come from the node as Unix seconds.
pub fn unix_seconds_to_naive_datetime(secs: i64) -> NaiveDateTime {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc()).unwrap_or_default()
}

/// Convert a node-reported BTC amount to integer satoshis. The node prints
/// amounts as decimal floats; rounding recovers the exact satoshi value.
pub fn btc_to_sats(value: f64) -> i64 {
    (value * SATS_PER_BTC).round() as i64
}
