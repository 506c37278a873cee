pub mod client;
pub mod db;
pub mod sync;

pub use client::{Client, NodeProvider, RetryPolicy, RpcConfig};
pub use db::new_db_pool;
pub use sync::{SyncOptions, Worker};
