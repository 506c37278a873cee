use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub node: NodeConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NodeConfig {
    pub rpc_url: String,
    #[serde(default)]
    pub rpc_user: Option<String>,
    #[serde(default)]
    pub rpc_password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SyncSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    #[serde(default)]
    pub start_height: Option<i64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            start_height: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    1000
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

pub fn load_config(path: &str) -> Result<Config> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read config file {path}"))?;
    let mut config: Config =
        toml::from_str(&raw).with_context(|| format!("failed to parse config file {path}"))?;
    apply_env_overrides(&mut config);

    anyhow::ensure!(
        !config.database.url.is_empty(),
        "database url missing: set [database].url in {path} or the DATABASE_URL environment variable"
    );
    Ok(config)
}

/// Credentials come from the environment when present, so secrets stay out
/// of the config file.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = env::var("BITCOIN_RPC_URL") {
        config.node.rpc_url = url;
    }
    if let Ok(user) = env::var("BITCOIN_RPC_USER") {
        config.node.rpc_user = Some(user);
    }
    if let Ok(password) = env::var("BITCOIN_RPC_PASSWORD") {
        config.node.rpc_password = Some(password);
    }
    if let Ok(url) = env::var("DATABASE_URL") {
        config.database.url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [node]
            rpc_url = "http://127.0.0.1:8332"

            [database]
            url = "postgres://localhost/bitsync"
            "#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.sync.interval_secs, 300);
        assert_eq!(config.sync.max_retries, 3);
        assert_eq!(config.sync.retry_base_delay_ms, 100);
        assert_eq!(config.sync.retry_max_delay_ms, 1000);
        assert_eq!(config.sync.rpc_timeout_secs, 30);
        assert_eq!(config.sync.start_height, None);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.pool_size, None);
    }

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [node]
            rpc_url = "http://node:8332"
            rpc_user = "alice"
            rpc_password = "hunter2"

            [sync]
            interval_secs = 60
            max_retries = 5
            retry_base_delay_ms = 250
            retry_max_delay_ms = 4000
            rpc_timeout_secs = 10
            start_height = 500000

            [database]
            url = "postgres://db/bitsync"
            pool_size = 4

            [server]
            host = "127.0.0.1"
            port = 8080
            "#,
        )
        .expect("full config should parse");

        assert_eq!(config.node.rpc_user.as_deref(), Some("alice"));
        assert_eq!(config.sync.interval_secs, 60);
        assert_eq!(config.sync.start_height, Some(500_000));
        assert_eq!(config.database.pool_size, Some(4));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut config: Config = toml::from_str(
            r#"
            [node]
            rpc_url = "http://file:8332"

            [database]
            url = "postgres://file/bitsync"
            "#,
        )
        .expect("config should parse");

        env::set_var("BITCOIN_RPC_USER", "env-user");
        env::set_var("BITCOIN_RPC_PASSWORD", "env-pass");
        env::set_var("DATABASE_URL", "postgres://env/bitsync");

        apply_env_overrides(&mut config);

        assert_eq!(config.node.rpc_user.as_deref(), Some("env-user"));
        assert_eq!(config.node.rpc_password.as_deref(), Some("env-pass"));
        assert_eq!(config.database.url, "postgres://env/bitsync");

        env::remove_var("BITCOIN_RPC_USER");
        env::remove_var("BITCOIN_RPC_PASSWORD");
        env::remove_var("DATABASE_URL");
    }
}
