use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bitsync_core::{new_db_pool, Client, RetryPolicy, RpcConfig, SyncOptions, Worker};
use clap::Parser;

mod config;
mod types;

use config::{load_config, Config};
use types::{Cli, Commands, RunMode};

fn build_client(config: &Config) -> Result<Client> {
    Client::new(RpcConfig {
        url: config.node.rpc_url.clone(),
        user: config.node.rpc_user.clone(),
        password: config.node.rpc_password.clone(),
        timeout: Duration::from_secs(config.sync.rpc_timeout_secs),
        retry: RetryPolicy {
            max_retries: config.sync.max_retries,
            base_delay: Duration::from_millis(config.sync.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.sync.retry_max_delay_ms),
        },
    })
}

async fn build_worker(config: &Config) -> Result<Worker<Client>> {
    let client = Arc::new(build_client(config)?);
    let opts = SyncOptions {
        interval: Duration::from_secs(config.sync.interval_secs),
        start_height: config.sync.start_height,
    };
    Worker::new(client, config.database.url.clone(), config.database.pool_size, opts).await
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(run) => match run.mode {
            RunMode::Sync(args) => {
                let config = load_config(&args.config_path)?;
                let worker = build_worker(&config).await?;
                worker.run().await?;
            }
            RunMode::SyncOnce(args) => {
                let config = load_config(&args.config_path)?;
                let worker = build_worker(&config).await?;
                worker.run_migrations()?;
                let outcome = worker.run_cycle().await?;
                tracing::info!(?outcome, "sync cycle finished");
            }
            RunMode::Server(args) => {
                let config = load_config(&args.config_path)?;
                let db_pool = new_db_pool(&config.database.url, config.database.pool_size).await?;
                let node_client = Arc::new(build_client(&config)?);

                let server_config = bitsync_server::Config {
                    db_client: db_pool,
                    node_client,
                    api_host: config.server.host.clone(),
                    api_port: config.server.port,
                };

                tracing::info!("server running on http://{}", server_config.api_endpoint());
                bitsync_server::start(server_config).await?;
            }
        },
    }
    Ok(())
}
