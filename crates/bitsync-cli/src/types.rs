use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bitsync")]
#[command(about = "Bitcoin chain mirror with a sync worker and read-only API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Run(RunCommand),
}

#[derive(Args)]
pub struct RunCommand {
    #[command(subcommand)]
    pub mode: RunMode,
}

#[derive(Subcommand)]
pub enum RunMode {
    /// Run the recurring sync worker
    Sync(CliArgs),
    /// Run a single sync cycle and exit
    SyncOnce(CliArgs),
    /// Run the read-only REST API
    Server(CliArgs),
}

#[derive(Args, Clone)]
pub struct CliArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,
}
