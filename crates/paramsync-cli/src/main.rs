mod commands;
mod reporter;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use paramsync_core::config::ParamsyncConfig;
use paramsync_core::types::StoreKind;

#[derive(Parser)]
#[command(name = "paramsync")]
#[command(about = "Mirror .env.{stage} files into a remote parameter store")]
#[command(version)]
struct Cli {
    /// Path to the project config file (default: ./paramsync.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the store connection and naming.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Application name, the first segment of every parameter name
    #[arg(long = "app-name", alias = "appName", env = "APP_NAME")]
    pub app_name: Option<String>,

    /// AWS secret access key
    #[arg(
        long = "secret-key",
        alias = "secretKey",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true
    )]
    pub secret_key: Option<String>,

    /// AWS access key ID
    #[arg(
        long = "access-key",
        alias = "accessKey",
        env = "AWS_ACCESS_KEY_ID",
        hide_env_values = true
    )]
    pub access_key: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_DEFAULT_REGION")]
    pub region: Option<String>,

    /// Store backend: ssm or local
    #[arg(long)]
    pub store: Option<StoreKind>,

    /// JSON file for the local store
    #[arg(long)]
    pub store_path: Option<PathBuf>,

    /// Directory containing the .env.{stage} files
    #[arg(long)]
    pub env_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the environment variables for the given stage in the parameter store
    Push {
        /// The environment of the app (e.g. production, staging)
        stage: String,

        #[command(flatten)]
        conn: ConnectionArgs,

        /// Show what would change without touching the store
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation when every remote variable would be removed
        #[arg(short, long)]
        yes: bool,
    },

    /// Write the stage's parameters to .env.{stage}
    Pull {
        /// The environment of the app (e.g. production, staging)
        stage: String,

        #[command(flatten)]
        conn: ConnectionArgs,

        /// Output file (default: <env_dir>/.env.<stage>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "paramsync=debug" } else { "paramsync=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.parse()?),
        )
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ParamsyncConfig::default_path);
    let config = match cli.config {
        Some(_) => ParamsyncConfig::load(&config_path)?,
        None => ParamsyncConfig::load_or_default(&config_path)?,
    };

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Push {
            ref stage,
            ref conn,
            dry_run,
            yes,
        } => {
            let ctx = commands::RunContext::resolve(&config, stage, conn)?;
            rt.block_on(commands::push::run(&ctx, dry_run, yes))
        }
        Commands::Pull {
            ref stage,
            ref conn,
            ref output,
            force,
        } => {
            let ctx = commands::RunContext::resolve(&config, stage, conn)?;
            rt.block_on(commands::pull::run(&ctx, output.as_deref(), force))
        }
        Commands::Config => commands::config::run(&config_path, &config),
    }
}
