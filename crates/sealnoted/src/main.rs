//! sealnoted: encrypted note-storage daemon
//!
//! Usage:
//!   sealnoted [--config /etc/sealnote/config.toml] [--listen 127.0.0.1:5000]
//!
//! The note encryption key and token secret are required configuration
//! (SEALNOTE_ENCRYPTION_KEY / SEALNOTE_TOKEN_SECRET also work); the daemon
//! refuses to start without them rather than minting an ephemeral key that
//! would strand every stored note on restart.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use sealnote_core::config::SealnoteConfig;
use sealnote_crypto::{BodyCipher, HashParams};
use sealnote_store::Store;
use sealnoted::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "sealnoted", version, about = "SealNote encrypted note daemon")]
struct Cli {
    /// Path to sealnote.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "SEALNOTE_CONFIG",
        default_value = "/etc/sealnote/config.toml"
    )]
    config: PathBuf,

    /// Listen address override (default from config: 127.0.0.1:5000)
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SEALNOTE_LOG", default_value = "info")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "SEALNOTE_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, &cli.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "sealnoted starting"
    );

    let config = load_config(&cli.config).await?;

    // Fail fast on missing secrets, before touching the database
    let key = config.encryption_key().context("startup refused")?;
    let token_secret = config.token_secret().context("startup refused")?;

    let store = Store::open(&config.database.path, BodyCipher::new(key))
        .with_context(|| format!("opening database {}", config.database.path.display()))?;
    info!(path = %config.database.path.display(), "database opened");

    let hash_params = HashParams {
        mem_cost_kib: config.auth.argon2_mem_cost_kib,
        time_cost: config.auth.argon2_time_cost,
        parallelism: config.auth.argon2_parallelism,
    };

    let state = AppState::new(store, token_secret, hash_params);
    let listen = cli.listen.unwrap_or_else(|| config.server.listen.clone());
    server::serve(&listen, state).await
}

async fn load_config(path: &PathBuf) -> Result<SealnoteConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("parsing config {}: {e}", path.display()))
    } else {
        tracing::warn!(
            "config file not found: {}  (using defaults; secrets must come from the environment)",
            path.display()
        );
        Ok(SealnoteConfig::default())
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
