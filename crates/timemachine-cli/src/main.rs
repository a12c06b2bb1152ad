use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use timemachine_application::{AuthUseCase, ReflectionApp, diary_strategy_for};
use timemachine_core::config::{AppConfig, DiaryMode};
use timemachine_core::gateway::ReflectionGateway;
use timemachine_core::session_store::{KeyValueStore, SessionStore};
use timemachine_infrastructure::{
    ConfigService, FileKeyValueStore, MemoryKeyValueStore, TimeMachinePaths,
};
use timemachine_interaction::HttpReflectionGateway;
use tracing_subscriber::EnvFilter;

mod commands;
mod helper;
mod render;
mod repl;

/// Environment variable overriding the configured backend URL.
const BACKEND_URL_ENV: &str = "TIMEMACHINE_BACKEND_URL";

#[derive(Parser)]
#[command(name = "timemachine")]
#[command(about = "TimeMachine - replay a past conversation and get a reflection report", long_about = None)]
struct Cli {
    /// Backend base URL (wins over the config file and TIMEMACHINE_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Directory holding config.toml
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Directory for the stored session and local diaries
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where the diary lives: `server` or `local`
    #[arg(long)]
    diary_mode: Option<DiaryMode>,

    /// Keep the session in memory only
    #[arg(long)]
    ephemeral: bool,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(cli: &Cli, paths: &TimeMachinePaths) -> Result<AppConfig> {
    let env_url = std::env::var(BACKEND_URL_ENV).ok();
    let mut config = ConfigService::new(paths.config_file())
        .get_config()?
        .with_backend_url(env_url.as_deref())
        .with_backend_url(cli.backend_url.as_deref());
    if let Some(mode) = cli.diary_mode {
        config.diary_mode = mode;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut paths = TimeMachinePaths::resolve(cli.config_dir.as_deref(), cli.data_dir.as_deref())?;
    let config = load_config(&cli, &paths)?;
    init_tracing(&config.log_level);

    if let (None, Some(dir)) = (&cli.data_dir, &config.data_dir) {
        paths = paths.with_data_dir(dir);
    }

    let store: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryKeyValueStore::new())
    } else {
        Arc::new(FileKeyValueStore::new(paths.store_dir()))
    };
    let session_store = SessionStore::new(store);

    let backend_url = config.normalized_backend_url();
    tracing::info!(
        "Backend {} ({} diary, store {})",
        backend_url,
        config.diary_mode,
        if cli.ephemeral {
            "in memory".to_string()
        } else {
            paths.store_dir().display().to_string()
        }
    );
    let gateway: Arc<dyn ReflectionGateway> = Arc::new(HttpReflectionGateway::new(backend_url));

    let diary = diary_strategy_for(config.diary_mode, gateway.clone(), session_store.clone());
    let app = ReflectionApp::new(
        gateway.clone(),
        session_store,
        diary,
        config.turn_policy(),
    );
    let auth = AuthUseCase::new(gateway);

    repl::Repl::new(app, auth)?.run().await
}
