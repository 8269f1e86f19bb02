use std::path::PathBuf;
use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use backend_lib::{
    api,
    config::{Settings, DEFAULT_CONFIG_FILE},
    provider::YouTubeProvider,
    storage::{FlatFileStorage, MemoryRegistry},
    AppState,
};

/// Watch-party room server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file, layered under `WATCHPARTY_*` environment variables
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(level: &str, json: bool) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    init_tracing(&settings.log_level, cli.json_logs);

    let registry = MemoryRegistry::new(settings.registry.ttl());
    let sweeper = registry.spawn_sweeper(settings.registry.sweep_interval());

    let storage = FlatFileStorage::new(&settings.data_dir)?;
    let provider = YouTubeProvider::new(&settings.provider)?;
    if settings.provider.api_key.is_none() {
        tracing::warn!("no provider api key configured, playlist links will be rejected");
    }

    let addr = settings.bind_addr;
    let state = Arc::new(AppState::with_storage(
        registry,
        storage,
        Arc::new(provider),
        settings,
    ));

    let app = api::create_router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    Ok(())
}
