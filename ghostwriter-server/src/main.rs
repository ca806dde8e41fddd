mod shutdown;

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context as _;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use ghostwriter_core::{AppConfig, AppState, SharedState};
use ghostwriter_routes::ROUTES;
use ghostwriter_utils::env::{ProcessEnv, env_string};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file; its values win over the inherited environment.
    dotenvy::dotenv_override().ok();

    init_tracing();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    let (state, bind_address) = initialize().await?;
    serve(state, bind_address).await
}

fn init_tracing() {
    let max_level = env_string(&ProcessEnv, "LOG_LEVEL")
        .and_then(|value| tracing::Level::from_str(&value).ok())
        .unwrap_or(tracing::Level::INFO);

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(move |metadata| {
        if *metadata.level() > max_level {
            return false;
        }

        let target = metadata.target();
        !(target.starts_with("hyper") || target.starts_with("h2") || target.starts_with("rustls"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Configuration, context and completion client. Fails before any socket is
/// opened when configuration is missing.
async fn initialize() -> anyhow::Result<(SharedState, SocketAddr)> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Ghostwriter cannot start.");
            return Err(err).context("invalid configuration");
        }
    };

    let bind_address = config.bind_address;
    let state = AppState::initialize(config)
        .await
        .context("failed to initialize application state")?;

    Ok((state.shared(), bind_address))
}

async fn serve(state: SharedState, bind_address: SocketAddr) -> anyhow::Result<()> {
    for route in ROUTES {
        info!(method = route.method, path = route.path, "{}", route.desc);
    }

    let app = ghostwriter_routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(%bind_address, "Ghostwriter is listening.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .context("http server exited with an error")?;

    info!("Ghostwriter stopped.");
    Ok(())
}
