use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// UTC millisecond-precision timestamp formatter: `2026-02-17T00:59:15.920Z`.
struct MillisecondTime;

impl FormatTime for MillisecondTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = jiff::Zoned::now();
        write!(w, "{}", now.strftime("%Y-%m-%dT%H:%M:%S.%3fZ"))
    }
}

use crate::api::build_router;
use crate::daemon::state::AppState;
use shared::konst::{TESTBED_BASE_DIR, TESTBED_CONFIG_DIR, TESTBED_CONFIG_FILE, TESTBED_LBD_LOG_FILE, TESTBED_LOG_DIR};
use shared::util::config::load_config;

/// Runs the testbed-lbd server: logging setup, config load, state
/// construction, router, and graceful-shutdown-aware `axum::serve`.
pub async fn run_server(foreground: bool) -> Result<()> {
    let (filter, using_default) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new("info"), true),
    };

    if foreground {
        tracing_subscriber::fmt()
            .with_timer(MillisecondTime)
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .init();
    } else {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(format!("{TESTBED_BASE_DIR}/{TESTBED_LOG_DIR}/{TESTBED_LBD_LOG_FILE}"))?;
        let log_file = Arc::new(log_file);

        tracing_subscriber::fmt()
            .with_timer(MillisecondTime)
            .with_env_filter(filter)
            .with_writer(move || log_file.clone())
            .with_target(false)
            .with_thread_ids(false)
            .with_ansi(false)
            .compact()
            .init();
    }

    if using_default {
        tracing::info!("RUST_LOG not set or invalid, using default 'info' level");
    }

    tracing::info!("starting testbed-lbd server");

    let config_dir = std::env::var(shared::konst::CONFIG_DIR_ENV)
        .unwrap_or_else(|_| format!("{TESTBED_BASE_DIR}/{TESTBED_CONFIG_DIR}"));
    let config_path = format!("{config_dir}/{TESTBED_CONFIG_FILE}");
    let config = load_config(&config_path).context("failed to load testbed.toml config")?;

    tracing::info!("server will listen on {}:{}", config.bind_addr, config.bind_port);

    let state = AppState::new(config.clone())
        .await
        .context("failed to initialize application state")?;
    let reconciler_cancel = state.reconciler_cancel.clone();

    let app = build_router().with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.bind_port)
        .parse()
        .context("invalid bind address or port")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    tracing::info!("testbed-lbd listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = reconciler_cancel.send(true);
    tracing::info!("testbed-lbd server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received CTRL+C signal");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM signal");
        },
    }

    tracing::info!("starting graceful shutdown");
}
