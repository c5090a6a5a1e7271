//! tally-daemon entry point.
//!
//! Sets up tracing, loads config and secrets, builds the shared state,
//! starts the background loops and serves HTTP until Ctrl-C / SIGTERM.
//! Route handlers live in `routes.rs`; shared state in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tally_config::{ConfigConsumer, UnusedKeyPolicy};
use tally_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const LISTENER_RETRY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = tally_config::load_from_env().context("config load failed")?;
    let report = tally_config::report_unused_keys(
        ConfigConsumer::Daemon,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )?;
    if !report.is_clean() {
        warn!(keys = ?report.unused_leaf_pointers, "unused config keys");
    }
    let settings = tally_config::BoardSettings::from_config_json(&loaded.config_json)?;
    let secrets = tally_config::secrets::resolve_secrets(&loaded.config_json);
    info!(config_hash = %loaded.config_hash, ?secrets, "config loaded");

    let pool = tally_db::connect_lazy(secrets.require_database_url()?)?;
    let store = Arc::new(tally_db::PgStore::new(pool));

    let shared = Arc::new(state::AppState::new(
        store,
        &settings,
        secrets.admin_passcode.clone(),
    ));
    if shared.admin_passcode.is_none() {
        warn!(
            var = %secrets.admin_passcode_var,
            "no admin passcode configured; operator routes are open"
        );
    }

    let tasks = vec![
        state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1)),
        state::spawn_poll_loop(
            Arc::clone(&shared),
            Duration::from_millis(settings.poll_interval_ms),
        ),
        state::spawn_change_listener(Arc::clone(&shared), LISTENER_RETRY),
        state::spawn_reveal_driver(
            Arc::clone(&shared),
            Duration::from_millis(settings.driver_interval_ms),
        ),
    ];

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env()
        .or_else(|| settings.bind_addr.as_deref()?.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8899)));
    info!("tally-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    shared.teardown().await;
    for t in tasks {
        t.abort();
    }
    info!("tally-daemon stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("TALLY_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
