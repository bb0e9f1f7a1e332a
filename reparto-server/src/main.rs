use reparto_server::core::{Config, ServerState};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file (best effort)
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env()?;

    tracing::info!(
        "Starting reparto-server (env: {}, work_dir: {})",
        config.environment,
        config.work_dir
    );

    // Initialize application state (pool + migrations + services)
    let state = ServerState::initialize(&config).await?;

    // Register reconciliation jobs
    state.start_background_tasks().await;

    // Build the router and serve
    let app = reparto_server::api::build_app(&state).with_state(state.clone());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("reparto-server HTTP listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop background tasks after the listener winds down
    state.shutdown_background_tasks().await;

    Ok(())
}

/// Console logging by default; daily-rotated files when LOG_DIR points
/// at an existing directory. RUST_LOG wins over LOG_LEVEL.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| std::env::var("LOG_LEVEL").map(tracing_subscriber::EnvFilter::new))
        .unwrap_or_else(|_| "reparto_server=info,tower_http=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_DIR") {
        Ok(dir) if std::path::Path::new(&dir).is_dir() => {
            let appender = tracing_appender::rolling::daily(dir, "reparto-server");
            builder.with_ansi(false).with_writer(appender).init();
        }
        _ => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}
