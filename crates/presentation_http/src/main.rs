//! WhatsApp relay HTTP server
//!
//! Main entry point: wires the gateway adapters, starts the session
//! connector and the optional keep-alive task, then serves HTTP.

use std::{sync::Arc, time::Duration};

use application::{
    DispatchService, LivenessMonitor, LivenessService, SessionConnector, SessionProvider,
};
use infrastructure::{
    AppConfig, FileCredentialStore, HttpLivenessProbe, WhatsAppMediaAdapter,
    WhatsAppSessionBackend, init_telemetry,
};
use integration_whatsapp::EvolutionClient;
use presentation_http::{routes, spawn_keep_alive_task, state::AppState};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; logging depends on it, so report failures after init
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_telemetry(&config.telemetry)?;

    if let Some(e) = load_error {
        warn!("Failed to load config, using defaults: {}", e);
    }

    info!("📨 WhatsApp relay v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        host = %config.server.host,
        port = %config.server.port,
        instance = %config.gateway.instance,
        auth_dir = %config.session.auth_dir,
        "Configuration loaded"
    );

    // Gateway client shared by the session backend and the media adapter
    let client = Arc::new(
        EvolutionClient::new(config.gateway.client_config())
            .map_err(|e| anyhow::anyhow!("Failed to initialize gateway client: {e}"))?,
    );

    let backend = WhatsAppSessionBackend::with_client(Arc::clone(&client))
        .with_poll_interval(config.session.poll_interval());
    let credentials = FileCredentialStore::new(&config.session.auth_dir);

    let connector = Arc::new(SessionConnector::new(
        Arc::new(backend),
        Arc::new(credentials),
        config.session.reconnect_policy(),
    ));
    let connector_task = connector.spawn();

    let sessions: Arc<dyn SessionProvider> = connector.clone();
    let dispatch = DispatchService::new(sessions, Arc::new(WhatsAppMediaAdapter::new(client)))
        .with_send_timeout(config.session.send_timeout());

    // Keep-alive
    let liveness = Arc::new(LivenessMonitor::new(config.keep_alive.failure_threshold));
    let keep_alive_task = match config.keep_alive.target() {
        Some(url) => {
            let probe = HttpLivenessProbe::new(url, config.keep_alive.timeout())?;
            let service = LivenessService::new(Arc::new(probe), Arc::clone(&liveness));
            Some(spawn_keep_alive_task(
                Arc::new(service),
                config.keep_alive.interval(),
            ))
        },
        None => {
            info!("Keep-alive disabled, no url configured");
            None
        },
    };

    let state = AppState {
        dispatch: Arc::new(dispatch),
        connector,
        liveness,
    };

    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("🚀 Server listening on http://{}", addr);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await?;

    connector_task.abort();
    if let Some(task) = keep_alive_task {
        task.abort();
    }

    info!("👋 Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("📥 Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("📥 Received SIGTERM, initiating graceful shutdown...");
        }
    }

    info!("⏳ Waiting up to {:?} for connections to close...", timeout);
}
