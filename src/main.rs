//! Resell Timers - countdown timer service for the resell Mini App
//!
//! This is the main entry point for the resell-timers application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use resell_timers::{
    api::create_router,
    config::Config,
    services::{DisabledNotifier, HttpNotifier, NoticeBoard, RemoteNotifier, RodioOutput, SoundAlert},
    state::{AppState, TimerManager},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("resell_timers={},tower_http=info", config.log_level()))
        .init();

    info!("Starting resell-timers server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, tick={}ms, exit transition={}ms",
        config.host, config.port, config.tick_ms, config.exit_transition_ms
    );

    let remote: Arc<dyn RemoteNotifier> = match &config.notify_url {
        Some(url) => {
            info!("Completion notifications go to {}", url);
            Arc::new(HttpNotifier::new(url, config.user_id, config.notify_timeout())?)
        }
        None => {
            warn!("No --notify-url given, completion notifications are disabled");
            Arc::new(DisabledNotifier)
        }
    };
    let alert = Arc::new(SoundAlert::new(RodioOutput::new(config.volume), config.sound_file.clone()));
    let notices = Arc::new(NoticeBoard::new());

    let timers = TimerManager::new(config.manager_settings(), notices.clone(), alert, remote);
    let state = Arc::new(AppState::new(
        Arc::clone(&timers),
        notices,
        config.port,
        config.host.clone(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /timers             - Start a timer");
    info!("  POST   /timers/:name/toggle - Pause or resume a timer");
    info!("  DELETE /timers/:name       - Stop a timer");
    info!("  GET    /timers             - Active timers");
    info!("  GET    /timers/events      - Timer event stream");
    info!("  GET    /notices            - Recent notices");
    info!("  GET    /status             - Server status");
    info!("  GET    /health             - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    timers.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
