use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use arcade_persistence::{CustomerRepository, connection::connect_and_migrate};
use arcade_server::{
    ai_opponent::GeminiOpponent, config::Config, create_routes, invites::InviteBoard,
    progression::ProgressionService, round_manager::RoundManager, websocket,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Blink Arcade server...");

    let config = Config::new();
    if config.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY not set; AI rounds will score the AI side blank");
    }

    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let connection_manager = Arc::new(ConnectionManager::new());
    let invite_board = Arc::new(InviteBoard::new(Duration::from_secs(
        config.invite_retention_seconds,
    )));
    let progression = Arc::new(ProgressionService::new(Arc::new(CustomerRepository::new(
        db,
    ))));
    let round_manager = Arc::new(RoundManager::new(
        Arc::new(GeminiOpponent::from_config(&config)),
        progression.clone(),
        Duration::from_secs(config.round_grace_seconds),
    ));

    let routes = create_routes(
        connection_manager.clone(),
        invite_board.clone(),
        round_manager.clone(),
        progression.clone(),
        config.restaurant_id.clone(),
    );

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_invite_board = invite_board.clone();
    let cleanup_round_manager = round_manager.clone();
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;

            let swept = cleanup_invite_board.sweep_resolved().await;
            if swept > 0 {
                info!("Swept {} resolved invites", swept);
            }

            for outcome in cleanup_round_manager.finish_overdue().await {
                websocket::deliver_outcome(&cleanup_connection_manager, outcome).await;
            }

            cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config
            .host
            .parse::<std::net::IpAddr>()
            .expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
