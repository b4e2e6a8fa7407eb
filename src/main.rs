use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locallibrary::infrastructure::AppState;
use locallibrary::{config, db, seed, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "locallibrary=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let profile = args
        .iter()
        .position(|arg| arg == "--profile")
        .and_then(|pos| args.get(pos + 1))
        .cloned()
        .or_else(|| std::env::var("PROFILE").ok());

    let config = config::Config::for_profile(profile);

    if let Err(e) = config.signing_secret() {
        tracing::warn!("Logins will fail: {}", e);
    }

    // Initialize database
    let db = db::init_db(&config.database_url).await?;

    if std::env::var("SEED_DEMO").is_ok() || args.iter().any(|arg| arg == "--seed") {
        tracing::info!("Seeding demo data...");
        let state = AppState::new(db.clone(), config.clone());
        if let Err(e) = seed::seed_demo_data(&state).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    let port = server::find_available_port(config.port).ok_or("no available port")?;
    if port != config.port {
        tracing::warn!(
            "Preferred port {} was not available, using port {} instead",
            config.port,
            port
        );
    }

    let app = server::build_router(db, config);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("LocalLibrary server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
