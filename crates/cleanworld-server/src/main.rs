//! CleanWorld - community clean-up map and events service

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use cleanworld_api::{AppState, create_router};
use cleanworld_auth::{AuthState, Policy, TokenService, hash_password};
use cleanworld_db::{Database, NewUser, Role};
use config::Config;

/// CleanWorld - community clean-up map and events service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "CLEANWORLD_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "CLEANWORLD_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging.level);

    info!("Starting CleanWorld v{}", env!("CARGO_PKG_VERSION"));

    // Make sure the database directory exists before sqlite opens it
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let password_hash = hash_password("admin")?;
        db.insert_user(NewUser {
            name: "admin".to_string(),
            email: "admin@cleanworld.local".to_string(),
            password_hash,
            avatar: None,
            role: Role::Admin,
        })
        .await?;
        info!("Default admin user created (email: admin@cleanworld.local, password: admin)");
    }

    let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_secs);
    let auth = AuthState::new(tokens, db.clone(), Policy::cleanworld());

    let state = AppState::new(db, auth);

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
