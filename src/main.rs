use clap::Parser;
use newsdesk::{DefaultAppState, config::DbConfig, db, migrations, routes::create_router};
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

/// Multipart uploads are capped at this many bytes.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Article management service backed by MySQL")]
struct Cli {
    /// Port to run the server on
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("newsdesk=debug".parse().unwrap()),
        )
        .init();

    if !dotenv_loaded {
        info!("No .env file found, using process environment");
    }

    let cli = Cli::parse();
    let config = DbConfig::from_env();

    // Startup connectivity check; a service with an unreachable database
    // should not come up at all.
    if let Err(err) = db::test_connection(&config) {
        error!(error = %err, "Failed to connect to database");
        std::process::exit(1);
    }

    info!(host = %config.host, database = %config.database, "Connected to database");

    // Migrations run on a dedicated connection, released before serving.
    {
        let mut conn = db::establish_connection(&config).unwrap_or_else(|err| {
            error!(error = %err, "Failed to open migration connection");
            std::process::exit(1);
        });

        if let Err(err) = migrations::run(&mut conn) {
            error!(error = %err, "Failed to run migrations");
            std::process::exit(1);
        }
    }

    let pool = db::create_pool(&config).unwrap_or_else(|err| {
        error!(error = %err, "Failed to create connection pool");
        std::process::exit(1);
    });

    let app_state = DefaultAppState::new(pool);

    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(15))),
        )
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(app_state);

    let bind_address = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .unwrap_or_else(|err| {
            error!(bind_address = %bind_address, error = %err, "Failed to bind to address");
            std::process::exit(1);
        });

    info!(port = cli.port, "Server starting");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
