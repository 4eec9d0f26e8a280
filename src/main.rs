use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use culinary_api::config::AppConfig;
use culinary_api::database::{self, PgCatalog};
use culinary_api::identity::HttpIdentityClient;
use culinary_api::{app, AppState};

#[derive(Parser)]
#[command(name = "culinary-api")]
#[command(about = "Nutrition catalog API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Print the effective configuration as JSON")]
    Config,

    #[command(about = "Query the /health endpoint of a running server")]
    Health {
        #[arg(long, env = "CULINARY_API_URL", default_value = "http://127.0.0.1:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up DATABASE_URL, AUTH_ADDR, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("culinary_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(AppConfig::from_env()?).await,
        Command::Config => {
            let config = AppConfig::from_env()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Health { url } => health(&url).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Culinary API in {:?} mode", config.environment);

    let pool = database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let catalog = PgCatalog::new(pool);
    let identity = HttpIdentityClient::new(&config.auth)?;
    tracing::info!("Validating tokens against {}", identity.ping_url());

    let state = AppState {
        categories: catalog.store(),
        brands: catalog.store(),
        food_types: catalog.store(),
        foods: catalog.store(),
        readiness: Arc::new(catalog.clone()),
        identity: Arc::new(identity),
    };
    let router = app(state, &config)?;

    let listener = TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    tracing::info!("Culinary API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    catalog.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn health(base_url: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        bail!("server reported {}", status);
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}
