use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use resqnet_api::config::{ServerConfig, StoreSettings};
use resqnet_api::router::build_app_router;
use resqnet_api::state::AppState;
use resqnet_db::{IncidentStore, PgIncidentStore, PostgrestConfig, PostgrestIncidentStore};
use resqnet_gemini::{GeminiApi, GeminiConfig, InferenceClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "resqnet_api=debug,resqnet_db=debug,resqnet_gemini=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Collaborators ---
    let incidents = build_incident_store(&config).await?;

    let inference: Arc<dyn InferenceClient> = Arc::new(
        GeminiApi::new(GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            api_base: config.gemini.api_base.clone(),
            timeout: config.upstream_timeout(),
        })
        .context("Failed to build inference client")?,
    );
    tracing::info!(model = %config.gemini.model, "Inference client created");

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    let state = AppState {
        config: Arc::new(config),
        incidents,
        inference,
    };

    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Construct the incident store selected by configuration.
async fn build_incident_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn IncidentStore>> {
    match &config.store {
        StoreSettings::Postgres { database_url } => {
            let pool = resqnet_db::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            resqnet_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            Ok(Arc::new(PgIncidentStore::new(pool)))
        }
        StoreSettings::Postgrest { url, api_key } => {
            let store = PostgrestIncidentStore::new(PostgrestConfig {
                base_url: url.clone(),
                api_key: api_key.clone(),
                timeout: config.upstream_timeout(),
            })
            .context("Failed to build data store client")?;
            tracing::info!(%url, "Data store client created");

            Ok(Arc::new(store))
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
