// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use gov_notify::{NotifyOptions, NotifyService};
use hearings_core::common::JwtService;
use hearings_core::domains::notifications::NotificationSettings;
use hearings_core::domains::publications::LIST_TYPES;
use hearings_core::kernel::{HttpPdfRenderer, NotifyAdapter, PdfRendererRegistry, ServerDeps};
use hearings_core::server::{build_app, AppState};
use hearings_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hearings_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hearing list publication service");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let notify = NotifyService::new(NotifyOptions::new(config.notify_api_key.clone()))
        .context("Invalid NOTIFY_API_KEY")?;

    let mut pdf_renderers = PdfRendererRegistry::new();
    match &config.pdf_renderer_url {
        Some(renderer_url) => {
            tokio::fs::create_dir_all(&config.pdf_storage_dir)
                .await
                .context("Failed to create PDF storage directory")?;
            for list_type in LIST_TYPES {
                pdf_renderers = pdf_renderers.register(
                    list_type.id,
                    Arc::new(HttpPdfRenderer::new(
                        renderer_url,
                        list_type.id,
                        config.pdf_storage_dir.clone(),
                    )),
                );
            }
            tracing::info!(count = pdf_renderers.len(), "PDF renderers registered");
        }
        None => tracing::warn!("PDF_RENDERER_URL not set, publications will not get PDFs"),
    }

    let settings = NotificationSettings {
        template_id: config.notify_template_id.clone(),
        template_id_with_file: config.notify_template_id_with_file.clone(),
        base_url: config.base_url.clone(),
        concurrency: config.notification_concurrency,
    };

    let deps = ServerDeps::postgres(
        pool.clone(),
        Arc::new(NotifyAdapter::new(Arc::new(notify))),
        pdf_renderers,
        settings,
    );
    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone());

    let app = build_app(
        AppState::new(deps, jwt_service, Some(pool)),
        &config.allowed_origins,
    );

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
