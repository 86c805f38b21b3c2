use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use intake_service::{
    config::Config,
    handlers::{self, ServiceState},
    storage,
};
use risk_engine::RiskScorer;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("intake_service=info,risk_engine=info,actix_web=info")
            }),
        )
        .json()
        .init();

    info!("Starting Intake Service...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    info!("Configuration loaded successfully");

    // Submission sink
    let sink = storage::create_sink(&config.storage);
    if let Err(e) = sink.health_check().await {
        error!("Submission sink health check failed: {}", e);
        return Err(e.into());
    }
    info!(
        "Submission sink '{}' ready at {}",
        sink.name(),
        config.storage.upload_dir.display()
    );

    // Initialize components
    let scorer = Arc::new(RiskScorer::new());
    let state = web::Data::new(
        ServiceState::new(config.scoring.strict_tags)
            .with_upload_limit(config.server.max_payload_bytes),
    );
    if config.scoring.strict_tags {
        info!("Strict answer tags enabled - unknown tags are rejected");
    }

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(scorer.clone()))
            .app_data(web::Data::new(sink.clone()))
            .app_data(state.clone())
            .app_data(handlers::json_config(server_config.max_payload_bytes))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.clone(), config.server.port))?
    .run()
    .await?;

    info!("Intake Service stopped");
    Ok(())
}
