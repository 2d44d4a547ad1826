//! # Scribe API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use scribe_core::ports::{PasswordService, TokenService};
use scribe_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Scribe API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await;

    let token_service: Arc<dyn TokenService> =
        Arc::new(JwtTokenService::new(JwtConfig::from_env()));
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::default());

    #[cfg(feature = "scheduler")]
    let mut scheduler = start_scheduler(&state).await?;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }

    server
}

/// Register and start the publish job.
#[cfg(feature = "scheduler")]
async fn start_scheduler(state: &AppState) -> std::io::Result<background::Scheduler> {
    use background::{PublishScheduledPosts, Scheduler, SchedulerConfig};

    let scheduler = Scheduler::new(SchedulerConfig::from_env())
        .await
        .map_err(std::io::Error::other)?;

    scheduler
        .add_publish_job(Arc::new(PublishScheduledPosts::new(state.posts.clone())))
        .await
        .map_err(std::io::Error::other)?;

    scheduler.start().await.map_err(std::io::Error::other)?;
    Ok(scheduler)
}
