//! Scribe command line tasks.
//!
//! `scribe posts:publish` runs the scheduled publication batch once, for use
//! from cron or a deployment hook when the server's scheduler is disabled.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribe_core::PostService;
use scribe_core::ports::{PostRepository, SystemClock};
use scribe_infra::{DatabaseConfig, PostgresPostRepository};

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Scribe maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish every scheduled draft whose time has come
    #[command(name = "posts:publish")]
    PostsPublish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::PostsPublish => {
            let config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
            let conn = scribe_infra::database::connect(&config)
                .await
                .context("Failed to connect to database")?;

            let published = publish_scheduled(Arc::new(PostgresPostRepository::new(conn))).await?;
            println!("Published {published} scheduled post(s).");
        }
    }

    Ok(())
}

async fn publish_scheduled(posts: Arc<dyn PostRepository>) -> Result<u64> {
    let service = PostService::new(posts, Arc::new(SystemClock));

    match service.publish_due(service.now()).await {
        Ok(count) => {
            tracing::info!(published = count, "Posts published successfully");
            Ok(count)
        }
        Err(e) => {
            tracing::error!(error = %e, "Posts publish failed");
            Err(e).context("Publishing scheduled posts failed")
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,scribe=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
