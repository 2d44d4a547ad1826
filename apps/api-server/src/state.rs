//! Application state - shared across all handlers.

use std::sync::Arc;

use scribe_core::PostService;
use scribe_core::ports::{PostRepository, SystemClock, UserRepository};
use scribe_infra::{InMemoryPostRepository, InMemoryUserRepository};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub users: Arc<dyn UserRepository>,
    pub login_path: String,
}

impl AppState {
    /// Build state from repositories.
    pub fn with_repositories(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            posts: Arc::new(PostService::new(posts, Arc::new(SystemClock))),
            users,
            login_path: login_path.into(),
        }
    }

    /// State backed by in-memory repositories.
    pub fn in_memory(login_path: impl Into<String>) -> Self {
        Self::with_repositories(
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            login_path,
        )
    }

    /// Build the application state, falling back to in-memory repositories
    /// when the database is not configured or unreachable.
    pub async fn new(config: &AppConfig) -> Self {
        if let Some(state) = Self::connect_postgres(config).await {
            tracing::info!("Application state initialized (postgres)");
            return state;
        }

        if config.database.is_none() {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
        tracing::info!("Application state initialized (in-memory)");

        Self::in_memory(config.login_path.clone())
    }

    #[cfg(feature = "postgres")]
    async fn connect_postgres(config: &AppConfig) -> Option<Self> {
        use scribe_infra::{PostgresPostRepository, PostgresUserRepository};

        let db_config = config.database.as_ref()?;
        match scribe_infra::database::connect(db_config).await {
            Ok(conn) => Some(Self::with_repositories(
                Arc::new(PostgresPostRepository::new(conn.clone())),
                Arc::new(PostgresUserRepository::new(conn)),
                config.login_path.clone(),
            )),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                None
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect_postgres(config: &AppConfig) -> Option<Self> {
        if config.database.is_some() {
            tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
        }
        None
    }
}
