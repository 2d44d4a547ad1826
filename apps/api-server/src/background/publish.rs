//! Scheduled post publication.

use std::sync::Arc;

use scribe_core::PostService;
use tokio::sync::Mutex;

/// Result of a single publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(u64),
    /// A previous run was still in progress.
    Skipped,
    Failed,
}

/// Promotes due scheduled drafts. At most one run executes at a time.
pub struct PublishScheduledPosts {
    posts: Arc<PostService>,
    running: Mutex<()>,
}

impl PublishScheduledPosts {
    pub fn new(posts: Arc<PostService>) -> Self {
        Self {
            posts,
            running: Mutex::new(()),
        }
    }

    pub async fn run(&self) -> PublishOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!("Previous publish run still in progress, skipping");
            return PublishOutcome::Skipped;
        };

        let now = self.posts.now();
        match self.posts.publish_due(now).await {
            Ok(count) => {
                tracing::info!(published = count, "Posts published successfully");
                PublishOutcome::Published(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "Posts publish failed");
                PublishOutcome::Failed
            }
        }
    }
}
