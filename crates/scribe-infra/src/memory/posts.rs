//! In-memory post repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use scribe_core::domain::Post;
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, PostRepository};

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let slot = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);

        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_published(
        &self,
        now: DateTime<Utc>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let posts = self.posts.read().await;
        let mut visible: Vec<&Post> = posts
            .iter()
            .filter(|p| p.is_publicly_visible(now))
            .collect();
        // Stable sort: equal timestamps keep insertion order.
        visible.sort_by_key(|p| p.created_at);

        let offset = page.saturating_sub(1).saturating_mul(per_page) as usize;
        let items = visible
            .iter()
            .skip(offset)
            .take(per_page as usize)
            .map(|p| (*p).clone())
            .collect();

        Ok((items, visible.len() as u64))
    }

    async fn publish_due(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut posts = self.posts.write().await;
        let mut published = 0;

        for post in posts.iter_mut().filter(|p| p.is_due(now)) {
            post.is_draft = false;
            post.updated_at = now;
            published += 1;
        }

        tracing::debug!(published, "Bulk publish executed");
        Ok(published)
    }
}
