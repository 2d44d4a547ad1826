//! Post use cases: listing, show, create, update, delete, and the scheduled
//! publication batch.
//!
//! Every call that depends on who is asking takes an explicit [`Viewer`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{NewPost, Page, Post, PostChanges, Viewer};
use crate::error::{DomainError, RepoError};
use crate::ports::{Clock, PostRepository};

/// Fixed page size of the public listing.
pub const PUBLISHED_PAGE_SIZE: u64 = 20;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { posts, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Publicly visible posts, [`PUBLISHED_PAGE_SIZE`] per page.
    pub async fn list_published(&self, page: u64) -> Result<Page<Post>, DomainError> {
        let page = page.max(1);
        let (items, total) = self
            .posts
            .find_published(self.now(), page, PUBLISHED_PAGE_SIZE)
            .await?;

        Ok(Page::new(items, page, PUBLISHED_PAGE_SIZE, total))
    }

    /// A post the viewer is allowed to see. Hidden posts are reported as
    /// missing.
    pub async fn show(&self, id: Uuid, viewer: &Viewer) -> Result<Post, DomainError> {
        match self.posts.find_by_id(id).await? {
            Some(post) if post.is_visible_to(viewer, self.now()) => Ok(post),
            _ => Err(DomainError::post_not_found(id)),
        }
    }

    pub async fn create(&self, owner_id: Uuid, input: NewPost) -> Result<Post, DomainError> {
        let post = Post::new(owner_id, input, self.now());
        Ok(self.posts.insert(post).await?)
    }

    /// A post the viewer owns, for editing.
    pub async fn find_owned(&self, id: Uuid, viewer: &Viewer) -> Result<Post, DomainError> {
        let user_id = viewer.user_id().ok_or(DomainError::Unauthenticated)?;
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))?;

        if !post.is_owned_by(user_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    pub async fn update(
        &self,
        id: Uuid,
        viewer: &Viewer,
        changes: PostChanges,
    ) -> Result<Post, DomainError> {
        let mut post = self.find_owned(id, viewer).await?;
        post.apply(changes, self.now());

        self.posts.update(post).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(id),
            other => other.into(),
        })
    }

    pub async fn delete(&self, id: Uuid, viewer: &Viewer) -> Result<(), DomainError> {
        self.find_owned(id, viewer).await?;

        self.posts.delete(id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(id),
            other => other.into(),
        })
    }

    /// Promote every scheduled draft whose time has come. Idempotent.
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        Ok(self.posts.publish_due(now).await?)
    }
}
