use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is looking at a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Guest,
    User(Uuid),
}

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Guest => None,
            Viewer::User(id) => Some(*id),
        }
    }
}

impl From<Option<Uuid>> for Viewer {
    fn from(user_id: Option<Uuid>) -> Self {
        user_id.map_or(Viewer::Guest, Viewer::User)
    }
}

/// Post entity - a blog post owned by the user who created it.
///
/// Visibility is derived from `is_draft` and `published_at`; see
/// [`Post::is_publicly_visible`] and [`Post::is_visible_to`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// Validated partial update. `None` leaves the field untouched;
/// `published_at: Some(None)` clears the schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_draft: Option<bool>,
    pub published_at: Option<Option<DateTime<Utc>>>,
}

impl Post {
    /// Create a new post owned by `user_id`.
    pub fn new(user_id: Uuid, input: NewPost, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            title: input.title,
            content: input.content,
            is_draft: input.is_draft,
            published_at: input.published_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Not a draft, and either unscheduled or scheduled at or before `now`.
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        !self.is_draft && self.published_at.is_none_or(|at| at <= now)
    }

    /// Owners always see their own posts; everyone else gets the public rule.
    pub fn is_visible_to(&self, viewer: &Viewer, now: DateTime<Utc>) -> bool {
        match viewer {
            Viewer::User(id) if self.is_owned_by(*id) => true,
            _ => self.is_publicly_visible(now),
        }
    }

    /// A scheduled draft whose publication time has arrived.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_draft && self.published_at.is_some_and(|at| at <= now)
    }

    /// Apply a partial update, bumping `updated_at`.
    pub fn apply(&mut self, changes: PostChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.content = content;
        }
        if let Some(is_draft) = changes.is_draft {
            self.is_draft = is_draft;
        }
        if let Some(published_at) = changes.published_at {
            self.published_at = published_at;
        }
        self.updated_at = now;
    }
}
