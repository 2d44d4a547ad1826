//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use scribe_core::domain::{Post, User, normalize_email};
use scribe_core::error::RepoError;
use scribe_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Mask the local part of an email so it can be logged.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// `is_draft = false AND (published_at IS NULL OR published_at <= now)`
fn publicly_visible(now: DateTimeWithTimeZone) -> Condition {
    Condition::all()
        .add(post::Column::IsDraft.eq(false))
        .add(
            Condition::any()
                .add(post::Column::PublishedAt.is_null())
                .add(post::Column::PublishedAt.lte(now)),
        )
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_published(
        &self,
        now: DateTime<Utc>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let paginator = PostEntity::find()
            .filter(publicly_visible(now.into()))
            .order_by_asc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await.map_err(map_db_err)?;

        // Pages past the end are empty; this also keeps the offset in range.
        let index = page.saturating_sub(1);
        let in_range = index
            .checked_mul(per_page)
            .is_some_and(|offset| offset < total);
        if !in_range {
            return Ok((Vec::new(), total));
        }

        let models = paginator
            .fetch_page(index)
            .await
            .map_err(map_db_err)?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn publish_due(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let now: DateTimeWithTimeZone = now.into();

        let result = PostEntity::update_many()
            .col_expr(post::Column::IsDraft, Expr::value(false))
            .col_expr(post::Column::UpdatedAt, Expr::value(now))
            .filter(post::Column::IsDraft.eq(true))
            .filter(post::Column::PublishedAt.is_not_null())
            .filter(post::Column::PublishedAt.lte(now))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(published = result.rows_affected, "Bulk publish executed");
        Ok(result.rows_affected)
    }
}
