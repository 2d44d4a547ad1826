//! Post handlers.

use std::collections::HashMap;

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use scribe_core::domain::{Page, Post};
use scribe_core::validation::PostInput;
use scribe_shared::Paginated;
use scribe_shared::dto::{OwnerSummary, PageQuery, PostForm, PostPayload, PostResponse};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn input(payload: &PostPayload) -> PostInput<'_> {
    PostInput {
        title: payload.title.as_ref(),
        content: payload.content.as_ref(),
        is_draft: payload.is_draft.as_ref(),
        published_at: payload.published_at.as_ref(),
    }
}

fn post_response(post: Post, user: Option<OwnerSummary>) -> PostResponse {
    PostResponse {
        id: post.id,
        user_id: post.user_id,
        title: post.title,
        content: post.content,
        is_draft: post.is_draft,
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
        user,
    }
}

fn paginated<T>(page: Page<T>) -> Paginated<T> {
    Paginated {
        current_page: page.page,
        per_page: page.per_page,
        total: page.total,
        last_page: page.last_page(),
        from: page.from(),
        to: page.to(),
        data: page.items,
    }
}

/// Owner summaries for a batch of posts, keyed by user id.
async fn owners(state: &AppState, posts: &[Post]) -> AppResult<HashMap<Uuid, OwnerSummary>> {
    let mut ids: Vec<Uuid> = posts.iter().map(|p| p.user_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let users = state.users.find_by_ids(&ids).await?;
    Ok(users
        .into_iter()
        .map(|u| (u.id, OwnerSummary { id: u.id, name: u.name }))
        .collect())
}

fn redirect_to_login(state: &AppState) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, state.login_path.as_str()))
        .finish()
}

/// GET /posts
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .posts
        .list_published(query.page.unwrap_or(1))
        .await?;

    let summaries = owners(&state, &page.items).await?;
    let page = page.map(|post| {
        let user = summaries.get(&post.user_id).cloned();
        post_response(post, user)
    });

    Ok(HttpResponse::Ok().json(paginated(page)))
}

/// GET /posts/{id}
pub async fn show(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.show(path.into_inner(), &identity.viewer()).await?;
    let owner = owners(&state, std::slice::from_ref(&post))
        .await?
        .remove(&post.user_id);

    Ok(HttpResponse::Ok().json(post_response(post, owner)))
}

/// GET /posts/create
pub async fn create_page(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> HttpResponse {
    if identity.0.is_none() {
        return redirect_to_login(&state);
    }

    HttpResponse::Ok().json(PostForm {
        id: None,
        title: String::new(),
        content: String::new(),
        is_draft: true,
        published_at: None,
    })
}

/// POST /posts
pub async fn store(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    let new_post = input(&body).into_new_post()?;
    let post = state.posts.create(identity.user_id, new_post).await?;

    tracing::info!(post_id = %post.id, user_id = %identity.user_id, "Post created");
    Ok(HttpResponse::Created().json(post_response(post, None)))
}

/// GET /posts/{id}/edit
pub async fn edit_page(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    if identity.0.is_none() {
        return Ok(redirect_to_login(&state));
    }

    let post = state
        .posts
        .find_owned(path.into_inner(), &identity.viewer())
        .await?;

    Ok(HttpResponse::Ok().json(PostForm {
        id: Some(post.id),
        title: post.title,
        content: post.content,
        is_draft: post.is_draft,
        published_at: post.published_at,
    }))
}

/// PUT /posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    let changes = input(&body).into_changes()?;
    let post = state
        .posts
        .update(path.into_inner(), &identity.viewer(), changes)
        .await?;

    tracing::info!(post_id = %post.id, user_id = %identity.user_id, "Post updated");
    Ok(HttpResponse::Ok().json(post_response(post, None)))
}

/// DELETE /posts/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.posts.delete(id, &identity.viewer()).await?;

    tracing::info!(post_id = %id, user_id = %identity.user_id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::{DateTime, TimeDelta, Utc};
    use serde_json::{Value, json};

    use scribe_core::domain::{NewPost, User};
    use scribe_core::ports::{BaseRepository, TokenService};
    use scribe_infra::{InMemoryPostRepository, InMemoryUserRepository, JwtConfig, JwtTokenService};

    use super::*;
    use crate::handlers::configure_routes;

    struct Fixture {
        state: AppState,
        posts: Arc<InMemoryPostRepository>,
        users: Arc<InMemoryUserRepository>,
        tokens: Arc<dyn TokenService>,
    }

    impl Fixture {
        fn new() -> Self {
            let posts = Arc::new(InMemoryPostRepository::new());
            let users = Arc::new(InMemoryUserRepository::new());
            let state = AppState::with_repositories(posts.clone(), users.clone(), "/login");
            let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig::default()));
            Self {
                state,
                posts,
                users,
                tokens,
            }
        }

        async fn user(&self, name: &str) -> (User, String) {
            let user = User::new(
                name.to_string(),
                format!("{}@example.com", name.to_lowercase()),
                "hash".to_string(),
            );
            let user = self.users.insert(user).await.unwrap();
            let token = self.tokens.issue(&user).unwrap().access_token;
            (user, token)
        }

        async fn post(
            &self,
            owner: &User,
            is_draft: bool,
            published_at: Option<DateTime<Utc>>,
            created_at: DateTime<Utc>,
        ) -> Post {
            let post = Post::new(
                owner.id,
                NewPost {
                    title: "A post".to_string(),
                    content: "Body".to_string(),
                    is_draft,
                    published_at,
                },
                created_at,
            );
            self.posts.insert(post).await.unwrap()
        }

        async fn call(&self, req: test::TestRequest) -> ServiceResponse {
            let app = test::init_service(
                App::new()
                    .app_data(web::Data::new(self.state.clone()))
                    .app_data(web::Data::new(self.tokens.clone()))
                    .configure(configure_routes),
            )
            .await;
            test::call_service(&app, req.to_request()).await
        }
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    #[actix_rt::test]
    async fn index_lists_twenty_published_posts_per_page() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let start = Utc::now() - TimeDelta::hours(1);
        for i in 0..25 {
            fx.post(&alice, false, None, start + TimeDelta::seconds(i)).await;
        }
        fx.post(&alice, true, None, start).await;

        let resp = fx.call(test::TestRequest::get().uri("/posts")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 20);
        assert_eq!(body["total"], 25);
        assert_eq!(body["per_page"], 20);
        assert_eq!(body["last_page"], 2);
        assert_eq!(body["data"][0]["user"]["name"], "Alice");

        let resp = fx.call(test::TestRequest::get().uri("/posts?page=2")).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["from"], 21);
        assert_eq!(body["to"], 25);
    }

    #[actix_rt::test]
    async fn index_treats_unusable_page_numbers_as_first_page() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let start = Utc::now() - TimeDelta::hours(1);
        for i in 0..3 {
            fx.post(&alice, false, None, start + TimeDelta::seconds(i)).await;
        }

        for uri in ["/posts?page=abc", "/posts?page=-1", "/posts?page=0"] {
            let resp = fx.call(test::TestRequest::get().uri(uri)).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["current_page"], 1, "{uri}");
            assert_eq!(body["data"].as_array().unwrap().len(), 3, "{uri}");
        }

        let resp = fx
            .call(test::TestRequest::get().uri("/posts?page=1000000000000000000"))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["data"].as_array().unwrap().is_empty());
        assert_eq!(body["total"], 3);
        assert_eq!(body["from"], Value::Null);
    }

    #[actix_rt::test]
    async fn index_hides_future_and_draft_posts() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let now = Utc::now();
        fx.post(&alice, false, Some(now + TimeDelta::days(1)), now).await;
        fx.post(&alice, true, Some(now - TimeDelta::days(1)), now).await;
        let visible = fx.post(&alice, false, Some(now - TimeDelta::days(1)), now).await;

        let resp = fx.call(test::TestRequest::get().uri("/posts")).await;
        let body: Value = test::read_body_json(resp).await;

        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["id"], visible.id.to_string());
    }

    #[actix_rt::test]
    async fn show_hides_drafts_from_everyone_but_the_owner() {
        let fx = Fixture::new();
        let (alice, alice_token) = fx.user("Alice").await;
        let (_, bob_token) = fx.user("Bob").await;
        let draft = fx.post(&alice, true, None, Utc::now()).await;
        let uri = format!("/posts/{}", draft.id);

        let guest = fx.call(test::TestRequest::get().uri(&uri)).await;
        assert_eq!(guest.status(), StatusCode::NOT_FOUND);

        let other = fx
            .call(test::TestRequest::get().uri(&uri).insert_header(bearer(&bob_token)))
            .await;
        assert_eq!(other.status(), StatusCode::NOT_FOUND);

        let owner = fx
            .call(test::TestRequest::get().uri(&uri).insert_header(bearer(&alice_token)))
            .await;
        assert_eq!(owner.status(), StatusCode::OK);
        let body: Value = test::read_body_json(owner).await;
        assert_eq!(body["user"]["id"], alice.id.to_string());
    }

    #[actix_rt::test]
    async fn hidden_and_missing_posts_look_the_same() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let draft = fx.post(&alice, true, None, Utc::now()).await;

        let hidden = fx
            .call(test::TestRequest::get().uri(&format!("/posts/{}", draft.id)))
            .await;
        let missing = fx
            .call(test::TestRequest::get().uri(&format!("/posts/{}", Uuid::now_v7())))
            .await;

        assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let hidden: Value = test::read_body_json(hidden).await;
        let missing: Value = test::read_body_json(missing).await;
        assert_eq!(hidden["title"], missing["title"]);
        assert_eq!(hidden.as_object().unwrap().len(), missing.as_object().unwrap().len());

        let malformed = fx.call(test::TestRequest::get().uri("/posts/not-a-uuid")).await;
        assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn scheduled_post_becomes_visible_after_publish_run() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let now = Utc::now();
        let scheduled = fx
            .post(&alice, true, Some(now - TimeDelta::minutes(1)), now)
            .await;
        let uri = format!("/posts/{}", scheduled.id);

        let before = fx.call(test::TestRequest::get().uri(&uri)).await;
        assert_eq!(before.status(), StatusCode::NOT_FOUND);

        let published = fx.state.posts.publish_due(Utc::now()).await.unwrap();
        assert_eq!(published, 1);

        let after = fx.call(test::TestRequest::get().uri(&uri)).await;
        assert_eq!(after.status(), StatusCode::OK);
        let body: Value = test::read_body_json(after).await;
        assert_eq!(body["is_draft"], false);
    }

    #[actix_rt::test]
    async fn guests_cannot_write() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let post = fx.post(&alice, false, None, Utc::now()).await;
        let uri = format!("/posts/{}", post.id);

        let create = fx
            .call(
                test::TestRequest::post()
                    .uri("/posts")
                    .set_json(json!({ "title": "T", "content": "C" })),
            )
            .await;
        assert_eq!(create.status(), StatusCode::UNAUTHORIZED);

        let update = fx
            .call(test::TestRequest::put().uri(&uri).set_json(json!({ "title": "X" })))
            .await;
        assert_eq!(update.status(), StatusCode::UNAUTHORIZED);

        let delete = fx.call(test::TestRequest::delete().uri(&uri)).await;
        assert_eq!(delete.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(fx.posts.len().await, 1);
    }

    #[actix_rt::test]
    async fn guests_are_redirected_from_forms() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let post = fx.post(&alice, false, None, Utc::now()).await;

        for uri in ["/posts/create".to_string(), format!("/posts/{}/edit", post.id)] {
            let resp = fx.call(test::TestRequest::get().uri(&uri)).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
        }
    }

    #[actix_rt::test]
    async fn create_page_returns_defaults() {
        let fx = Fixture::new();
        let (_, token) = fx.user("Alice").await;

        let resp = fx
            .call(test::TestRequest::get().uri("/posts/create").insert_header(bearer(&token)))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["is_draft"], true);
        assert_eq!(body["title"], "");
        assert!(body.get("id").is_none());
    }

    #[actix_rt::test]
    async fn store_assigns_the_authenticated_owner() {
        let fx = Fixture::new();
        let (alice, token) = fx.user("Alice").await;

        let resp = fx
            .call(
                test::TestRequest::post()
                    .uri("/posts")
                    .insert_header(bearer(&token))
                    .set_json(json!({
                        "title": "Hello",
                        "content": "World",
                        "user_id": Uuid::new_v4(),
                    })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user_id"], alice.id.to_string());
        assert_eq!(body["is_draft"], true);
        assert_eq!(body["published_at"], Value::Null);
    }

    #[actix_rt::test]
    async fn store_rejects_invalid_fields() {
        let fx = Fixture::new();
        let (_, token) = fx.user("Alice").await;

        let resp = fx
            .call(
                test::TestRequest::post()
                    .uri("/posts")
                    .insert_header(bearer(&token))
                    .set_json(json!({
                        "title": "x".repeat(256),
                        "is_draft": "invalid",
                        "published_at": "not-a-date",
                    })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        for field in ["title", "content", "is_draft", "published_at"] {
            assert!(body["errors"][field].is_array(), "missing error for {field}");
        }
        assert_eq!(fx.posts.len().await, 0);
    }

    #[actix_rt::test]
    async fn store_rejects_malformed_json() {
        let fx = Fixture::new();
        let (_, token) = fx.user("Alice").await;

        let resp = fx
            .call(
                test::TestRequest::post()
                    .uri("/posts")
                    .insert_header(bearer(&token))
                    .insert_header((header::CONTENT_TYPE, "application/json"))
                    .set_payload("{ not json"),
            )
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn edit_page_is_owner_only() {
        let fx = Fixture::new();
        let (alice, alice_token) = fx.user("Alice").await;
        let (_, bob_token) = fx.user("Bob").await;
        let post = fx.post(&alice, true, None, Utc::now()).await;
        let uri = format!("/posts/{}/edit", post.id);

        let other = fx
            .call(test::TestRequest::get().uri(&uri).insert_header(bearer(&bob_token)))
            .await;
        assert_eq!(other.status(), StatusCode::FORBIDDEN);

        let missing = fx
            .call(
                test::TestRequest::get()
                    .uri(&format!("/posts/{}/edit", Uuid::now_v7()))
                    .insert_header(bearer(&alice_token)),
            )
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let owner = fx
            .call(test::TestRequest::get().uri(&uri).insert_header(bearer(&alice_token)))
            .await;
        assert_eq!(owner.status(), StatusCode::OK);
        let body: Value = test::read_body_json(owner).await;
        assert_eq!(body["id"], post.id.to_string());
        assert_eq!(body["is_draft"], true);
    }

    #[actix_rt::test]
    async fn update_by_non_owner_is_forbidden_and_leaves_post_unchanged() {
        let fx = Fixture::new();
        let (alice, _) = fx.user("Alice").await;
        let (_, bob_token) = fx.user("Bob").await;
        let post = fx.post(&alice, false, None, Utc::now()).await;

        let resp = fx
            .call(
                test::TestRequest::put()
                    .uri(&format!("/posts/{}", post.id))
                    .insert_header(bearer(&bob_token))
                    .set_json(json!({ "title": "Hijacked" })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let stored = fx.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "A post");
    }

    #[actix_rt::test]
    async fn update_changes_only_supplied_fields() {
        let fx = Fixture::new();
        let (alice, token) = fx.user("Alice").await;
        let scheduled_for = Utc::now() + TimeDelta::days(1);
        let post = fx.post(&alice, true, Some(scheduled_for), Utc::now()).await;

        let resp = fx
            .call(
                test::TestRequest::put()
                    .uri(&format!("/posts/{}", post.id))
                    .insert_header(bearer(&token))
                    .set_json(json!({ "title": "Renamed", "published_at": null })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "Renamed");
        assert_eq!(body["content"], "Body");
        assert_eq!(body["is_draft"], true);
        assert_eq!(body["published_at"], Value::Null);
    }

    #[actix_rt::test]
    async fn update_validates_present_fields() {
        let fx = Fixture::new();
        let (alice, token) = fx.user("Alice").await;
        let post = fx.post(&alice, false, None, Utc::now()).await;

        let resp = fx
            .call(
                test::TestRequest::put()
                    .uri(&format!("/posts/{}", post.id))
                    .insert_header(bearer(&token))
                    .set_json(json!({ "title": "", "is_draft": "maybe" })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["errors"]["title"].is_array());
        assert!(body["errors"]["is_draft"].is_array());
        assert!(body["errors"].get("content").is_none());
    }

    #[actix_rt::test]
    async fn update_missing_post_is_not_found() {
        let fx = Fixture::new();
        let (_, token) = fx.user("Alice").await;

        let resp = fx
            .call(
                test::TestRequest::put()
                    .uri(&format!("/posts/{}", Uuid::now_v7()))
                    .insert_header(bearer(&token))
                    .set_json(json!({ "title": "X" })),
            )
            .await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn delete_is_owner_only() {
        let fx = Fixture::new();
        let (alice, alice_token) = fx.user("Alice").await;
        let (_, bob_token) = fx.user("Bob").await;
        let post = fx.post(&alice, false, None, Utc::now()).await;
        let uri = format!("/posts/{}", post.id);

        let other = fx
            .call(test::TestRequest::delete().uri(&uri).insert_header(bearer(&bob_token)))
            .await;
        assert_eq!(other.status(), StatusCode::FORBIDDEN);
        assert_eq!(fx.posts.len().await, 1);

        let owner = fx
            .call(test::TestRequest::delete().uri(&uri).insert_header(bearer(&alice_token)))
            .await;
        assert_eq!(owner.status(), StatusCode::NO_CONTENT);
        assert_eq!(fx.posts.len().await, 0);

        let again = fx
            .call(test::TestRequest::delete().uri(&uri).insert_header(bearer(&alice_token)))
            .await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }
}
