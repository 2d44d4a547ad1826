//! Authentication handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use scribe_core::domain::User;
use scribe_core::error::RepoError;
use scribe_core::ports::{PasswordService, TokenService};
use scribe_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn issue_token(token_service: &dyn TokenService, user: &User) -> AppResult<AuthResponse> {
    let issued = token_service
        .issue(user)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: issued.access_token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let name = req.name.trim();
    let email = req.email.trim();

    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.users.find_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User::new(name.to_string(), email.to_string(), password_hash);
    let saved_user = state.users.insert(user).await.map_err(|e| match e {
        RepoError::Constraint(_) => AppError::Conflict("Email already registered".to_string()),
        other => other.into(),
    })?;

    tracing::info!(user_id = %saved_user.id, "User registered");
    Ok(HttpResponse::Created().json(issue_token(token_service.get_ref().as_ref(), &saved_user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(req.email.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// GET /api/auth/me
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse {
        id: identity.user_id,
        email: identity.email,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use scribe_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};
    use serde_json::{Value, json};

    use super::*;
    use crate::handlers::configure_routes;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::in_memory("/login")))
                    .app_data(web::Data::new(
                        Arc::new(JwtTokenService::new(JwtConfig::default())) as Arc<dyn TokenService>,
                    ))
                    .app_data(web::Data::new(
                        Arc::new(Argon2PasswordService::default()) as Arc<dyn PasswordService>,
                    ))
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn register_request(email: &str) -> test::TestRequest {
        test::TestRequest::post().uri("/api/auth/register").set_json(json!({
            "name": "Alice",
            "email": email,
            "password": "correct horse",
        }))
    }

    #[actix_rt::test]
    async fn register_login_and_me() {
        let app = app!();

        let resp = test::call_service(&app, register_request("alice@example.com").to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "alice@example.com", "password": "correct horse" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let token = body["access_token"].as_str().unwrap().to_string();
        assert_eq!(body["token_type"], "Bearer");

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/auth/me")
                .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["email"], "alice@example.com");
    }

    #[actix_rt::test]
    async fn duplicate_email_conflicts() {
        let app = app!();

        let first = test::call_service(&app, register_request("bob@example.com").to_request()).await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = test::call_service(&app, register_request("bob@example.com").to_request()).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[actix_rt::test]
    async fn wrong_password_is_unauthorized() {
        let app = app!();
        test::call_service(&app, register_request("carol@example.com").to_request()).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "carol@example.com", "password": "wrong password" }))
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn short_password_is_rejected() {
        let app = app!();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({ "name": "Dan", "email": "dan@example.com", "password": "short" }))
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn me_requires_a_token() {
        let app = app!();

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/auth/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
