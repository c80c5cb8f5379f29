use crate::types::tables::{Token, User, UserRole};
use axum::{async_trait, extract::FromRequestParts, http::StatusCode, Json};
use http::request::Parts;
use sai_fitness_libs::{api::ApiResponse, credentials};
use sqlx::{postgres::Postgres, Pool};

type AuthRejection = (StatusCode, Json<ApiResponse<()>>);

/// Explicit role check, used wherever an endpoint is admin-only.
pub fn is_admin(user: &User) -> bool {
    user.role == UserRole::Admin
}

/// Stores a fresh opaque bearer token for the user and returns it.
pub async fn issue_token(pool: &Pool<Postgres>, user_id: &str) -> Result<Token, sqlx::Error> {
    let token = credentials::generate_token();
    sqlx::query_as::<_, Token>(
        r#"INSERT INTO "tokens" ("user_id", "token") VALUES ($1, $2) RETURNING *"#,
    )
    .bind(user_id)
    .bind(token)
    .fetch_one(pool)
    .await
}

/// Resolves a bearer token to its user, if any.
pub async fn token_bearer(pool: &Pool<Postgres>, token: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT "users".*
        FROM "tokens"
        JOIN "users" ON "users"."id" = "tokens"."user_id"
        WHERE "tokens"."token" = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(String::from)
}

/// Extractor for any authenticated user.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("missing bearer token")),
        ))?;

        let pool = match parts.extensions.get::<Pool<Postgres>>() {
            Some(pool) => pool.clone(),
            None => {
                tracing::error!("database pool extension is not installed");
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error("unexpected error")),
                ));
            }
        };

        let user = match token_bearer(&pool, &token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("token lookup failed cause: {:?}", e);
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error("unexpected error")),
                ));
            }
        };

        match user {
            Some(user) => Ok(AuthUser(user)),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("invalid token")),
            )),
        }
    }
}

/// Extractor for admin-only endpoints.
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !is_admin(&user) {
            return Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("admin role required")),
            ));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    fn user(role: UserRole) -> User {
        User {
            id: String::from("cm4user000001"),
            username: String::from("admin"),
            email: String::from("admin@saifitness.com"),
            password_hash: String::new(),
            role,
            is_email_verified: true,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_check() {
        assert!(is_admin(&user(UserRole::Admin)));
        assert!(!is_admin(&user(UserRole::Athlete)));
    }
}
