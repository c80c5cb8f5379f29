pub mod admin;
pub mod athlete;
pub mod auth;
pub mod leaderboard;
pub mod notification;
pub mod test;

use axum::{extract::Extension, http::StatusCode};
use sqlx::{postgres::Postgres, Pool};

pub async fn liveness(Extension(pool): Extension<Pool<Postgres>>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Ready once the schema is in place; an unmigrated database is reachable
/// but cannot serve requests.
pub async fn readiness(Extension(pool): Extension<Pool<Postgres>>) -> StatusCode {
    match sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "tests""#)
        .fetch_one(&pool)
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
