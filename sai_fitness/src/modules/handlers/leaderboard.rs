use crate::{
    modules::leaderboard::{Leaderboard, LeaderboardRanker},
    types::error::StoreError,
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use sai_fitness_libs::api::ApiResponse;
use sqlx::{postgres::Postgres, Pool};

pub async fn get_leaderboard(
    Path(test_id): Path<String>,
    Extension(pool): Extension<Pool<Postgres>>,
) -> (StatusCode, Json<ApiResponse<Leaderboard>>) {
    match LeaderboardRanker::new(&pool).rank(&test_id).await {
        Ok(board) => (StatusCode::OK, Json(ApiResponse::ok(board))),
        Err(StoreError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("test not found")),
        ),
        Err(e) => {
            tracing::error!("leaderboard query failed cause: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            )
        }
    }
}
