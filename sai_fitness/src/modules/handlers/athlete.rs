use crate::{
    modules::stats::{AthleteStatsSnapshot, StatsAggregator},
    types::error::StoreError,
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use sai_fitness_libs::api::ApiResponse;
use sqlx::{postgres::Postgres, Pool};

/// Recomputes the athlete's statistics and writes the snapshot through to
/// the cache row before returning it.
pub async fn get_athlete_stats(
    Path(athlete_id): Path<String>,
    Extension(pool): Extension<Pool<Postgres>>,
) -> (StatusCode, Json<ApiResponse<AthleteStatsSnapshot>>) {
    match StatsAggregator::new(&pool).refresh(&athlete_id).await {
        Ok(snapshot) => (StatusCode::OK, Json(ApiResponse::ok(snapshot))),
        Err(StoreError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("athlete not found")),
        ),
        Err(e) => {
            tracing::error!("stats aggregation failed cause: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            )
        }
    }
}
