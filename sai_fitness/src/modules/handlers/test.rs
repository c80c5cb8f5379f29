use crate::{
    modules::auth::AuthUser,
    types::tables::{
        generate_performance_id, DisciplineCategory, Performance, PerformanceStatus,
        RankingDirection, Test,
    },
};
use axum::{extract::Extension, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use sai_fitness_libs::api::ApiResponse;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::Postgres, Pool};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub category: DisciplineCategory,
    pub direction: RankingDirection,
}

impl TestResponse {
    fn from_test(test: Test) -> Self {
        Self {
            id: test.id,
            name: test.name,
            description: test.description,
            unit: test.unit,
            category: test.category,
            direction: test.direction,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPerformancePayload {
    #[validate(length(min = 1, max = 20))]
    pub test_id: String,
    #[validate(range(min = 0.0))]
    pub value: f64,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub performance_id: String,
    pub status: PerformanceStatus,
    pub created_at: DateTime<Utc>,
}

/// Active tests, in the catalogue order the frontend renders.
pub async fn get_all_tests(
    Extension(pool): Extension<Pool<Postgres>>,
) -> (StatusCode, Json<ApiResponse<Vec<TestResponse>>>) {
    let tests = sqlx::query_as::<_, Test>(
        r#"SELECT * FROM "tests" WHERE "is_active" ORDER BY "category", "name""#,
    )
    .fetch_all(&pool)
    .await;

    match tests {
        Ok(tests) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                tests.into_iter().map(TestResponse::from_test).collect(),
            )),
        ),
        Err(e) => {
            tracing::error!("test listing failed cause: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            )
        }
    }
}

/// Athlete submission. Every new performance starts PENDING; only an
/// administrator moves it out of that state.
pub async fn submit_performance(
    AuthUser(user): AuthUser,
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<SubmitPerformancePayload>,
) -> (StatusCode, Json<ApiResponse<SubmissionResponse>>) {
    if let Err(rejection) = payload.validate() {
        tracing::error!("Validation error: {}", rejection);
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                format!("Validation error: [{}]", rejection).replace('\n', ", "),
            )),
        );
    }

    let athlete_id: Option<String> =
        match sqlx::query_scalar(r#"SELECT "id" FROM "athletes" WHERE "user_id" = $1"#)
            .bind(&user.id)
            .fetch_optional(&pool)
            .await
        {
            Ok(athlete_id) => athlete_id,
            Err(e) => {
                tracing::error!("athlete lookup failed cause: {:?}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error("unexpected error")),
                );
            }
        };
    let Some(athlete_id) = athlete_id else {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("no athlete profile for this account")),
        );
    };

    let test_exists: bool = match sqlx::query_scalar(
        r#"SELECT EXISTS(SELECT 1 FROM "tests" WHERE "id" = $1 AND "is_active")"#,
    )
    .bind(&payload.test_id)
    .fetch_one(&pool)
    .await
    {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("test lookup failed cause: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            );
        }
    };
    if !test_exists {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("test not found")),
        );
    }

    let performance = sqlx::query_as::<_, Performance>(
        r#"
        INSERT INTO "performances" ("id", "test_id", "athlete_id", "value", "video_url", "image_url")
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(generate_performance_id())
    .bind(&payload.test_id)
    .bind(&athlete_id)
    .bind(payload.value)
    .bind(&payload.video_url)
    .bind(&payload.image_url)
    .fetch_one(&pool)
    .await;

    match performance {
        Ok(performance) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok_with_message(
                SubmissionResponse {
                    performance_id: performance.id,
                    status: performance.status,
                    created_at: performance.created_at,
                },
                "Performance submitted for verification",
            )),
        ),
        Err(e) => {
            tracing::error!("performance insert failed cause: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn negative_value_is_rejected() {
        let payload = SubmitPerformancePayload {
            test_id: String::from("cm4test000001"),
            value: -1.0,
            video_url: None,
            image_url: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn well_formed_submission_passes() {
        let payload = SubmitPerformancePayload {
            test_id: String::from("cm4test000001"),
            value: 11.2,
            video_url: Some(String::from("https://media.example.com/run.mp4")),
            image_url: None,
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn malformed_video_url_is_rejected() {
        let payload = SubmitPerformancePayload {
            test_id: String::from("cm4test000001"),
            value: 11.2,
            video_url: Some(String::from("not a url")),
            image_url: None,
        };
        assert!(payload.validate().is_err());
    }
}
