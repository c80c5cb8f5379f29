use crate::{
    modules::{auth::AdminUser, notify::notify, stats::StatsAggregator},
    types::tables::{Badge, FlagReason, NotificationType, PerformanceStatus},
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use sai_fitness_libs::api::ApiResponse;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::Postgres, FromRow, Pool};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPayload {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FlagPayload {
    pub reason: FlagReason,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AwardBadgePayload {
    #[validate(length(min = 1, max = 20))]
    pub badge_id: String,
    #[validate(length(min = 1, max = 20))]
    pub performance_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub performance_id: String,
    pub status: PerformanceStatus,
}

#[derive(Debug, Serialize)]
pub struct AwardResponse {
    pub badge_name: String,
    pub points: i32,
}

/// The slice of a performance the review handlers need for notifications.
#[derive(Debug, FromRow)]
struct PerformanceContext {
    athlete_id: String,
    value: f64,
    unit: String,
    test_name: String,
}

fn validation_error<T: Serialize>(
    rejection: validator::ValidationErrors,
) -> (StatusCode, Json<ApiResponse<T>>) {
    tracing::error!("Validation error: {}", rejection);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(
            format!("Validation error: [{}]", rejection).replace('\n', ", "),
        )),
    )
}

fn unexpected_error<T: Serialize>() -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("unexpected error")),
    )
}

async fn performance_context(
    pool: &Pool<Postgres>,
    performance_id: &str,
) -> Result<Option<PerformanceContext>, sqlx::Error> {
    sqlx::query_as::<_, PerformanceContext>(
        r#"
        SELECT "p"."athlete_id", "p"."value", "t"."unit", "t"."name" AS "test_name"
        FROM "performances" AS "p"
        JOIN "tests" AS "t" ON "t"."id" = "p"."test_id"
        WHERE "p"."id" = $1
        "#,
    )
    .bind(performance_id)
    .fetch_optional(pool)
    .await
}

/// Marks a performance VERIFIED, records who verified it, notifies the
/// athlete and refreshes the cached statistics.
pub async fn verify_performance(
    AdminUser(admin): AdminUser,
    Path(performance_id): Path<String>,
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<VerifyPayload>,
) -> (StatusCode, Json<ApiResponse<ReviewResponse>>) {
    if let Err(rejection) = payload.validate() {
        return validation_error(rejection);
    }

    let context = match performance_context(&pool, &performance_id).await {
        Ok(Some(context)) => context,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("performance not found")),
            )
        }
        Err(e) => {
            tracing::error!("performance lookup failed cause: {:?}", e);
            return unexpected_error();
        }
    };

    let result = sqlx::query(
        r#"
        UPDATE "performances"
        SET "status" = $1,
            "verified_by" = $2,
            "verified_at" = NOW(),
            "verification_notes" = $3,
            "updated_at" = NOW()
        WHERE "id" = $4
        "#,
    )
    .bind(PerformanceStatus::Verified)
    .bind(&admin.id)
    .bind(&payload.notes)
    .bind(&performance_id)
    .execute(&pool)
    .await;
    if let Err(e) = result {
        tracing::error!("performance verification failed cause: {:?}", e);
        return unexpected_error();
    }

    let message = format!(
        "Your {} result of {} {} was verified",
        context.test_name, context.value, context.unit
    );
    if let Err(e) = notify(
        &pool,
        &context.athlete_id,
        NotificationType::PerformanceVerified,
        "Performance Verified",
        message,
    )
    .await
    {
        tracing::error!("notification insert failed cause: {:?}", e);
        return unexpected_error();
    }

    if let Err(e) = StatsAggregator::new(&pool).refresh(&context.athlete_id).await {
        tracing::error!("stats refresh failed cause: {:?}", e);
        return unexpected_error();
    }

    (
        StatusCode::OK,
        Json(ApiResponse::ok_with_message(
            ReviewResponse {
                performance_id,
                status: PerformanceStatus::Verified,
            },
            "Performance verified",
        )),
    )
}

/// Marks a performance FLAGGED with a reason. Re-flagging an already
/// reviewed performance is allowed; the label is not a strict state
/// machine.
pub async fn flag_performance(
    AdminUser(admin): AdminUser,
    Path(performance_id): Path<String>,
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<FlagPayload>,
) -> (StatusCode, Json<ApiResponse<ReviewResponse>>) {
    if let Err(rejection) = payload.validate() {
        return validation_error(rejection);
    }

    let context = match performance_context(&pool, &performance_id).await {
        Ok(Some(context)) => context,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("performance not found")),
            )
        }
        Err(e) => {
            tracing::error!("performance lookup failed cause: {:?}", e);
            return unexpected_error();
        }
    };

    let result = sqlx::query(
        r#"
        UPDATE "performances"
        SET "status" = $1,
            "flagged_by" = $2,
            "flagged_at" = NOW(),
            "flag_reason" = $3,
            "flag_notes" = $4,
            "updated_at" = NOW()
        WHERE "id" = $5
        "#,
    )
    .bind(PerformanceStatus::Flagged)
    .bind(&admin.id)
    .bind(payload.reason)
    .bind(&payload.notes)
    .bind(&performance_id)
    .execute(&pool)
    .await;
    if let Err(e) = result {
        tracing::error!("performance flagging failed cause: {:?}", e);
        return unexpected_error();
    }

    let message = format!(
        "Your {} result of {} {} was flagged for review",
        context.test_name, context.value, context.unit
    );
    if let Err(e) = notify(
        &pool,
        &context.athlete_id,
        NotificationType::PerformanceFlagged,
        "Performance Flagged",
        message,
    )
    .await
    {
        tracing::error!("notification insert failed cause: {:?}", e);
        return unexpected_error();
    }

    if let Err(e) = StatsAggregator::new(&pool).refresh(&context.athlete_id).await {
        tracing::error!("stats refresh failed cause: {:?}", e);
        return unexpected_error();
    }

    (
        StatusCode::OK,
        Json(ApiResponse::ok_with_message(
            ReviewResponse {
                performance_id,
                status: PerformanceStatus::Flagged,
            },
            "Performance flagged",
        )),
    )
}

/// Awards a badge to an athlete. The (athlete, badge) pair is unique; a
/// repeated award is rejected, never double-counted.
pub async fn award_badge(
    AdminUser(_admin): AdminUser,
    Path(athlete_id): Path<String>,
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<AwardBadgePayload>,
) -> (StatusCode, Json<ApiResponse<AwardResponse>>) {
    if let Err(rejection) = payload.validate() {
        return validation_error(rejection);
    }

    let athlete_exists: bool =
        match sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM "athletes" WHERE "id" = $1)"#)
            .bind(&athlete_id)
            .fetch_one(&pool)
            .await
        {
            Ok(exists) => exists,
            Err(e) => {
                tracing::error!("athlete lookup failed cause: {:?}", e);
                return unexpected_error();
            }
        };
    if !athlete_exists {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("athlete not found")),
        );
    }

    let badge = match sqlx::query_as::<_, Badge>(r#"SELECT * FROM "badges" WHERE "id" = $1"#)
        .bind(&payload.badge_id)
        .fetch_optional(&pool)
        .await
    {
        Ok(Some(badge)) => badge,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("badge not found")),
            )
        }
        Err(e) => {
            tracing::error!("badge lookup failed cause: {:?}", e);
            return unexpected_error();
        }
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO "athlete_badges" ("athlete_id", "badge_id", "performance_id")
        VALUES ($1, $2, $3)
        ON CONFLICT ("athlete_id", "badge_id") DO NOTHING
        "#,
    )
    .bind(&athlete_id)
    .bind(&badge.id)
    .bind(&payload.performance_id)
    .execute(&pool)
    .await;
    match inserted {
        Ok(result) if result.rows_affected() == 0 => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("badge already earned")),
            )
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("badge award failed cause: {:?}", e);
            return unexpected_error();
        }
    }

    let message = format!("You earned the {} badge ({} points)", badge.name, badge.points);
    if let Err(e) = notify(
        &pool,
        &athlete_id,
        NotificationType::BadgeEarned,
        "Badge Earned",
        message,
    )
    .await
    {
        tracing::error!("notification insert failed cause: {:?}", e);
        return unexpected_error();
    }

    if let Err(e) = StatsAggregator::new(&pool).refresh(&athlete_id).await {
        tracing::error!("stats refresh failed cause: {:?}", e);
        return unexpected_error();
    }

    (
        StatusCode::OK,
        Json(ApiResponse::ok_with_message(
            AwardResponse {
                badge_name: badge.name,
                points: badge.points,
            },
            "Badge awarded",
        )),
    )
}
