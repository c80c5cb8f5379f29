use crate::{
    modules::auth::AuthUser,
    types::tables::{Notification, NotificationType},
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use sai_fitness_libs::api::ApiResponse;
use serde::Serialize;
use sqlx::{postgres::Postgres, Pool};

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationResponse {
    fn from_notification(notification: Notification) -> Self {
        Self {
            id: notification.id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

async fn athlete_id_for(
    pool: &Pool<Postgres>,
    user_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT "id" FROM "athletes" WHERE "user_id" = $1"#)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// The authenticated athlete's notifications, newest first.
pub async fn get_notifications(
    AuthUser(user): AuthUser,
    Extension(pool): Extension<Pool<Postgres>>,
) -> (StatusCode, Json<ApiResponse<Vec<NotificationResponse>>>) {
    let athlete_id = match athlete_id_for(&pool, &user.id).await {
        Ok(Some(athlete_id)) => athlete_id,
        Ok(None) => {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("no athlete profile for this account")),
            )
        }
        Err(e) => {
            tracing::error!("athlete lookup failed cause: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            );
        }
    };

    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM "notifications"
        WHERE "athlete_id" = $1
        ORDER BY "created_at" DESC
        "#,
    )
    .bind(&athlete_id)
    .fetch_all(&pool)
    .await;

    match notifications {
        Ok(notifications) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                notifications
                    .into_iter()
                    .map(NotificationResponse::from_notification)
                    .collect(),
            )),
        ),
        Err(e) => {
            tracing::error!("notification listing failed cause: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            )
        }
    }
}

/// Marks one of the athlete's own notifications as read.
pub async fn mark_notification_read(
    AuthUser(user): AuthUser,
    Path(notification_id): Path<String>,
    Extension(pool): Extension<Pool<Postgres>>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let athlete_id = match athlete_id_for(&pool, &user.id).await {
        Ok(Some(athlete_id)) => athlete_id,
        Ok(None) => {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("no athlete profile for this account")),
            )
        }
        Err(e) => {
            tracing::error!("athlete lookup failed cause: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            );
        }
    };

    let result = sqlx::query(
        r#"
        UPDATE "notifications"
        SET "is_read" = TRUE
        WHERE "id" = $1 AND "athlete_id" = $2
        "#,
    )
    .bind(&notification_id)
    .bind(&athlete_id)
    .execute(&pool)
    .await;

    match result {
        Ok(result) if result.rows_affected() == 0 => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("notification not found")),
        ),
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message((), "Notification marked as read")),
        ),
        Err(e) => {
            tracing::error!("notification update failed cause: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("unexpected error")),
            )
        }
    }
}
