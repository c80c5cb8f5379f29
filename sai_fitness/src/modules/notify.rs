use crate::types::tables::{generate_notification_id, NotificationType};
use sqlx::{postgres::Postgres, Pool};

/// Queues an in-app notification for the athlete. Delivery beyond the
/// notification table (e-mail, push) is not this service's concern.
pub async fn notify(
    pool: &Pool<Postgres>,
    athlete_id: &str,
    notification_type: NotificationType,
    title: impl ToString,
    message: impl ToString,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "notifications" ("id", "athlete_id", "notification_type", "title", "message")
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(generate_notification_id())
    .bind(athlete_id)
    .bind(notification_type)
    .bind(title.to_string())
    .bind(message.to_string())
    .execute(pool)
    .await?;

    Ok(())
}
