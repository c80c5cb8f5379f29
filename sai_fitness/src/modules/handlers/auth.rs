use crate::{
    modules::auth::{issue_token, AuthUser},
    types::tables::{
        generate_athlete_id, generate_user_id, Athlete, DisciplineCategory, Gender, Sport, User,
        UserRole,
    },
};
use axum::{extract::Extension, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use sai_fitness_libs::{api::ApiResponse, credentials};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::{postgres::Postgres, Pool};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[validate(length(min = 1, max = 15))]
    pub phone: String,
    #[validate(length(min = 1, max = 50))]
    pub state: String,
    #[validate(length(min = 1, max = 50))]
    pub district: String,
    #[validate(length(min = 1))]
    pub address: String,
    pub sport: Sport,
    pub category: DisciplineCategory,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordPayload {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(length(equal = 64))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl UserInfo {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct AthleteProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub phone: String,
    pub state: String,
    pub district: String,
    pub address: String,
    pub sport: Sport,
    pub category: DisciplineCategory,
    pub profile_image_url: Option<String>,
    pub is_active: bool,
}

impl AthleteProfile {
    fn from_athlete(athlete: Athlete) -> Self {
        Self {
            id: athlete.id,
            first_name: athlete.first_name,
            last_name: athlete.last_name,
            date_of_birth: athlete.date_of_birth,
            gender: athlete.gender,
            phone: athlete.phone,
            state: athlete.state,
            district: athlete.district,
            address: athlete.address,
            sport: athlete.sport,
            category: athlete.category,
            profile_image_url: athlete.profile_image_url,
            is_active: athlete.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserInfo,
    pub athlete_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserInfo,
    pub token: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserInfo,
    pub athlete: Option<AthleteProfile>,
}

#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub reset_token: String,
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

/// Creates the user account, the athlete profile and the empty stats row
/// in one transaction. A half-registered athlete must not exist.
pub async fn register(
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<RegisterPayload>,
) -> (StatusCode, Json<ApiResponse<RegisterResponse>>) {
    if let Err(rejection) = payload.validate() {
        return validation_error(rejection);
    }

    let taken: bool =
        match sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM "users" WHERE "email" = $1)"#)
            .bind(&payload.email)
            .fetch_one(&pool)
            .await
        {
            Ok(taken) => taken,
            Err(e) => {
                tracing::error!("email lookup failed cause: {:?}", e);
                return unexpected_error();
            }
        };
    if taken {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Email already exists")),
        );
    }

    let password_hash = match credentials::hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing failed cause: {:?}", e);
            return unexpected_error();
        }
    };

    let user_id = generate_user_id();
    let athlete_id = generate_athlete_id();

    let result = async {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO "users" ("id", "username", "email", "password_hash", "role")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(&payload.email)
        .bind(&payload.email)
        .bind(&password_hash)
        .bind(UserRole::Athlete)
        .fetch_one(&mut tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO "athletes" (
                "id", "user_id", "first_name", "last_name", "date_of_birth", "gender",
                "phone", "state", "district", "address", "sport", "category"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&athlete_id)
        .bind(&user_id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.date_of_birth)
        .bind(payload.gender)
        .bind(&payload.phone)
        .bind(&payload.state)
        .bind(&payload.district)
        .bind(&payload.address)
        .bind(payload.sport)
        .bind(payload.category)
        .execute(&mut tx)
        .await?;

        // every athlete owns exactly one stats row from the moment the
        // profile exists
        sqlx::query(r#"INSERT INTO "athlete_stats" ("athlete_id") VALUES ($1)"#)
            .bind(&athlete_id)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;

        Ok::<User, sqlx::Error>(user)
    }
    .await;

    match result {
        Ok(user) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok_with_message(
                RegisterResponse {
                    user: UserInfo::from_user(&user),
                    athlete_id,
                },
                "User created successfully",
            )),
        ),
        Err(e) => {
            tracing::error!("registration failed cause: {:?}", e);
            unexpected_error()
        }
    }
}

pub async fn login(
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<LoginPayload>,
) -> (StatusCode, Json<ApiResponse<LoginResponse>>) {
    if let Err(rejection) = payload.validate() {
        return validation_error(rejection);
    }

    let user = match sqlx::query_as::<_, User>(r#"SELECT * FROM "users" WHERE "email" = $1"#)
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("user lookup failed cause: {:?}", e);
            return unexpected_error();
        }
    };

    // the same message for unknown email and wrong password
    let Some(user) = user else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Invalid email or password")),
        );
    };
    if !credentials::verify_password(&payload.password, &user.password_hash) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Invalid email or password")),
        );
    }

    match issue_token(&pool, &user.id).await {
        Ok(token) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message(
                LoginResponse {
                    user: UserInfo::from_user(&user),
                    token: token.token,
                },
                "Login successful",
            )),
        ),
        Err(e) => {
            tracing::error!("token issuance failed cause: {:?}", e);
            unexpected_error()
        }
    }
}

pub async fn get_profile(
    AuthUser(user): AuthUser,
    Extension(pool): Extension<Pool<Postgres>>,
) -> (StatusCode, Json<ApiResponse<ProfileResponse>>) {
    let athlete =
        match sqlx::query_as::<_, Athlete>(r#"SELECT * FROM "athletes" WHERE "user_id" = $1"#)
            .bind(&user.id)
            .fetch_optional(&pool)
            .await
        {
            Ok(athlete) => athlete,
            Err(e) => {
                tracing::error!("athlete lookup failed cause: {:?}", e);
                return unexpected_error();
            }
        };

    (
        StatusCode::OK,
        Json(ApiResponse::ok(ProfileResponse {
            user: UserInfo::from_user(&user),
            athlete: athlete.map(AthleteProfile::from_athlete),
        })),
    )
}

/// Issues a password-reset token. The token is returned in the response;
/// delivering it out of band is the caller's concern.
pub async fn forgot_password(
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> (StatusCode, Json<ApiResponse<ResetTokenResponse>>) {
    if let Err(rejection) = payload.validate() {
        return validation_error(rejection);
    }

    let reset_token = credentials::generate_token();
    let expires = credentials::reset_token_expiry(Utc::now());

    let result = sqlx::query(
        r#"
        UPDATE "users"
        SET "password_reset_token" = $1, "password_reset_expires" = $2, "updated_at" = NOW()
        WHERE "email" = $3
        "#,
    )
    .bind(&reset_token)
    .bind(expires)
    .bind(&payload.email)
    .execute(&pool)
    .await;

    match result {
        Ok(result) if result.rows_affected() == 0 => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("user not found")),
        ),
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message(
                ResetTokenResponse { reset_token },
                "Password reset token issued",
            )),
        ),
        Err(e) => {
            tracing::error!("reset token issuance failed cause: {:?}", e);
            unexpected_error()
        }
    }
}

pub async fn reset_password(
    Extension(pool): Extension<Pool<Postgres>>,
    Json(payload): Json<ResetPasswordPayload>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    if let Err(rejection) = payload.validate() {
        return validation_error(rejection);
    }

    let user = match sqlx::query_as::<_, User>(
        r#"SELECT * FROM "users" WHERE "password_reset_token" = $1"#,
    )
    .bind(&payload.token)
    .fetch_optional(&pool)
    .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("reset token lookup failed cause: {:?}", e);
            return unexpected_error();
        }
    };

    let Some(user) = user else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("invalid reset token")),
        );
    };

    let expired = user
        .password_reset_expires
        .map(|expires| credentials::reset_token_expired(expires, Utc::now()))
        .unwrap_or(true);
    if expired {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("reset token expired")),
        );
    }

    let password_hash = match credentials::hash_password(&payload.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing failed cause: {:?}", e);
            return unexpected_error();
        }
    };

    let result = sqlx::query(
        r#"
        UPDATE "users"
        SET "password_hash" = $1,
            "password_reset_token" = NULL,
            "password_reset_expires" = NULL,
            "updated_at" = NOW()
        WHERE "id" = $2
        "#,
    )
    .bind(&password_hash)
    .bind(&user.id)
    .execute(&pool)
    .await;

    match result {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message((), "Password updated")),
        ),
        Err(e) => {
            tracing::error!("password update failed cause: {:?}", e);
            unexpected_error()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_payload_validation() {
        let payload = RegisterPayload {
            email: String::from("athlete@example.com"),
            password: String::from("athlete123"),
            first_name: String::from("Demo"),
            last_name: String::from("Athlete"),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(),
            gender: Gender::Male,
            phone: String::from("+91-9876543210"),
            state: String::from("Maharashtra"),
            district: String::from("Mumbai"),
            address: String::from("Mumbai, Maharashtra, India"),
            sport: Sport::Athletics,
            category: DisciplineCategory::Sprints,
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn register_rejects_short_password_and_bad_email() {
        let mut payload = RegisterPayload {
            email: String::from("not-an-email"),
            password: String::from("short"),
            first_name: String::from("Demo"),
            last_name: String::from("Athlete"),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(),
            gender: Gender::Male,
            phone: String::from("+91-9876543210"),
            state: String::from("Maharashtra"),
            district: String::from("Mumbai"),
            address: String::from("Mumbai"),
            sport: Sport::Athletics,
            category: DisciplineCategory::Sprints,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));

        payload.email = String::from("athlete@example.com");
        payload.password = String::from("athlete123");
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn payload_deserializes_screaming_snake_enums() {
        let payload: RegisterPayload = serde_json::from_str(
            r#"{
                "email": "athlete@example.com",
                "password": "athlete123",
                "first_name": "Demo",
                "last_name": "Athlete",
                "date_of_birth": "1995-01-01",
                "gender": "MALE",
                "phone": "+91-9876543210",
                "state": "Maharashtra",
                "district": "Mumbai",
                "address": "Mumbai",
                "sport": "ATHLETICS",
                "category": "SPRINTS"
            }"#,
        )
        .unwrap();
        assert_eq!(payload.gender, Gender::Male);
        assert_eq!(payload.sport, Sport::Athletics);
    }
}
