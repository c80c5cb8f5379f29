use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

// Primary keys keep the shape the frontend already knows: a fixed prefix
// followed by a slice of a v4 uuid's hex form.
fn prefixed_id(prefix: &str, hex_len: usize) -> String {
    let uuid = Uuid::new_v4();
    let hex = uuid.simple().to_string();
    format!("{}{}", prefix, &hex[..hex_len])
}

pub fn generate_user_id() -> String {
    prefixed_id("cm4user", 6)
}

pub fn generate_athlete_id() -> String {
    prefixed_id("cm4", 9)
}

pub fn generate_test_id() -> String {
    prefixed_id("cm4test", 6)
}

pub fn generate_performance_id() -> String {
    prefixed_id("cm4perf", 6)
}

pub fn generate_badge_id() -> String {
    prefixed_id("cm4badge", 5)
}

pub fn generate_notification_id() -> String {
    prefixed_id("cm4notif", 5)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Athlete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "gender", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "sport", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sport {
    Athletics,
    Swimming,
    Cycling,
    Weightlifting,
    Boxing,
    Wrestling,
    Badminton,
    Tennis,
    Football,
    Basketball,
}

/// Discipline category shared by athletes and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "discipline_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisciplineCategory {
    Sprints,
    MiddleDistance,
    LongDistance,
    Jumps,
    Throws,
    CombinedEvents,
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    IndividualMedley,
}

/// Which end of the value scale ranks better for a test. Time-based tests
/// are ascending-better, distance and weight tests descending-better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "ranking_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankingDirection {
    AscendingBetter,
    DescendingBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "performance_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceStatus {
    Pending,
    Verified,
    Flagged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "flag_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagReason {
    SuspiciousTiming,
    TechnicalViolation,
    InvalidVideo,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "badge_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeType {
    Performance,
    Milestone,
    Participation,
    Achievement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "notification_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    PerformanceVerified,
    PerformanceFlagged,
    BadgeEarned,
    RankChanged,
    SystemUpdate,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_email_verified: bool,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Athlete {
    pub id: String,
    pub user_id: String,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Test {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub category: DisciplineCategory,
    pub direction: RankingDirection,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Performance {
    pub id: String,
    pub test_id: String,
    pub athlete_id: String,
    pub value: f64,
    pub status: PerformanceStatus,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub flagged_by: Option<String>,
    pub flagged_at: Option<DateTime<Utc>>,
    pub flag_reason: Option<FlagReason>,
    pub flag_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub badge_type: BadgeType,
    pub icon: String,
    pub requirements: String,
    pub points: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Cached aggregate row, one per athlete. Never authoritative: the
/// statistics aggregator can always rebuild it from performances and
/// earned badges.
#[derive(Debug, Clone, FromRow)]
pub struct AthleteStats {
    pub athlete_id: String,
    pub total_performances: i32,
    pub verified_performances: i32,
    pub pending_performances: i32,
    pub flagged_performances: i32,
    pub total_badges: i32,
    pub total_points: i32,
    pub current_rank: i32,
    pub best_performances: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: String,
    pub athlete_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Token {
    pub id: i32,
    pub user_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Verified performance joined with its athlete's public summary, the
/// shape the leaderboard ranks over.
#[derive(Debug, Clone, FromRow)]
pub struct RankedPerformanceRow {
    pub athlete_id: String,
    pub first_name: String,
    pub last_name: String,
    pub state: String,
    pub district: String,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// One of an athlete's performances joined with its test, the shape the
/// statistics aggregator folds over.
#[derive(Debug, Clone, FromRow)]
pub struct AthletePerformanceRow {
    pub test_name: String,
    pub unit: String,
    pub direction: RankingDirection,
    pub value: f64,
    pub status: PerformanceStatus,
    pub created_at: DateTime<Utc>,
}

/// An earned badge joined with its point value.
#[derive(Debug, Clone, FromRow)]
pub struct EarnedBadgeRow {
    pub badge_id: String,
    pub points: i32,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn id_prefixes_and_lengths() {
        let cases = [
            (generate_user_id(), "cm4user", 13),
            (generate_athlete_id(), "cm4", 12),
            (generate_test_id(), "cm4test", 13),
            (generate_performance_id(), "cm4perf", 13),
            (generate_badge_id(), "cm4badge", 13),
            (generate_notification_id(), "cm4notif", 13),
        ];

        for (id, prefix, len) in cases {
            assert!(id.starts_with(prefix), "{} should start with {}", id, prefix);
            assert_eq!(id.len(), len, "{} should be {} chars", id, len);
        }
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(generate_performance_id(), generate_performance_id());
    }

    #[test]
    fn enums_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&PerformanceStatus::Pending).unwrap(),
            r#""PENDING""#
        );
        assert_eq!(
            serde_json::to_string(&FlagReason::SuspiciousTiming).unwrap(),
            r#""SUSPICIOUS_TIMING""#
        );
        assert_eq!(
            serde_json::to_string(&RankingDirection::AscendingBetter).unwrap(),
            r#""ASCENDING_BETTER""#
        );
    }
}
