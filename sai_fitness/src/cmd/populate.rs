use crate::types::tables::{
    generate_athlete_id, generate_badge_id, generate_test_id, generate_user_id, BadgeType,
    DisciplineCategory, Gender, RankingDirection, Sport, UserRole,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use sai_fitness_libs::credentials;
use sqlx::{postgres::Postgres, Pool};
use std::env;

#[derive(Debug, Args)]
pub struct PopulateArgs {
    /// Also create the demo athlete account.
    #[arg(long)]
    with_demo_athlete: bool,
}

struct SeedTest {
    name: &'static str,
    description: &'static str,
    unit: &'static str,
    category: DisciplineCategory,
    direction: RankingDirection,
}

const SEED_TESTS: &[SeedTest] = &[
    SeedTest {
        name: "100m Sprint",
        description: "Standard 100-meter sprint race",
        unit: "seconds",
        category: DisciplineCategory::Sprints,
        direction: RankingDirection::AscendingBetter,
    },
    SeedTest {
        name: "200m Sprint",
        description: "200-meter sprint race",
        unit: "seconds",
        category: DisciplineCategory::Sprints,
        direction: RankingDirection::AscendingBetter,
    },
    SeedTest {
        name: "1500m Run",
        description: "1500-meter middle distance run",
        unit: "seconds",
        category: DisciplineCategory::MiddleDistance,
        direction: RankingDirection::AscendingBetter,
    },
    SeedTest {
        name: "Long Jump",
        description: "Standing or running long jump",
        unit: "meters",
        category: DisciplineCategory::Jumps,
        direction: RankingDirection::DescendingBetter,
    },
    SeedTest {
        name: "Shot Put",
        description: "Shot put throwing event",
        unit: "meters",
        category: DisciplineCategory::Throws,
        direction: RankingDirection::DescendingBetter,
    },
    SeedTest {
        name: "50m Freestyle",
        description: "Freestyle swimming 50 meters",
        unit: "seconds",
        category: DisciplineCategory::Freestyle,
        direction: RankingDirection::AscendingBetter,
    },
];

struct SeedBadge {
    name: &'static str,
    description: &'static str,
    badge_type: BadgeType,
    icon: &'static str,
    requirements: &'static str,
    points: i32,
}

const SEED_BADGES: &[SeedBadge] = &[
    SeedBadge {
        name: "Speed Demon",
        description: "Complete a 100m sprint under 12 seconds",
        badge_type: BadgeType::Performance,
        icon: "⚡",
        requirements: "Sprint 100m in under 12.00 seconds",
        points: 100,
    },
    SeedBadge {
        name: "Distance Runner",
        description: "Complete a 1500m run under 5 minutes",
        badge_type: BadgeType::Performance,
        icon: "🏃",
        requirements: "Complete 1500m in under 5:00",
        points: 150,
    },
    SeedBadge {
        name: "First Performance",
        description: "Submit your first performance",
        badge_type: BadgeType::Milestone,
        icon: "🎯",
        requirements: "Submit any performance for verification",
        points: 50,
    },
    SeedBadge {
        name: "Consistent Athlete",
        description: "Submit 10 verified performances",
        badge_type: BadgeType::Milestone,
        icon: "🔥",
        requirements: "Have 10 verified performances",
        points: 300,
    },
    SeedBadge {
        name: "Top Performer",
        description: "Achieve top 3 ranking in any test",
        badge_type: BadgeType::Achievement,
        icon: "🏆",
        requirements: "Rank in top 3 of any leaderboard",
        points: 500,
    },
];

/// Seeds the reference data a fresh deployment needs: the admin account,
/// the test catalogue and the badge catalogue. Re-running is safe; rows
/// that already exist are left alone.
pub async fn run(args: PopulateArgs) -> Result<()> {
    let database_url: String = env::var("DATABASE_URL").with_context(|| {
        let message = "DATABASE_URL must be configured.";
        tracing::error!(message);
        message
    })?;

    let pool: Pool<Postgres> = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .with_context(|| {
            let message = "Failed to create database connection pool.";
            tracing::error!(message);
            message
        })?;

    create_admin_user(&pool).await?;
    create_tests(&pool).await?;
    create_badges(&pool).await?;
    if args.with_demo_athlete {
        create_demo_athlete(&pool).await?;
    }

    tracing::info!("Sample data population completed.");

    Ok(())
}

async fn create_admin_user(pool: &Pool<Postgres>) -> Result<()> {
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        tracing::warn!(
            "ADMIN_PASSWORD environment variable is not set. Default value `admin123` will be used."
        );
        String::from("admin123")
    });
    let password_hash =
        credentials::hash_password(&password).context("failed to hash admin password")?;

    let result = sqlx::query(
        r#"
        INSERT INTO "users" ("id", "username", "email", "password_hash", "role", "is_email_verified")
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT ("email") DO NOTHING
        "#,
    )
    .bind(generate_user_id())
    .bind("admin")
    .bind("admin@saifitness.com")
    .bind(&password_hash)
    .bind(UserRole::Admin)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::info!("Admin user already exists.");
    } else {
        tracing::info!("Created admin user admin@saifitness.com");
    }

    Ok(())
}

async fn create_tests(pool: &Pool<Postgres>) -> Result<()> {
    for test in SEED_TESTS {
        let result = sqlx::query(
            r#"
            INSERT INTO "tests" ("id", "name", "description", "unit", "category", "direction")
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ("name") DO NOTHING
            "#,
        )
        .bind(generate_test_id())
        .bind(test.name)
        .bind(test.description)
        .bind(test.unit)
        .bind(test.category)
        .bind(test.direction)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::info!("Test already exists: {}", test.name);
        } else {
            tracing::info!("Created test: {}", test.name);
        }
    }

    Ok(())
}

async fn create_badges(pool: &Pool<Postgres>) -> Result<()> {
    for badge in SEED_BADGES {
        let result = sqlx::query(
            r#"
            INSERT INTO "badges" ("id", "name", "description", "badge_type", "icon", "requirements", "points")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ("name") DO NOTHING
            "#,
        )
        .bind(generate_badge_id())
        .bind(badge.name)
        .bind(badge.description)
        .bind(badge.badge_type)
        .bind(badge.icon)
        .bind(badge.requirements)
        .bind(badge.points)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::info!("Badge already exists: {}", badge.name);
        } else {
            tracing::info!("Created badge: {}", badge.name);
        }
    }

    Ok(())
}

async fn create_demo_athlete(pool: &Pool<Postgres>) -> Result<()> {
    let password_hash =
        credentials::hash_password("athlete123").context("failed to hash demo password")?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO "users" ("id", "username", "email", "password_hash", "role", "is_email_verified")
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT ("email") DO NOTHING
        "#,
    )
    .bind(generate_user_id())
    .bind("athlete_demo")
    .bind("athlete@example.com")
    .bind(&password_hash)
    .bind(UserRole::Athlete)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        tracing::info!("Demo athlete already exists.");
        tx.rollback().await?;
        return Ok(());
    }

    let user_id: String = sqlx::query_scalar(r#"SELECT "id" FROM "users" WHERE "email" = $1"#)
        .bind("athlete@example.com")
        .fetch_one(&mut tx)
        .await?;

    let athlete_id = generate_athlete_id();
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
    .bind("Demo")
    .bind("Athlete")
    .bind(NaiveDate::from_ymd_opt(1995, 1, 1).expect("valid date"))
    .bind(Gender::Male)
    .bind("+91-9876543210")
    .bind("Maharashtra")
    .bind("Mumbai")
    .bind("Mumbai, Maharashtra, India")
    .bind(Sport::Athletics)
    .bind(DisciplineCategory::Sprints)
    .execute(&mut tx)
    .await?;

    sqlx::query(r#"INSERT INTO "athlete_stats" ("athlete_id") VALUES ($1)"#)
        .bind(&athlete_id)
        .execute(&mut tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Created demo athlete athlete@example.com");

    Ok(())
}
