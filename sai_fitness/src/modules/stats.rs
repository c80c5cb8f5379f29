use crate::types::{
    error::StoreError,
    tables::{AthletePerformanceRow, AthleteStats, EarnedBadgeRow, PerformanceStatus, RankingDirection},
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use serde_json::json;
use sqlx::{postgres::Postgres, Pool};
use std::collections::HashMap;

/// How many of the athlete's latest submissions the snapshot carries.
pub const RECENT_PERFORMANCES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct PersonalBest {
    pub test_name: String,
    pub best_value: f64,
    pub unit: String,
    pub achieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentPerformance {
    pub test_name: String,
    pub value: f64,
    pub status: PerformanceStatus,
    pub created_at: DateTime<Utc>,
}

/// Derived per-athlete aggregate. Reconstructible at any time from the
/// performance and badge tables; the persisted copy is only a cache.
#[derive(Debug, Serialize)]
pub struct AthleteStatsSnapshot {
    pub total_performances: i32,
    pub verified_performances: i32,
    pub pending_performances: i32,
    pub flagged_performances: i32,
    pub total_badges: i32,
    pub total_points: i32,
    pub current_rank: i32,
    pub personal_bests: Vec<PersonalBest>,
    pub recent_performances: Vec<RecentPerformance>,
}

pub struct StatsAggregator<'a> {
    pool: &'a Pool<Postgres>,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(pool: &'a Pool<Postgres>) -> Self {
        StatsAggregator { pool }
    }

    /// Recomputes the athlete's statistics from scratch. An athlete with
    /// no performances gets zero-valued stats, not an error.
    pub async fn compute(&self, athlete_id: &str) -> Result<AthleteStatsSnapshot, StoreError> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM "athletes" WHERE "id" = $1)"#)
                .bind(athlete_id)
                .fetch_one(self.pool)
                .await?;
        if !exists {
            return Err(StoreError::not_found("athlete", athlete_id));
        }

        let performances = sqlx::query_as::<_, AthletePerformanceRow>(
            r#"
            SELECT
                "t"."name" AS "test_name",
                "t"."unit",
                "t"."direction",
                "p"."value",
                "p"."status",
                "p"."created_at"
            FROM "performances" AS "p"
            JOIN "tests" AS "t" ON "t"."id" = "p"."test_id"
            WHERE "p"."athlete_id" = $1
            ORDER BY "p"."created_at"
            "#,
        )
        .bind(athlete_id)
        .fetch_all(self.pool)
        .await?;

        let badges = sqlx::query_as::<_, EarnedBadgeRow>(
            r#"
            SELECT "ab"."badge_id", "b"."points"
            FROM "athlete_badges" AS "ab"
            JOIN "badges" AS "b" ON "b"."id" = "ab"."badge_id"
            WHERE "ab"."athlete_id" = $1
            "#,
        )
        .bind(athlete_id)
        .fetch_all(self.pool)
        .await?;

        // current_rank is maintained by a separate reconciliation pass;
        // carry whatever the persisted snapshot holds.
        let cached = sqlx::query_as::<_, AthleteStats>(
            r#"SELECT * FROM "athlete_stats" WHERE "athlete_id" = $1"#,
        )
        .bind(athlete_id)
        .fetch_optional(self.pool)
        .await?;
        let current_rank = cached.map(|stats| stats.current_rank).unwrap_or(0);

        Ok(aggregate(&performances, &badges, current_rank))
    }

    /// Persists the snapshot into the cache row. Staleness between
    /// write-throughs is acceptable; recomputation is the source of truth.
    pub async fn write_through(
        &self,
        athlete_id: &str,
        snapshot: &AthleteStatsSnapshot,
    ) -> Result<(), StoreError> {
        let best_performances = json!(snapshot
            .personal_bests
            .iter()
            .map(|best| {
                (
                    best.test_name.clone(),
                    json!({
                        "value": best.best_value,
                        "unit": best.unit,
                        "achieved_at": best.achieved_at,
                    }),
                )
            })
            .collect::<HashMap<_, _>>());

        sqlx::query(
            r#"
            INSERT INTO "athlete_stats" (
                "athlete_id",
                "total_performances",
                "verified_performances",
                "pending_performances",
                "flagged_performances",
                "total_badges",
                "total_points",
                "current_rank",
                "best_performances",
                "updated_at"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT ("athlete_id") DO UPDATE SET (
                "total_performances",
                "verified_performances",
                "pending_performances",
                "flagged_performances",
                "total_badges",
                "total_points",
                "current_rank",
                "best_performances",
                "updated_at"
            ) = (
                EXCLUDED."total_performances",
                EXCLUDED."verified_performances",
                EXCLUDED."pending_performances",
                EXCLUDED."flagged_performances",
                EXCLUDED."total_badges",
                EXCLUDED."total_points",
                EXCLUDED."current_rank",
                EXCLUDED."best_performances",
                EXCLUDED."updated_at"
            )
            "#,
        )
        .bind(athlete_id)
        .bind(snapshot.total_performances)
        .bind(snapshot.verified_performances)
        .bind(snapshot.pending_performances)
        .bind(snapshot.flagged_performances)
        .bind(snapshot.total_badges)
        .bind(snapshot.total_points)
        .bind(snapshot.current_rank)
        .bind(best_performances)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Recompute and persist in one step.
    pub async fn refresh(&self, athlete_id: &str) -> Result<AthleteStatsSnapshot, StoreError> {
        let snapshot = self.compute(athlete_id).await?;
        self.write_through(athlete_id, &snapshot).await?;

        Ok(snapshot)
    }
}

fn aggregate(
    performances: &[AthletePerformanceRow],
    badges: &[EarnedBadgeRow],
    current_rank: i32,
) -> AthleteStatsSnapshot {
    let by_status = performances.iter().map(|p| p.status).counts();
    let count_of = |status: PerformanceStatus| -> i32 {
        by_status.get(&status).copied().unwrap_or(0) as i32
    };

    AthleteStatsSnapshot {
        total_performances: performances.len() as i32,
        verified_performances: count_of(PerformanceStatus::Verified),
        pending_performances: count_of(PerformanceStatus::Pending),
        flagged_performances: count_of(PerformanceStatus::Flagged),
        total_badges: badges.len() as i32,
        total_points: badges.iter().map(|b| b.points).sum(),
        current_rank,
        personal_bests: personal_bests(performances),
        recent_performances: recent_performances(performances),
    }
}

/// Best verified value per distinct test. `performances` arrives in
/// ascending creation order, and only a strictly better value displaces
/// the incumbent, so ties resolve to the earliest submission.
fn personal_bests(performances: &[AthletePerformanceRow]) -> Vec<PersonalBest> {
    let mut bests: HashMap<&str, &AthletePerformanceRow> = HashMap::new();
    for row in performances {
        if row.status != PerformanceStatus::Verified {
            continue;
        }
        match bests.get(row.test_name.as_str()) {
            Some(incumbent) if !beats(row, *incumbent) => {}
            _ => {
                bests.insert(&row.test_name, row);
            }
        }
    }

    bests
        .into_values()
        .sorted_by(|a, b| a.test_name.cmp(&b.test_name))
        .map(|row| PersonalBest {
            test_name: row.test_name.clone(),
            best_value: row.value,
            unit: row.unit.clone(),
            achieved_at: row.created_at,
        })
        .collect()
}

fn beats(challenger: &AthletePerformanceRow, incumbent: &AthletePerformanceRow) -> bool {
    match challenger.direction {
        RankingDirection::AscendingBetter => challenger.value < incumbent.value,
        RankingDirection::DescendingBetter => challenger.value > incumbent.value,
    }
}

/// The latest submissions regardless of status, newest first.
fn recent_performances(performances: &[AthletePerformanceRow]) -> Vec<RecentPerformance> {
    performances
        .iter()
        .rev()
        .take(RECENT_PERFORMANCES)
        .map(|row| RecentPerformance {
            test_name: row.test_name.clone(),
            value: row.value,
            status: row.status,
            created_at: row.created_at,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    fn performance(
        test_name: &str,
        value: f64,
        status: PerformanceStatus,
        submitted_secs_ago: i64,
    ) -> AthletePerformanceRow {
        performance_with_direction(
            test_name,
            value,
            status,
            submitted_secs_ago,
            RankingDirection::AscendingBetter,
        )
    }

    fn performance_with_direction(
        test_name: &str,
        value: f64,
        status: PerformanceStatus,
        submitted_secs_ago: i64,
        direction: RankingDirection,
    ) -> AthletePerformanceRow {
        AthletePerformanceRow {
            test_name: String::from(test_name),
            unit: String::from("seconds"),
            direction,
            value,
            status,
            created_at: Utc::now() - Duration::seconds(submitted_secs_ago),
        }
    }

    #[test]
    fn no_performances_yield_zero_stats() {
        let snapshot = aggregate(&[], &[], 0);
        assert_eq!(snapshot.total_performances, 0);
        assert_eq!(snapshot.verified_performances, 0);
        assert_eq!(snapshot.total_points, 0);
        assert!(snapshot.personal_bests.is_empty());
        assert!(snapshot.recent_performances.is_empty());
    }

    #[test]
    fn counts_split_by_status() {
        // 1 verified, 1 pending, 1 flagged
        let rows = vec![
            performance("Test X", 5.0, PerformanceStatus::Verified, 30),
            performance("Test X", 4.8, PerformanceStatus::Pending, 20),
            performance("Test X", 4.5, PerformanceStatus::Flagged, 10),
        ];
        let snapshot = aggregate(&rows, &[], 0);

        assert_eq!(snapshot.total_performances, 3);
        assert_eq!(snapshot.verified_performances, 1);
        assert_eq!(snapshot.pending_performances, 1);
        assert_eq!(snapshot.flagged_performances, 1);

        // only the verified one counts toward the best
        assert_eq!(snapshot.personal_bests.len(), 1);
        assert_eq!(snapshot.personal_bests[0].test_name, "Test X");
        assert_eq!(snapshot.personal_bests[0].best_value, 5.0);
    }

    #[test]
    fn badge_points_sum_without_double_counting() {
        let badges = vec![
            EarnedBadgeRow {
                badge_id: String::from("cm4badge00001"),
                points: 10,
            },
            EarnedBadgeRow {
                badge_id: String::from("cm4badge00002"),
                points: 50,
            },
        ];
        let snapshot = aggregate(&[], &badges, 0);
        assert_eq!(snapshot.total_badges, 2);
        assert_eq!(snapshot.total_points, 60);
    }

    #[test]
    fn personal_best_is_minimum_verified_value() {
        let rows = vec![
            performance("100m Sprint", 11.4, PerformanceStatus::Verified, 40),
            performance("100m Sprint", 11.1, PerformanceStatus::Verified, 30),
            performance("100m Sprint", 10.9, PerformanceStatus::Pending, 20),
            performance("Long Jump", 11.8, PerformanceStatus::Verified, 10),
        ];
        let snapshot = aggregate(&rows, &[], 0);

        assert_eq!(snapshot.personal_bests.len(), 2);
        let sprint = &snapshot.personal_bests[0];
        assert_eq!(sprint.test_name, "100m Sprint");
        assert_eq!(sprint.best_value, 11.1);
    }

    #[test]
    fn personal_best_tie_keeps_earliest() {
        let rows = vec![
            performance("100m Sprint", 11.2, PerformanceStatus::Verified, 40),
            performance("100m Sprint", 11.2, PerformanceStatus::Verified, 10),
        ];
        let snapshot = aggregate(&rows, &[], 0);
        let earliest = Utc::now() - Duration::seconds(40);
        let achieved = snapshot.personal_bests[0].achieved_at;
        assert!((achieved - earliest).num_seconds().abs() <= 1);
    }

    #[test]
    fn descending_better_picks_maximum() {
        let rows = vec![
            performance_with_direction(
                "Long Jump",
                5.9,
                PerformanceStatus::Verified,
                30,
                RankingDirection::DescendingBetter,
            ),
            performance_with_direction(
                "Long Jump",
                6.3,
                PerformanceStatus::Verified,
                20,
                RankingDirection::DescendingBetter,
            ),
        ];
        let snapshot = aggregate(&rows, &[], 0);
        assert_eq!(snapshot.personal_bests[0].best_value, 6.3);
    }

    #[test]
    fn recent_keeps_the_latest_five_newest_first() {
        let rows: Vec<_> = (0..7i64)
            .map(|i| performance("Test X", 10.0 + i as f64, PerformanceStatus::Pending, 70 - i))
            .collect();
        let snapshot = aggregate(&rows, &[], 0);

        assert_eq!(snapshot.recent_performances.len(), RECENT_PERFORMANCES);
        // newest submission carries the highest value in this setup
        assert_eq!(snapshot.recent_performances[0].value, 16.0);
        assert_eq!(snapshot.recent_performances[4].value, 12.0);
    }

    #[test]
    fn current_rank_is_carried_not_computed() {
        let snapshot = aggregate(&[], &[], 42);
        assert_eq!(snapshot.current_rank, 42);
    }
}
