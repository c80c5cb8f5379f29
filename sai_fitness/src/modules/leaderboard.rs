use crate::types::{
    error::StoreError,
    tables::{PerformanceStatus, RankedPerformanceRow, RankingDirection, Test},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::Postgres, Pool};

/// Rankings are truncated to the podium page the frontend renders.
pub const LEADERBOARD_SIZE: usize = 20;

#[derive(Debug, Serialize)]
pub struct AthleteSummary {
    pub first_name: String,
    pub last_name: String,
    pub state: String,
    pub district: String,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub athlete: AthleteSummary,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TestInfo {
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Serialize)]
pub struct Leaderboard {
    pub test_info: TestInfo,
    pub entries: Vec<LeaderboardEntry>,
    /// Number of entries returned, i.e. the length of `entries`.
    pub count: usize,
    /// Full count of verified performances for the test, before
    /// truncation to `LEADERBOARD_SIZE`.
    pub total: usize,
}

/// Ranks verified performances for a single test. Pure read: the ranker
/// never writes anything back.
pub struct LeaderboardRanker<'a> {
    pool: &'a Pool<Postgres>,
}

impl<'a> LeaderboardRanker<'a> {
    pub fn new(pool: &'a Pool<Postgres>) -> Self {
        LeaderboardRanker { pool }
    }

    pub async fn rank(&self, test_id: &str) -> Result<Leaderboard, StoreError> {
        let test = sqlx::query_as::<_, Test>(r#"SELECT * FROM "tests" WHERE "id" = $1"#)
            .bind(test_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("test", test_id))?;

        // Rows come back in submission order; the sort below is stable, so
        // equal values keep that order.
        let rows = sqlx::query_as::<_, RankedPerformanceRow>(
            r#"
            SELECT
                "p"."athlete_id",
                "a"."first_name",
                "a"."last_name",
                "a"."state",
                "a"."district",
                "p"."value",
                "p"."created_at"
            FROM "performances" AS "p"
            JOIN "athletes" AS "a" ON "a"."id" = "p"."athlete_id"
            WHERE "p"."test_id" = $1 AND "p"."status" = $2
            ORDER BY "p"."created_at"
            "#,
        )
        .bind(test_id)
        .bind(PerformanceStatus::Verified)
        .fetch_all(self.pool)
        .await?;

        Ok(build_leaderboard(&test, rows))
    }
}

fn build_leaderboard(test: &Test, mut rows: Vec<RankedPerformanceRow>) -> Leaderboard {
    sort_best_first(&mut rows, test.direction);

    let total = rows.len();
    let entries: Vec<LeaderboardEntry> = rows
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i as u32 + 1,
            athlete: AthleteSummary {
                first_name: row.first_name,
                last_name: row.last_name,
                state: row.state,
                district: row.district,
            },
            value: row.value,
            created_at: row.created_at,
        })
        .collect();

    Leaderboard {
        test_info: TestInfo {
            name: test.name.clone(),
            unit: test.unit.clone(),
        },
        count: entries.len(),
        entries,
        total,
    }
}

fn sort_best_first(rows: &mut [RankedPerformanceRow], direction: RankingDirection) {
    match direction {
        RankingDirection::AscendingBetter => rows.sort_by(|a, b| a.value.total_cmp(&b.value)),
        RankingDirection::DescendingBetter => rows.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::tables::DisciplineCategory;
    use chrono::Duration;

    fn sprint_test(direction: RankingDirection) -> Test {
        Test {
            id: String::from("cm4test000001"),
            name: String::from("100m Sprint"),
            description: String::from("Standard 100-meter sprint race"),
            unit: String::from("seconds"),
            category: DisciplineCategory::Sprints,
            direction,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn row(athlete: &str, value: f64, submitted_secs_ago: i64) -> RankedPerformanceRow {
        RankedPerformanceRow {
            athlete_id: format!("cm4{:0>9}", athlete),
            first_name: String::from(athlete),
            last_name: String::from("Athlete"),
            state: String::from("Maharashtra"),
            district: String::from("Mumbai"),
            value,
            created_at: Utc::now() - Duration::seconds(submitted_secs_ago),
        }
    }

    #[test]
    fn empty_test_yields_empty_leaderboard() {
        let board = build_leaderboard(&sprint_test(RankingDirection::AscendingBetter), vec![]);
        assert!(board.entries.is_empty());
        assert_eq!(board.count, 0);
        assert_eq!(board.total, 0);
        assert_eq!(board.test_info.name, "100m Sprint");
    }

    #[test]
    fn ascending_better_ranks_lowest_first() {
        // submission order: A (11.2), B (10.9), C (11.2)
        let rows = vec![row("A", 11.2, 30), row("B", 10.9, 20), row("C", 11.2, 10)];
        let board = build_leaderboard(&sprint_test(RankingDirection::AscendingBetter), rows);

        assert_eq!(board.total, 3);
        assert_eq!(board.count, 3);
        let order: Vec<(u32, &str, f64)> = board
            .entries
            .iter()
            .map(|e| (e.rank, e.athlete.first_name.as_str(), e.value))
            .collect();
        assert_eq!(
            order,
            vec![(1, "B", 10.9), (2, "A", 11.2), (3, "C", 11.2)],
            "ties must keep submission order"
        );
    }

    #[test]
    fn descending_better_ranks_highest_first() {
        let rows = vec![row("A", 5.95, 30), row("B", 6.4, 20), row("C", 6.1, 10)];
        let board = build_leaderboard(&sprint_test(RankingDirection::DescendingBetter), rows);

        let order: Vec<&str> = board
            .entries
            .iter()
            .map(|e| e.athlete.first_name.as_str())
            .collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn ranks_are_strictly_increasing_from_one() {
        let rows = (0..5i64).map(|i| row("X", 10.0 + i as f64, i)).collect();
        let board = build_leaderboard(&sprint_test(RankingDirection::AscendingBetter), rows);
        let ranks: Vec<u32> = board.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn truncates_to_leaderboard_size_but_reports_full_total() {
        let rows = (0..25i64).map(|i| row("X", 10.0 + i as f64, i)).collect();
        let board = build_leaderboard(&sprint_test(RankingDirection::AscendingBetter), rows);

        assert_eq!(board.entries.len(), LEADERBOARD_SIZE);
        assert_eq!(board.count, LEADERBOARD_SIZE);
        assert_eq!(board.total, 25);
        assert_eq!(board.entries.last().unwrap().rank, LEADERBOARD_SIZE as u32);
    }
}
