//! History analytics.
//!
//! Pure projections over a user's sessions plus `HistoryService`, which
//! fetches from a store and degrades to empty results when it fails.
//! Days are UTC calendar days of `created_at`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::warn;

use crate::store::{SessionQuery, SessionStore};
use crate::timer::{Clock, SystemClock};
use crate::types::{ChartPoint, FocusSession, UserStats};

/// How far back the current streak is searched.
pub const STREAK_WINDOW_DAYS: u32 = 30;

/// Default number of chart points.
pub const DEFAULT_CHART_DAYS: u32 = 30;

// ============================================================================
// Projections
// ============================================================================

/// Aggregates `sessions` into `UserStats` as of `today`.
pub fn compute_user_stats(sessions: &[FocusSession], today: NaiveDate) -> UserStats {
    let completed: Vec<&FocusSession> = sessions.iter().filter(|s| s.completed).collect();

    let total_sessions = completed.len() as u32;
    let total_focus_time: u32 = completed.iter().map(|s| s.actual_minutes).sum();
    let average_session_length = if total_sessions > 0 {
        f64::from(total_focus_time) / f64::from(total_sessions)
    } else {
        0.0
    };
    let completion_rate = if sessions.is_empty() {
        0.0
    } else {
        completed.len() as f64 / sessions.len() as f64 * 100.0
    };

    let streak_days = current_streak(sessions, today);
    let longest = longest_streak(sessions).max(streak_days);

    UserStats {
        total_sessions,
        total_focus_time,
        average_session_length,
        completion_rate,
        streak_days,
        longest_streak: longest,
    }
}

/// Consecutive days with a completed session, counting back from `today`.
///
/// An empty `today` does not break the streak since the day is not over.
/// Only the last `STREAK_WINDOW_DAYS` days are examined.
pub fn current_streak(sessions: &[FocusSession], today: NaiveDate) -> u32 {
    let days = completed_days(sessions);
    let mut streak = 0;
    let mut date = today;

    for i in 0..STREAK_WINDOW_DAYS {
        if days.contains(&date) {
            streak += 1;
        } else if i > 0 {
            break;
        }
        match date.checked_sub_days(Days::new(1)) {
            Some(previous) => date = previous,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive days with a completed session.
pub fn longest_streak(sessions: &[FocusSession]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in completed_days(sessions) {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

/// One point per day for the `days` days ending at `today`, oldest first.
///
/// Only completed sessions are counted.
pub fn chart_data(sessions: &[FocusSession], days: u32, today: NaiveDate) -> Vec<ChartPoint> {
    let mut per_day: BTreeMap<NaiveDate, (u32, u32)> = BTreeMap::new();
    for session in sessions.iter().filter(|s| s.completed) {
        let entry = per_day.entry(session.day()).or_default();
        entry.0 += 1;
        entry.1 += session.actual_minutes;
    }

    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .map(|date| {
            let (sessions, focus_time) = per_day.get(&date).copied().unwrap_or_default();
            ChartPoint {
                date,
                sessions,
                focus_time,
            }
        })
        .collect()
}

/// Zero-valued chart for the `days` days ending at `today`.
pub fn empty_chart(days: u32, today: NaiveDate) -> Vec<ChartPoint> {
    chart_data(&[], days, today)
}

fn completed_days(sessions: &[FocusSession]) -> BTreeSet<NaiveDate> {
    sessions
        .iter()
        .filter(|s| s.completed)
        .map(FocusSession::day)
        .collect()
}

// ============================================================================
// HistoryService
// ============================================================================

/// Store-backed history queries that never fail.
///
/// Store errors are logged and replaced by empty history, zeroed stats or
/// a zeroed chart.
pub struct HistoryService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: SessionStore> HistoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Most recent sessions, newest first.
    pub async fn sessions(&self, user_id: &str, limit: Option<usize>) -> Vec<FocusSession> {
        let mut query = SessionQuery::for_user(user_id);
        query.limit = limit;
        self.fetch(query, "history").await
    }

    pub async fn stats(&self, user_id: &str) -> UserStats {
        let sessions = self
            .fetch(SessionQuery::for_user(user_id).unlimited(), "stats")
            .await;
        compute_user_stats(&sessions, self.today())
    }

    pub async fn chart(&self, user_id: &str, days: u32) -> Vec<ChartPoint> {
        let today = self.today();
        let sessions = self
            .fetch(SessionQuery::for_user(user_id).unlimited(), "chart data")
            .await;
        chart_data(&sessions, days, today)
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    async fn fetch(&self, query: SessionQuery, what: &str) -> Vec<FocusSession> {
        match self.store.query(query).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Failed to load {}: {}", what, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimerMode;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, hour, 0, 0).unwrap()
    }

    fn session(d: u32, actual: u32, completed: bool) -> FocusSession {
        let created_at = at(d, 10);
        FocusSession {
            id: format!("s-{}-{}", d, actual),
            user_id: "u1".to_string(),
            planned_minutes: 25,
            actual_minutes: actual,
            mode: TimerMode::Pomodoro,
            started_at: created_at - Duration::minutes(i64::from(actual)),
            ended_at: created_at,
            completed,
            created_at,
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn test_empty_history() {
            assert_eq!(compute_user_stats(&[], day(10)), UserStats::default());
        }

        #[test]
        fn test_totals_and_rates() {
            let sessions = vec![
                session(8, 25, true),
                session(9, 50, true),
                session(9, 10, false),
                session(10, 30, true),
            ];

            let stats = compute_user_stats(&sessions, day(10));

            assert_eq!(stats.total_sessions, 3);
            assert_eq!(stats.total_focus_time, 105);
            assert!((stats.average_session_length - 35.0).abs() < f64::EPSILON);
            assert!((stats.completion_rate - 75.0).abs() < f64::EPSILON);
            assert_eq!(stats.streak_days, 3);
            assert_eq!(stats.longest_streak, 3);
        }

        #[test]
        fn test_incomplete_sessions_do_not_count_for_focus_time() {
            let stats = compute_user_stats(&[session(10, 40, false)], day(10));
            assert_eq!(stats.total_sessions, 0);
            assert_eq!(stats.total_focus_time, 0);
            assert_eq!(stats.completion_rate, 0.0);
        }
    }

    mod streak_tests {
        use super::*;

        #[test]
        fn test_missing_today_does_not_break_streak() {
            let sessions = vec![session(8, 25, true), session(9, 25, true)];
            assert_eq!(current_streak(&sessions, day(10)), 2);
        }

        #[test]
        fn test_gap_breaks_streak() {
            let sessions = vec![session(6, 25, true), session(8, 25, true), session(9, 25, true)];
            assert_eq!(current_streak(&sessions, day(9)), 2);
        }

        #[test]
        fn test_incomplete_day_breaks_streak() {
            let sessions = vec![session(8, 25, true), session(9, 25, false), session(10, 25, true)];
            assert_eq!(current_streak(&sessions, day(10)), 1);
        }

        #[test]
        fn test_streak_capped_by_window() {
            let sessions: Vec<FocusSession> = (0..40)
                .map(|back| {
                    let mut s = session(31, 25, true);
                    s.created_at -= Duration::days(back);
                    s
                })
                .collect();
            assert_eq!(current_streak(&sessions, day(31)), STREAK_WINDOW_DAYS);
            assert_eq!(longest_streak(&sessions), 40);
        }

        #[test]
        fn test_longest_streak_finds_older_run() {
            let sessions = vec![
                session(1, 25, true),
                session(2, 25, true),
                session(3, 25, true),
                session(3, 25, true),
                session(4, 25, true),
                session(9, 25, true),
                session(10, 25, true),
            ];

            let stats = compute_user_stats(&sessions, day(10));
            assert_eq!(stats.streak_days, 2);
            assert_eq!(stats.longest_streak, 4);
        }
    }

    mod chart_tests {
        use super::*;

        #[test]
        fn test_chart_has_one_point_per_day_oldest_first() {
            let sessions = vec![
                session(8, 25, true),
                session(10, 50, true),
                session(10, 30, true),
                session(10, 15, false),
            ];

            let chart = chart_data(&sessions, 3, day(10));

            assert_eq!(
                chart,
                vec![
                    ChartPoint { date: day(8), sessions: 1, focus_time: 25 },
                    ChartPoint { date: day(9), sessions: 0, focus_time: 0 },
                    ChartPoint { date: day(10), sessions: 2, focus_time: 80 },
                ]
            );
        }

        #[test]
        fn test_sessions_outside_window_ignored() {
            let chart = chart_data(&[session(1, 25, true)], 7, day(10));
            assert_eq!(chart.len(), 7);
            assert!(chart.iter().all(|p| p.sessions == 0));
        }

        #[test]
        fn test_empty_chart() {
            let chart = empty_chart(30, day(31));
            assert_eq!(chart.len(), 30);
            assert_eq!(chart[0].date, day(2));
            assert_eq!(chart[29].date, day(31));
        }
    }

    mod history_service_tests {
        use super::*;
        use crate::store::MockSessionStore;
        use crate::timer::MockClock;

        fn service(store: Arc<MockSessionStore>) -> HistoryService<MockSessionStore> {
            HistoryService::with_clock(store, Arc::new(MockClock::new(at(10, 18))))
        }

        #[tokio::test]
        async fn test_failing_store_yields_empty_projections() {
            let store = Arc::new(MockSessionStore::new());
            store.set_should_fail(true);
            let history = service(store);

            assert!(history.sessions("u1", Some(50)).await.is_empty());
            assert_eq!(history.stats("u1").await, UserStats::default());

            let chart = history.chart("u1", 7).await;
            assert_eq!(chart.len(), 7);
            assert_eq!(chart[6].date, day(10));
            assert!(chart.iter().all(|p| p.sessions == 0 && p.focus_time == 0));
        }

        #[tokio::test]
        async fn test_stats_from_store() {
            let store = Arc::new(MockSessionStore::new());
            store.insert(session(9, 25, true));
            store.insert(session(10, 50, true));
            let history = service(store);

            let stats = history.stats("u1").await;
            assert_eq!(stats.total_sessions, 2);
            assert_eq!(stats.streak_days, 2);

            let recent = history.sessions("u1", Some(1)).await;
            assert_eq!(recent.len(), 1);
            assert_eq!(recent[0].actual_minutes, 50);
        }
    }
}
