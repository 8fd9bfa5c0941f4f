//! Dashboard state: goal, current plan and progress

use chrono::{Local, NaiveDate};
use fitstore::{AuthSession, Backend, NewWorkout, ProgressMetric};
use tracing::{debug, info, warn};

use crate::coach::Coach;
use crate::domain::{FitnessLevel, TrainingType, WorkoutPlan};
use crate::schedule::split_plan_lines;

/// Summary numbers computed from progress metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    /// Value of the most recent metric
    pub latest_progress: Option<f64>,
    pub metric_count: usize,
    /// Consecutive days with a metric, ending today or yesterday
    pub streak_days: u32,
}

impl DashboardStats {
    /// Compute stats from metrics sorted oldest first
    pub fn from_metrics(metrics: &[ProgressMetric], today: NaiveDate) -> Self {
        let mut days: Vec<NaiveDate> = metrics.iter().filter_map(ProgressMetric::day).collect();
        days.sort_unstable();
        days.dedup();

        let mut streak_days = 0;
        if let Some(&last) = days.last()
            && (today - last).num_days() <= 1
        {
            let mut expected = last;
            for day in days.iter().rev() {
                if *day != expected {
                    break;
                }
                streak_days += 1;
                match expected.pred_opt() {
                    Some(prev) => expected = prev,
                    None => break,
                }
            }
        }

        Self {
            latest_progress: metrics.last().map(|m| m.value),
            metric_count: metrics.len(),
            streak_days,
        }
    }
}

/// Result of loading a user's records; `None` marks a query that failed
#[derive(Debug, Clone, Default)]
pub struct UserData {
    pub progress: Option<Vec<ProgressMetric>>,
    pub workout_plan: Option<Option<WorkoutPlan>>,
}

/// Query progress metrics and the latest incomplete workout
///
/// Failures are logged and reported as `None` in the matching field.
pub async fn fetch_user_data(backend: &dyn Backend, session: &AuthSession) -> UserData {
    let user_id = session.user_id();
    debug!(%user_id, "fetch_user_data: called");

    let progress = match backend.progress_metrics(session, user_id).await {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!(error = %e, "Failed to load progress metrics");
            None
        }
    };

    let workout_plan = match backend.latest_incomplete_workout(session, user_id).await {
        Ok(Some(record)) => {
            info!(name = %record.name, "Loaded current workout");
            let exercises = record.exercise_list();
            Some(Some(WorkoutPlan::new(record.name, exercises)))
        }
        Ok(None) => {
            debug!("fetch_user_data: no incomplete workout");
            Some(None)
        }
        Err(e) => {
            warn!(error = %e, "Failed to load current workout");
            None
        }
    };

    UserData { progress, workout_plan }
}

/// Generate a plan for `goal` and record it as a new workout
///
/// Returns `None` if generation or the insert fails; the failure is logged.
pub async fn plan_for_goal(
    goal: TrainingType,
    coach: &dyn Coach,
    backend: &dyn Backend,
    session: &AuthSession,
) -> Option<WorkoutPlan> {
    debug!(%goal, "plan_for_goal: called");
    let text = match coach.generate_workout_plan(goal.as_str(), FitnessLevel::Intermediate).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Error generating workout plan");
            return None;
        }
    };

    let workout = NewWorkout::new(session.user_id(), goal.workout_name());
    match backend.insert_workout(session, workout).await {
        Ok(record) => {
            let exercises = split_plan_lines(&text);
            info!(name = %record.name, exercise_count = exercises.len(), "New workout plan");
            Some(WorkoutPlan::new(record.name, exercises))
        }
        Err(e) => {
            warn!(error = %e, "Error saving workout plan");
            None
        }
    }
}

/// Everything the dashboard screen shows
#[derive(Debug, Default)]
pub struct Dashboard {
    pub user_goal: TrainingType,
    pub workout_plan: Option<WorkoutPlan>,
    pub progress: Vec<ProgressMetric>,
    pub show_chat: bool,
    pub stats: DashboardStats,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load progress metrics and the latest incomplete workout
    ///
    /// Does nothing without a session. Query failures are logged and leave
    /// the corresponding state as it was.
    pub async fn load_user_data(&mut self, backend: &dyn Backend, session: Option<&AuthSession>) {
        let Some(session) = session else {
            debug!("Dashboard::load_user_data: no session");
            return;
        };
        let data = fetch_user_data(backend, session).await;
        self.apply_user_data(data);
    }

    /// Apply loaded records, keeping current state for failed queries
    pub fn apply_user_data(&mut self, data: UserData) {
        if let Some(progress) = data.progress {
            self.progress = progress;
            self.stats = DashboardStats::from_metrics(&self.progress, Local::now().date_naive());
        }
        if let Some(Some(plan)) = data.workout_plan {
            self.workout_plan = Some(plan);
        }
    }

    /// Switch the training goal and generate a fresh plan for it
    ///
    /// The goal changes immediately. The plan only changes if generation and
    /// the workout insert both succeed; otherwise the failure is logged.
    pub async fn change_goal(
        &mut self,
        goal: TrainingType,
        coach: &dyn Coach,
        backend: &dyn Backend,
        session: Option<&AuthSession>,
    ) {
        debug!(%goal, "Dashboard::change_goal: called");
        self.user_goal = goal;

        let Some(session) = session else {
            warn!("Goal change without a session, plan not generated");
            return;
        };
        if let Some(plan) = plan_for_goal(goal, coach, backend, session).await {
            self.workout_plan = Some(plan);
        }
    }

    pub fn toggle_chat(&mut self) {
        self.show_chat = !self.show_chat;
        debug!(show_chat = self.show_chat, "Dashboard::toggle_chat: called");
    }

    /// Progress values oldest first, for charting
    pub fn progress_values(&self) -> Vec<f64> {
        self.progress.iter().map(|m| m.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::{CoachCall, ScriptedCoach};
    use fitstore::{MemoryBackend, WorkoutRecord};

    async fn signed_in() -> (MemoryBackend, AuthSession) {
        let backend = MemoryBackend::with_account("kim@example.com", "pw");
        let session = backend.sign_in("kim@example.com", "pw").await.unwrap();
        (backend, session)
    }

    fn metric(date: &str, value: f64) -> ProgressMetric {
        ProgressMetric {
            id: date.to_string(),
            user_id: "u".to_string(),
            date: date.to_string(),
            value,
            metric_type: "progress".to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_stats_streak() {
        let metrics = vec![
            metric("2026-03-01", 1.0),
            metric("2026-03-03", 2.0),
            metric("2026-03-04", 3.0),
            metric("2026-03-05T08:00:00Z", 4.0),
            metric("2026-03-05T19:00:00Z", 5.0),
        ];
        let stats = DashboardStats::from_metrics(&metrics, day("2026-03-05"));
        assert_eq!(stats.latest_progress, Some(5.0));
        assert_eq!(stats.metric_count, 5);
        assert_eq!(stats.streak_days, 3);

        let stats = DashboardStats::from_metrics(&metrics, day("2026-03-06"));
        assert_eq!(stats.streak_days, 3);

        let stats = DashboardStats::from_metrics(&metrics, day("2026-03-08"));
        assert_eq!(stats.streak_days, 0);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(
            DashboardStats::from_metrics(&[], day("2026-03-05")),
            DashboardStats::default()
        );
    }

    #[tokio::test]
    async fn test_load_without_session_is_noop() {
        let (backend, _) = signed_in().await;
        let mut dash = Dashboard::new();
        dash.load_user_data(&backend, None).await;
        assert!(dash.progress.is_empty());
        assert!(dash.workout_plan.is_none());
    }

    #[tokio::test]
    async fn test_load_user_data() {
        let (backend, session) = signed_in().await;
        let uid = session.user_id().to_string();
        backend.add_metric(&uid, "2026-01-02", 70.0, "weight");
        backend.add_metric(&uid, "2026-01-01", 71.0, "weight");
        backend.add_workout(WorkoutRecord {
            id: "w1".to_string(),
            user_id: uid.clone(),
            name: "HIIT".to_string(),
            date: "2026-01-02T09:00:00Z".to_string(),
            completed: false,
            exercises: Some(vec!["Burpees".to_string(), "Sprints".to_string()]),
        });

        let mut dash = Dashboard::new();
        dash.load_user_data(&backend, Some(&session)).await;

        assert_eq!(dash.progress_values(), vec![71.0, 70.0]);
        assert_eq!(dash.stats.metric_count, 2);
        let plan = dash.workout_plan.unwrap();
        assert_eq!(plan.name, "HIIT");
        assert_eq!(plan.duration, "45 minutes");
        assert_eq!(plan.intensity, "Moderate");
        assert_eq!(plan.exercises, vec!["Burpees", "Sprints"]);
    }

    #[tokio::test]
    async fn test_load_with_no_workout_keeps_no_plan() {
        let (backend, session) = signed_in().await;
        let mut dash = Dashboard::new();
        dash.load_user_data(&backend, Some(&session)).await;
        assert!(dash.workout_plan.is_none());
    }

    #[tokio::test]
    async fn test_change_goal() {
        let (backend, session) = signed_in().await;
        let coach = ScriptedCoach::new().reply("Intervals 5x3min\n\nEasy jog 20min\n");
        let mut dash = Dashboard::new();

        dash.change_goal(TrainingType::Cardio, &coach, &backend, Some(&session))
            .await;

        assert_eq!(dash.user_goal, TrainingType::Cardio);
        let plan = dash.workout_plan.as_ref().unwrap();
        assert_eq!(plan.name, "Cardio Training");
        assert_eq!(plan.exercises, vec!["Intervals 5x3min", "Easy jog 20min"]);
        assert!(plan.exercises.iter().all(|e| !e.is_empty()));

        assert_eq!(
            coach.calls(),
            vec![CoachCall::Plan {
                goal: "cardio".to_string(),
                level: FitnessLevel::Intermediate
            }]
        );
        let stored = backend.workouts_for(session.user_id());
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Cardio Training");
    }

    #[tokio::test]
    async fn test_change_goal_generation_failure_is_silent() {
        let (backend, session) = signed_in().await;
        let coach = ScriptedCoach::new().fail("quota");
        let mut dash = Dashboard::new();
        let previous = WorkoutPlan::new("Strength Training", vec!["Squats".to_string()]);
        dash.workout_plan = Some(previous.clone());

        dash.change_goal(TrainingType::Flexibility, &coach, &backend, Some(&session))
            .await;

        assert_eq!(dash.user_goal, TrainingType::Flexibility);
        assert_eq!(dash.workout_plan, Some(previous));
        assert!(backend.workouts_for(session.user_id()).is_empty());
    }

    #[tokio::test]
    async fn test_change_goal_insert_failure_is_silent() {
        let (backend, session) = signed_in().await;
        backend.set_fail_writes(true);
        let coach = ScriptedCoach::new().reply("Plank 3x60s");
        let mut dash = Dashboard::new();

        dash.change_goal(TrainingType::Strength, &coach, &backend, Some(&session))
            .await;

        assert!(dash.workout_plan.is_none());
        assert_eq!(dash.user_goal, TrainingType::Strength);
    }

    #[test]
    fn test_toggle_chat() {
        let mut dash = Dashboard::new();
        dash.toggle_chat();
        assert!(dash.show_chat);
        dash.toggle_chat();
        assert!(!dash.show_chat);
    }
}
