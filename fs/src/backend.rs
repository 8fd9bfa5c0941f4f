//! Backend trait definition

use async_trait::async_trait;

use crate::{AuthSession, AuthUser, NewWorkout, ProgressMetric, StoreError, WorkoutRecord};

/// Auth and record storage
///
/// Every record call is scoped by the caller's session; implementations
/// send its access token so row-level policies apply.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, StoreError>;

    /// Create an account and sign in
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, StoreError>;

    /// Revoke the session
    async fn sign_out(&self, session: &AuthSession) -> Result<(), StoreError>;

    /// Resolve the user behind a session (fails if the session is no longer valid)
    async fn get_user(&self, session: &AuthSession) -> Result<AuthUser, StoreError>;

    /// All progress metrics for a user, oldest first
    async fn progress_metrics(&self, session: &AuthSession, user_id: &str)
    -> Result<Vec<ProgressMetric>, StoreError>;

    /// The single most recent incomplete workout for a user, if any
    async fn latest_incomplete_workout(
        &self,
        session: &AuthSession,
        user_id: &str,
    ) -> Result<Option<WorkoutRecord>, StoreError>;

    /// Insert a workout and return the stored row
    async fn insert_workout(&self, session: &AuthSession, workout: NewWorkout) -> Result<WorkoutRecord, StoreError>;
}
