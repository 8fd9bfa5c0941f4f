//! In-process backend
//!
//! Keeps accounts, sessions and rows in memory. Used by tests and by the
//! app's offline mode; behaves like the REST backend for every query shape
//! the app uses.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::{AuthSession, AuthUser, Backend, NewWorkout, ProgressMetric, StoreError, WorkoutRecord};

/// Session lifetime handed out by [`MemoryBackend`]
const SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Default)]
struct Inner {
    /// email -> (password, user)
    accounts: HashMap<String, (String, AuthUser)>,
    /// access token -> user id
    tokens: HashMap<String, String>,
    metrics: Vec<ProgressMetric>,
    workouts: Vec<WorkoutRecord>,
    fail_writes: bool,
}

/// Backend that stores everything in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with one registered account
    pub fn with_account(email: &str, password: &str) -> Self {
        let backend = Self::new();
        backend.register(email, password);
        backend
    }

    /// Register an account without signing in; returns the user id
    pub fn register(&self, email: &str, password: &str) -> String {
        debug!(%email, "MemoryBackend::register: called");
        let user = AuthUser {
            id: Uuid::now_v7().to_string(),
            email: Some(email.to_string()),
        };
        let id = user.id.clone();
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), user));
        id
    }

    /// Add a progress metric row
    pub fn add_metric(&self, user_id: &str, date: &str, value: f64, metric_type: &str) {
        self.lock().metrics.push(ProgressMetric {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            date: date.to_string(),
            value,
            metric_type: metric_type.to_string(),
        });
    }

    /// Add a workout row directly
    pub fn add_workout(&self, record: WorkoutRecord) {
        self.lock().workouts.push(record);
    }

    /// All workouts stored for a user, in insertion order
    pub fn workouts_for(&self, user_id: &str) -> Vec<WorkoutRecord> {
        self.lock()
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Make every subsequent insert fail (for exercising write-failure paths)
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-write
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn issue_session(inner: &mut Inner, user: AuthUser) -> AuthSession {
        let access_token = Uuid::now_v7().to_string();
        inner.tokens.insert(access_token.clone(), user.id.clone());
        AuthSession {
            access_token,
            refresh_token: Uuid::now_v7().to_string(),
            expires_at: Utc::now().timestamp() + SESSION_TTL_SECS,
            user,
        }
    }

    fn authorize(inner: &Inner, session: &AuthSession) -> Result<String, StoreError> {
        inner
            .tokens
            .get(&session.access_token)
            .cloned()
            .ok_or(StoreError::NotSignedIn)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        debug!(%email, "MemoryBackend::sign_in: called");
        let mut inner = self.lock();
        let user = match inner.accounts.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(StoreError::Auth("Invalid login credentials".to_string())),
        };
        Ok(Self::issue_session(&mut inner, user))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        debug!(%email, "MemoryBackend::sign_up: called");
        if self.lock().accounts.contains_key(email) {
            return Err(StoreError::Auth("User already registered".to_string()));
        }
        self.register(email, password);
        self.sign_in(email, password).await
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), StoreError> {
        debug!("MemoryBackend::sign_out: called");
        self.lock().tokens.remove(&session.access_token);
        Ok(())
    }

    async fn get_user(&self, session: &AuthSession) -> Result<AuthUser, StoreError> {
        let inner = self.lock();
        let user_id = Self::authorize(&inner, session)?;
        inner
            .accounts
            .values()
            .find(|(_, u)| u.id == user_id)
            .map(|(_, u)| u.clone())
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    async fn progress_metrics(
        &self,
        session: &AuthSession,
        user_id: &str,
    ) -> Result<Vec<ProgressMetric>, StoreError> {
        let inner = self.lock();
        Self::authorize(&inner, session)?;
        let mut rows: Vec<ProgressMetric> = inner.metrics.iter().filter(|m| m.user_id == user_id).cloned().collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    async fn latest_incomplete_workout(
        &self,
        session: &AuthSession,
        user_id: &str,
    ) -> Result<Option<WorkoutRecord>, StoreError> {
        let inner = self.lock();
        Self::authorize(&inner, session)?;
        // max_by keeps the last of equal dates, i.e. the most recently inserted
        Ok(inner
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id && !w.completed)
            .max_by(|a, b| a.date.cmp(&b.date))
            .cloned())
    }

    async fn insert_workout(&self, session: &AuthSession, workout: NewWorkout) -> Result<WorkoutRecord, StoreError> {
        debug!(name = %workout.name, "MemoryBackend::insert_workout: called");
        let mut inner = self.lock();
        Self::authorize(&inner, session)?;
        if inner.fail_writes {
            return Err(StoreError::ApiError {
                status: 503,
                message: "writes disabled".to_string(),
            });
        }
        let record = WorkoutRecord {
            id: Uuid::now_v7().to_string(),
            user_id: workout.user_id,
            name: workout.name,
            date: workout.date.to_rfc3339(),
            completed: false,
            exercises: None,
        };
        inner.workouts.push(record.clone());
        Ok(record)
    }
}
