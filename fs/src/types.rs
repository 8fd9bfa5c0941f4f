//! Record and session types
//!
//! Field names follow the backend's table columns so rows deserialize
//! directly from the REST API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    /// Id of the signed-in user
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Check whether the access token has expired at `now_secs`
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        now_secs >= self.expires_at
    }

    /// Check whether the access token has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

/// A row from `progress_metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetric {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub value: f64,
    #[serde(rename = "type", default)]
    pub metric_type: String,
}

impl ProgressMetric {
    /// Calendar day of this metric (accepts `YYYY-MM-DD` or a full timestamp)
    pub fn day(&self) -> Option<NaiveDate> {
        self.date
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

/// A row from `workouts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub exercises: Option<Vec<String>>,
}

impl WorkoutRecord {
    /// Exercises, treating a null column as empty
    pub fn exercise_list(&self) -> Vec<String> {
        self.exercises.clone().unwrap_or_default()
    }
}

/// Insert payload for `workouts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkout {
    pub user_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
}

impl NewWorkout {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            date: Utc::now(),
        }
    }
}

/// Row ids may be uuids or bigints depending on the table definition
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}
