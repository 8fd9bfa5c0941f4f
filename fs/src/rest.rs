//! Supabase-compatible REST backend
//!
//! Auth goes through the GoTrue endpoints under `/auth/v1`, records through
//! the PostgREST endpoints under `/rest/v1`. Every request carries the
//! project's anon key in `apikey`; record requests add the user's bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AuthSession, AuthUser, Backend, NewWorkout, ProgressMetric, StoreError, WorkoutRecord};

const METRICS_TABLE: &str = "progress_metrics";
const WORKOUTS_TABLE: &str = "workouts";

/// REST client for the hosted backend
pub struct RestBackend {
    base_url: String,
    anon_key: String,
    http: Client,
}

impl RestBackend {
    /// Create a client for the project at `base_url`
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, ?timeout, "RestBackend::new: called");
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            anon_key: anon_key.into(),
            http,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn with_key(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    fn with_session(&self, builder: RequestBuilder, session: &AuthSession) -> RequestBuilder {
        self.with_key(builder).bearer_auth(&session.access_token)
    }

    /// Every metric for `user_id`, oldest first
    fn metrics_request(&self, session: &AuthSession, user_id: &str) -> RequestBuilder {
        let query = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "date.asc".to_string()),
        ];
        self.with_session(self.http.get(self.table_url(METRICS_TABLE)), session)
            .query(&query)
    }

    /// The single newest workout for `user_id` not yet marked completed
    fn latest_workout_request(&self, session: &AuthSession, user_id: &str) -> RequestBuilder {
        let query = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("completed", "eq.false".to_string()),
            ("order", "date.desc".to_string()),
            ("limit", "1".to_string()),
        ];
        self.with_session(self.http.get(self.table_url(WORKOUTS_TABLE)), session)
            .query(&query)
    }

    /// Insert one workout and ask for the stored row back
    fn insert_workout_request(&self, session: &AuthSession, workout: &NewWorkout) -> RequestBuilder {
        self.with_session(self.http.post(self.table_url(WORKOUTS_TABLE)), session)
            .header("Prefer", "return=representation")
            .json(workout)
    }

    /// Turn a non-success response into an error, keeping the body as the message
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %message, "RestBackend::check: API error");
        Err(StoreError::ApiError {
            status: status.as_u16(),
            message: extract_error_message(&message),
        })
    }

    async fn password_grant(&self, url: String, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self.with_key(self.http.post(url)).json(&body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        if status == 400 || status == 401 || status == 422 {
            return Err(StoreError::Auth(extract_error_message(&text)));
        }
        if !(200..300).contains(&status) {
            return Err(StoreError::ApiError {
                status,
                message: extract_error_message(&text),
            });
        }

        parse_token_response(&text, chrono::Utc::now().timestamp())
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        debug!(%email, "RestBackend::sign_in: called");
        self.password_grant(self.auth_url("token?grant_type=password"), email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        debug!(%email, "RestBackend::sign_up: called");
        self.password_grant(self.auth_url("signup"), email, password).await
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), StoreError> {
        debug!(user_id = %session.user_id(), "RestBackend::sign_out: called");
        let response = self
            .with_session(self.http.post(self.auth_url("logout")), session)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_user(&self, session: &AuthSession) -> Result<AuthUser, StoreError> {
        debug!("RestBackend::get_user: called");
        let response = self
            .with_session(self.http.get(self.auth_url("user")), session)
            .send()
            .await?;
        let response = Self::check(response).await.map_err(|e| {
            if e.is_auth_error() {
                StoreError::Auth(e.to_string())
            } else {
                e
            }
        })?;
        Ok(response.json::<AuthUser>().await?)
    }

    async fn progress_metrics(
        &self,
        session: &AuthSession,
        user_id: &str,
    ) -> Result<Vec<ProgressMetric>, StoreError> {
        debug!(%user_id, "RestBackend::progress_metrics: called");
        let response = self.metrics_request(session, user_id).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn latest_incomplete_workout(
        &self,
        session: &AuthSession,
        user_id: &str,
    ) -> Result<Option<WorkoutRecord>, StoreError> {
        debug!(%user_id, "RestBackend::latest_incomplete_workout: called");
        let response = self.latest_workout_request(session, user_id).send().await?;
        let response = Self::check(response).await?;
        let mut rows: Vec<WorkoutRecord> = response.json().await?;
        debug!(row_count = rows.len(), "RestBackend::latest_incomplete_workout: fetched");
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    async fn insert_workout(&self, session: &AuthSession, workout: NewWorkout) -> Result<WorkoutRecord, StoreError> {
        debug!(name = %workout.name, "RestBackend::insert_workout: called");
        let response = self.insert_workout_request(session, &workout).send().await?;
        let response = Self::check(response).await?;
        let rows: Vec<WorkoutRecord> = response.json().await?;
        rows.into_iter().next().ok_or_else(|| {
            warn!("RestBackend::insert_workout: insert returned no rows");
            StoreError::InvalidResponse("Insert returned no rows".to_string())
        })
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: Option<AuthUser>,
}

/// Parse a token/signup response into a session
///
/// Sign-up with email confirmation enabled returns a user without tokens;
/// that is reported as an auth error so the caller can tell the user to
/// confirm their address.
fn parse_token_response(body: &str, now_secs: i64) -> Result<AuthSession, StoreError> {
    let token: TokenResponse = serde_json::from_str(body)?;
    let access_token = token
        .access_token
        .ok_or_else(|| StoreError::Auth("Check your email to confirm your account, then sign in".to_string()))?;
    let user = token
        .user
        .ok_or_else(|| StoreError::InvalidResponse("Token response has no user".to_string()))?;
    let expires_at = token
        .expires_at
        .unwrap_or_else(|| now_secs + token.expires_in.unwrap_or(3600));

    Ok(AuthSession {
        access_token,
        refresh_token: token.refresh_token.unwrap_or_default(),
        expires_at,
        user,
    })
}

/// Pull a readable message out of a JSON error body
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}
