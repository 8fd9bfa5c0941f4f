//! Signed-in session context
//!
//! One [`SessionContext`] is created at startup and handed to whatever needs
//! the current user. Auth changes are published on a `watch` channel so views
//! can react to sign-in and sign-out.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fitstore::{AuthSession, Backend, StoreError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Current auth state plus the backend it belongs to
pub struct SessionContext {
    backend: Arc<dyn Backend>,
    session_file: Option<PathBuf>,
    tx: watch::Sender<Option<AuthSession>>,
}

impl SessionContext {
    /// A signed-out context
    ///
    /// With `session_file` set, sign-ins are saved there and sign-out deletes it.
    pub fn new(backend: Arc<dyn Backend>, session_file: Option<PathBuf>) -> Self {
        debug!(?session_file, "SessionContext::new: called");
        let (tx, _) = watch::channel(None);
        Self {
            backend,
            session_file,
            tx,
        }
    }

    /// Create a context, restoring the saved session if it is still valid
    ///
    /// An unreadable, expired or rejected session file is removed.
    pub async fn restore(backend: Arc<dyn Backend>, session_file: PathBuf) -> Self {
        debug!(?session_file, "SessionContext::restore: called");
        let ctx = Self::new(backend, Some(session_file.clone()));

        let Some(saved) = load_session_file(&session_file) else {
            return ctx;
        };
        if saved.is_expired() {
            info!("Saved session expired");
            ctx.forget();
            return ctx;
        }

        match ctx.backend.get_user(&saved).await {
            Ok(user) => {
                info!(user_id = %user.id, "Restored saved session");
                ctx.tx.send_replace(Some(AuthSession { user, ..saved }));
            }
            Err(e) if e.is_auth_error() => {
                info!(error = %e, "Saved session rejected");
                ctx.forget();
            }
            Err(e) => {
                // Backend unreachable: keep the file for next time but stay signed out
                warn!(error = %e, "Could not validate saved session");
            }
        }
        ctx
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        debug!(%email, "SessionContext::sign_in: called");
        let session = self.backend.sign_in(email, password).await?;
        self.establish(session.clone());
        Ok(session)
    }

    /// Create an account and sign in
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        debug!(%email, "SessionContext::sign_up: called");
        let session = self.backend.sign_up(email, password).await?;
        self.establish(session.clone());
        Ok(session)
    }

    /// Sign out and tear down local state
    ///
    /// The local session is dropped even if the backend call fails.
    pub async fn sign_out(&self) {
        debug!("SessionContext::sign_out: called");
        if let Some(session) = self.current()
            && let Err(e) = self.backend.sign_out(&session).await
        {
            warn!(error = %e, "Backend sign-out failed");
        }
        self.forget();
    }

    /// Adopt an already-issued session (offline mode, tests)
    pub fn establish(&self, session: AuthSession) {
        info!(user_id = %session.user_id(), "Signed in");
        if let Some(path) = &self.session_file
            && let Err(e) = save_session_file(path, &session)
        {
            warn!(path = %path.display(), error = %e, "Failed to save session");
        }
        self.tx.send_replace(Some(session));
    }

    fn forget(&self) {
        if let Some(path) = &self.session_file
            && path.exists()
            && let Err(e) = fs::remove_file(path)
        {
            warn!(path = %path.display(), error = %e, "Failed to remove session file");
        }
        self.tx.send_replace(None);
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<AuthSession> {
        self.tx.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.user_id().to_string())
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Receive auth-state changes
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.tx.subscribe()
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn session_file(&self) -> Option<&Path> {
        self.session_file.as_deref()
    }
}

/// Read a saved session; an unreadable file is removed
pub fn load_session_file(path: &Path) -> Option<AuthSession> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
            let _ = fs::remove_file(path);
            None
        }
    }
}

fn save_session_file(path: &Path, session: &AuthSession) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
