//! FitStore - auth and record storage for FitCoach
//!
//! FitStore talks to a hosted backend-as-a-service (a Supabase-compatible
//! REST API) for two concerns:
//!
//! - **Auth**: password sign-in/sign-up, sign-out, session validation
//! - **Records**: progress metrics and workouts, scoped to a user
//!
//! The [`Backend`] trait is the seam the app depends on. [`RestBackend`] is the
//! production implementation; [`MemoryBackend`] keeps everything in-process for
//! tests and offline mode.

mod backend;
mod error;
mod memory;
mod rest;
mod types;

pub use backend::Backend;
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use types::{AuthSession, AuthUser, NewWorkout, ProgressMetric, WorkoutRecord};

