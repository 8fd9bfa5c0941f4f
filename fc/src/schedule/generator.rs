//! Schedule fetch lifecycle

use tracing::{debug, info, warn};

use super::{ScheduleStore, format_schedule};
use crate::coach::{Coach, GenerationError};
use crate::domain::TrainingType;

/// Message shown when a schedule fetch fails
pub const SCHEDULE_ERROR: &str = "Failed to load schedule. Please try again.";

/// Where the generator is in its fetch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Handle for one in-flight fetch
///
/// Only the ticket from the most recent [`ScheduleGenerator::begin_fetch`]
/// can complete; older tickets are discarded when they come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub training_type: TrainingType,
}

/// Fetches schedules through a [`Coach`] and keeps the result in a [`ScheduleStore`]
#[derive(Debug, Default)]
pub struct ScheduleGenerator {
    store: ScheduleStore,
    state: FetchState,
    error: Option<String>,
    generation: u64,
    training_type: Option<TrainingType>,
}

impl ScheduleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch: mark loading, clear the error and supersede any earlier ticket
    pub fn begin_fetch(&mut self, training_type: TrainingType) -> FetchTicket {
        self.generation += 1;
        debug!(%training_type, generation = self.generation, "ScheduleGenerator::begin_fetch: called");
        self.state = FetchState::Loading;
        self.error = None;
        self.training_type = Some(training_type);
        FetchTicket {
            generation: self.generation,
            training_type,
        }
    }

    /// Apply a fetch result; returns false if the ticket was stale and nothing changed
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<String, GenerationError>) -> bool {
        if ticket.generation != self.generation {
            warn!(
                training_type = %ticket.training_type,
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale schedule result"
            );
            return false;
        }

        match result {
            Ok(text) => {
                let days = format_schedule(&text);
                info!(training_type = %ticket.training_type, day_count = days.len(), "Schedule loaded");
                self.store.replace_all(days);
                self.state = FetchState::Ready;
            }
            Err(e) => {
                warn!(training_type = %ticket.training_type, error = %e, "Schedule fetch failed");
                self.error = Some(SCHEDULE_ERROR.to_string());
                self.state = FetchState::Error;
            }
        }
        true
    }

    /// Drop the schedule and any fetch in flight, back to `Idle`
    pub fn discard(&mut self) {
        debug!(generation = self.generation, "ScheduleGenerator::discard: called");
        self.generation += 1;
        self.store = ScheduleStore::new();
        self.state = FetchState::Idle;
        self.error = None;
        self.training_type = None;
    }

    /// Fetch and apply a schedule in one step
    pub async fn fetch_schedule(&mut self, coach: &dyn Coach, training_type: TrainingType) {
        let ticket = self.begin_fetch(training_type);
        let result = coach.generate_weekly_schedule(training_type).await;
        self.complete_fetch(ticket, result);
    }

    /// Flip a day card open or closed
    pub fn toggle(&mut self, index: isize) {
        self.store.toggle(index);
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Type of the most recent fetch
    pub fn training_type(&self) -> Option<TrainingType> {
        self.training_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::ScriptedCoach;

    #[tokio::test]
    async fn test_fetch_success() {
        let coach = ScriptedCoach::new().reply("Day 1: Run\nDay 2: Swim");
        let mut generator = ScheduleGenerator::new();
        assert_eq!(generator.state(), FetchState::Idle);

        generator.fetch_schedule(&coach, TrainingType::Cardio).await;

        assert_eq!(generator.state(), FetchState::Ready);
        assert!(!generator.is_loading());
        assert!(generator.error().is_none());
        let days = generator.store().days();
        assert_eq!(days.len(), 2);
        assert_eq!((days[0].label.as_str(), days[0].content.as_str()), ("Day 0", "Run"));
        assert_eq!((days[1].label.as_str(), days[1].content.as_str()), ("Day 1", "Swim"));
        assert!(days.iter().all(|d| !d.expanded));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_store() {
        let coach = ScriptedCoach::new().fail("network");
        let mut generator = ScheduleGenerator::new();

        generator.fetch_schedule(&coach, TrainingType::Strength).await;

        assert!(generator.store().is_empty());
        assert_eq!(generator.error(), Some("Failed to load schedule. Please try again."));
        assert!(!generator.is_loading());
        assert_eq!(generator.state(), FetchState::Error);
    }

    #[tokio::test]
    async fn test_failure_after_success_keeps_previous_days() {
        let coach = ScriptedCoach::new().reply("Day 1: Yoga").fail("timeout");
        let mut generator = ScheduleGenerator::new();
        generator.fetch_schedule(&coach, TrainingType::Flexibility).await;
        generator.fetch_schedule(&coach, TrainingType::Flexibility).await;

        assert_eq!(generator.store().len(), 1);
        assert_eq!(generator.error(), Some(SCHEDULE_ERROR));
    }

    #[test]
    fn test_begin_fetch_clears_error() {
        let mut generator = ScheduleGenerator::new();
        let ticket = generator.begin_fetch(TrainingType::Cardio);
        generator.complete_fetch(ticket, Err(GenerationError::EmptyResponse));
        assert!(generator.error().is_some());

        generator.begin_fetch(TrainingType::Cardio);
        assert!(generator.error().is_none());
        assert!(generator.is_loading());
    }

    #[test]
    fn test_stale_ticket_discarded() {
        let mut generator = ScheduleGenerator::new();
        let stale = generator.begin_fetch(TrainingType::Strength);
        let fresh = generator.begin_fetch(TrainingType::Cardio);

        assert!(!generator.complete_fetch(stale, Ok("Day 1: Bench".to_string())));
        assert!(generator.store().is_empty());
        assert!(generator.is_loading());
        assert!(generator.error().is_none());

        assert!(!generator.complete_fetch(stale, Err(GenerationError::EmptyResponse)));
        assert!(generator.error().is_none());

        assert!(generator.complete_fetch(fresh, Ok("Day 1: Run".to_string())));
        assert_eq!(generator.store().days()[0].content, "Run");
        assert_eq!(generator.training_type(), Some(TrainingType::Cardio));
    }

    #[test]
    fn test_completed_ticket_cannot_reapply_after_new_fetch() {
        let mut generator = ScheduleGenerator::new();
        let first = generator.begin_fetch(TrainingType::Cardio);
        generator.complete_fetch(first, Ok("Day 1: Run".to_string()));
        generator.begin_fetch(TrainingType::Strength);
        assert!(!generator.complete_fetch(first, Ok("Day 1: Walk".to_string())));
        assert_eq!(generator.store().days()[0].content, "Run");
    }
}
