//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Shared coach persona, the system prompt for plans and schedules
pub const COACH: &str = include_str!("../../prompts/coach.pmt");

/// Weekly schedule for one training type
pub const SCHEDULE: &str = include_str!("../../prompts/schedule.pmt");

/// Workout plan for a goal and fitness level
pub const WORKOUT: &str = include_str!("../../prompts/workout.pmt");

/// Chat assistant system prompt
pub const CHAT: &str = include_str!("../../prompts/chat.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "coach" => Some(COACH),
        "schedule" => Some(SCHEDULE),
        "workout" => Some(WORKOUT),
        "chat" => Some(CHAT),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_covers_required_sections() {
        let schedule = get_embedded("schedule").unwrap();
        assert!(schedule.contains("7-day"));
        assert!(schedule.contains("{{training_type}}"));
        for section in ["sets and reps", "Rest periods", "Intensity", "duration", "form", "Recovery"] {
            assert!(schedule.contains(section), "missing {section}");
        }
        assert!(schedule.contains("day-by-day"));
    }

    #[test]
    fn test_workout_has_placeholders() {
        let workout = get_embedded("workout").unwrap();
        assert!(workout.contains("{{goal}}"));
        assert!(workout.contains("{{fitness_level}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("coach").is_some());
        assert!(get_embedded("chat").is_some());
        assert!(get_embedded("unknown-template").is_none());
    }
}
