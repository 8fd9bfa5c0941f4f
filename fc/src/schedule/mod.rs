//! Weekly schedule pipeline
//!
//! Raw LLM text goes through [`format_schedule`] into [`DayRecord`]s held by a
//! [`ScheduleStore`]; [`ScheduleGenerator`] drives the fetch lifecycle.
//!
//! [`DayRecord`]: crate::domain::DayRecord

mod formatter;
mod generator;
mod store;

pub use formatter::{format_schedule, split_plan_lines};
pub use generator::{FetchState, FetchTicket, SCHEDULE_ERROR, ScheduleGenerator};
pub use store::ScheduleStore;
