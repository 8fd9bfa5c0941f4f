//! Holds the current schedule

use tracing::debug;

use crate::domain::DayRecord;

/// Ordered day records for the schedule on screen
#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    days: Vec<DayRecord>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a whole new schedule
    pub fn replace_all(&mut self, days: Vec<DayRecord>) {
        debug!(day_count = days.len(), "ScheduleStore::replace_all: called");
        self.days = days;
    }

    /// Flip `expanded` on the record at `index`; out-of-range indexes are ignored
    pub fn toggle(&mut self, index: isize) {
        let Ok(i) = usize::try_from(index) else {
            debug!(%index, "ScheduleStore::toggle: negative index ignored");
            return;
        };
        match self.days.get_mut(i) {
            Some(day) => day.expanded = !day.expanded,
            None => debug!(%index, len = self.days.len(), "ScheduleStore::toggle: index out of range"),
        }
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn get(&self, index: usize) -> Option<&DayRecord> {
        self.days.get(index)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
