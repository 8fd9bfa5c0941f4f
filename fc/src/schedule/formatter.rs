//! Splits free-text schedules and plans into displayable pieces

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::DayRecord;

static DAY_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Day \d+:").expect("day delimiter regex must compile"));

/// Split a schedule on `Day N:` markers into one record per segment
///
/// Zero-length segments are dropped; whitespace-only segments are kept and
/// trim to empty content. Labels are positional (`Day 0`, `Day 1`, ...) and
/// never taken from the text. Every record starts collapsed.
pub fn format_schedule(raw: &str) -> Vec<DayRecord> {
    let days: Vec<DayRecord> = DAY_DELIMITER
        .split(raw)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(i, segment)| DayRecord {
            label: format!("Day {}", i),
            content: segment.trim().to_string(),
            expanded: false,
        })
        .collect();
    debug!(raw_len = raw.len(), day_count = days.len(), "format_schedule: formatted");
    days
}

/// Split a workout plan into its non-empty lines
pub fn split_plan_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
