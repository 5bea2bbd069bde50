//! Micro-Task Entity
//!
//! A short task with an attached stopwatch. Micro-tasks belong to a single
//! widget list and are ungrouped: their ordering group is the unit type.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, Orderable};

/// Stopwatch state of a micro-task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Timer was never started
    #[default]
    Never,
    Running,
    Paused,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Never => "never",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
        }
    }

    /// Unknown values normalize to `Never`
    pub fn from_str(s: &str) -> Self {
        match s {
            "running" => TimerState::Running,
            "paused" => TimerState::Paused,
            _ => TimerState::Never,
        }
    }
}

/// A micro-task with stopwatch fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroTask {
    /// Unique identifier, immutable
    pub id: String,
    /// Owning widget (cache scope)
    pub widget_id: String,
    pub user_id: String,
    pub title: String,
    /// Fractional order key within the widget list
    pub order: f64,
    pub timer_state: TimerState,
    /// Accumulated stopwatch seconds across pauses
    pub total_seconds: i64,
    /// Millisecond timestamp of the last start, while running
    pub last_started_at: Option<i64>,
    /// Set when the task is archived; archived tasks are hidden from
    /// widget lists but their rows survive
    pub archived_at: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl MicroTask {
    pub fn new(
        id: impl Into<String>,
        widget_id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        order: f64,
    ) -> Self {
        Self {
            id: id.into(),
            widget_id: widget_id.into(),
            user_id: user_id.into(),
            title: title.into(),
            order,
            timer_state: TimerState::Never,
            total_seconds: 0,
            last_started_at: None,
            archived_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for MicroTask {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Orderable for MicroTask {
    type Group = ();

    fn group(&self) {}

    fn order(&self) -> f64 {
        self.order
    }

    fn set_order(&mut self, order: f64) {
        self.order = order;
    }

    fn set_group(&mut self, _group: ()) {}
}

/// Format accumulated seconds as `m:ss`, or `h:mm:ss` past one hour.
/// Negative inputs render as zero.
pub fn format_duration(total_seconds: i64) -> String {
    let safe_seconds = total_seconds.max(0);
    let hours = safe_seconds / 3600;
    let minutes = (safe_seconds % 3600) / 60;
    let seconds = safe_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Parse a duration typed by the user: `ss`, `mm:ss` or `hh:mm:ss`.
/// Returns `None` for anything malformed or negative.
pub fn parse_duration(value: &str) -> Option<i64> {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return None;
    }
    let parts: Vec<&str> = cleaned.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
        let number: i64 = part.trim().parse().ok()?;
        if number < 0 {
            return None;
        }
        numbers.push(number);
    }
    let seconds = match numbers.as_slice() {
        [s] => *s,
        [m, s] => m * 60 + s,
        [h, m, s] => h * 3600 + m * 60 + s,
        _ => return None,
    };
    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_state_normalization() {
        assert_eq!(TimerState::from_str("running"), TimerState::Running);
        assert_eq!(TimerState::from_str("paused"), TimerState::Paused);
        assert_eq!(TimerState::from_str(""), TimerState::Never);
        assert_eq!(TimerState::from_str("bogus"), TimerState::Never);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(600), "10:00");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
        assert_eq!(format_duration(-10), "0:00");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90"), Some(90));
        assert_eq!(parse_duration("1:30"), Some(90));
        assert_eq!(parse_duration("1:00:00"), Some(3600));
        assert_eq!(parse_duration(" 2:05 "), Some(125));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("1:2:3:4"), None);
        assert_eq!(parse_duration("-5"), None);
        assert_eq!(parse_duration("1::2"), None);
    }

    #[test]
    fn test_micro_task_is_ungrouped() {
        let task = MicroTask::new("t1", "w1", "u1", "Inbox zero", 1.0);
        assert_eq!(task.timer_state, TimerState::Never);
        assert_eq!(task.total_seconds, 0);
        task.group();
    }
}
