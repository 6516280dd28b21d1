//! Overlap and validation engine.
//!
//! # Responsibility
//! - Decide whether a candidate may be committed next to its day siblings.
//! - Produce the normalized `Event` that the store persists.
//!
//! # Invariants
//! - Pure: reads only its arguments, never touches a store.
//! - Checks run in a fixed order and the first failure wins.
//! - Create, edit and move all go through [`validate_event`].

use crate::config::{DEFAULT_MAX_DURATION_MINUTES, DEFAULT_MIN_DURATION_MINUTES};
use crate::model::event::{Event, EventCandidate};
use crate::time::{format_minutes, format_minutes_12h, intervals_overlap, normalize_end, MINUTES_PER_DAY};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Duration bounds applied by the engine, in minutes (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingRules {
    pub min_duration_minutes: u32,
    pub max_duration_minutes: u32,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            min_duration_minutes: DEFAULT_MIN_DURATION_MINUTES,
            max_duration_minutes: DEFAULT_MAX_DURATION_MINUTES,
        }
    }
}

/// Sibling that blocks a candidate, with display-ready times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub sibling: Event,
    pub display_start: String,
    pub display_end: String,
}

impl Conflict {
    fn new(sibling: &Event) -> Self {
        Self {
            display_start: format_minutes_12h(sibling.start_minutes()),
            display_end: format_minutes_12h(sibling.end_minutes()),
            sibling: sibling.clone(),
        }
    }
}

/// Reason a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    DuplicateTitle { title: String },
    InvalidRange { start: u16, end: u16 },
    TooShort { minutes: u32, min: u32 },
    TooLong { minutes: u32, max: u32 },
    Overlap(Box<Conflict>),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "event title must not be blank"),
            Self::DuplicateTitle { title } => {
                write!(f, "an event named `{title}` already exists on this day")
            }
            Self::InvalidRange { start, end } => write!(
                f,
                "end time must be after start time (start {} end {})",
                format_minutes(*start),
                format_minutes(*end)
            ),
            Self::TooShort { minutes, min } => write!(
                f,
                "event lasts {minutes} minutes; minimum is {min} minutes"
            ),
            Self::TooLong { minutes, max } => write!(
                f,
                "event lasts {minutes} minutes; maximum is {max} minutes"
            ),
            Self::Overlap(conflict) => write!(
                f,
                "overlaps with `{}` ({} - {})",
                conflict.sibling.title, conflict.display_start, conflict.display_end
            ),
        }
    }
}

impl Error for ValidationError {}

/// Validates `candidate` against the events already on its day.
///
/// Siblings sharing the candidate's id are ignored, so edit and move paths
/// may pass the full day bucket.
///
/// # Errors
/// In check order: `EmptyTitle`, `DuplicateTitle`, `InvalidRange`,
/// `TooShort`, `TooLong`, `Overlap`. A candidate that passes every check but
/// cannot be anchored to a real date is also `InvalidRange`.
pub fn validate_event(
    candidate: &EventCandidate,
    siblings: &[Event],
    rules: &SchedulingRules,
) -> Result<Event, ValidationError> {
    let title = candidate.title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let others = || siblings.iter().filter(|e| e.id != candidate.id);

    let folded = title.to_lowercase();
    if others().any(|e| e.title.trim().to_lowercase() == folded) {
        return Err(ValidationError::DuplicateTitle {
            title: title.to_string(),
        });
    }

    let start = u32::from(candidate.start);
    let end = normalize_end(start, u32::from(candidate.end));
    if end <= start {
        return Err(ValidationError::InvalidRange {
            start: candidate.start,
            end: candidate.end,
        });
    }

    let minutes = end - start;
    if minutes < rules.min_duration_minutes {
        return Err(ValidationError::TooShort {
            minutes,
            min: rules.min_duration_minutes,
        });
    }
    if minutes > rules.max_duration_minutes {
        return Err(ValidationError::TooLong {
            minutes,
            max: rules.max_duration_minutes,
        });
    }

    if let Some(sibling) = others().find(|e| {
        spans_conflict(
            (start, end),
            (u32::from(e.start_minutes()), u32::from(e.end_minutes())),
        )
    }) {
        return Err(ValidationError::Overlap(Box::new(Conflict::new(sibling))));
    }

    // A cross-midnight end on the last representable date has no next day.
    let (start_time, end_time) = candidate
        .anchored()
        .map_err(|_| ValidationError::InvalidRange {
            start: candidate.start,
            end: candidate.end,
        })?;
    Ok(Event {
        id: candidate.id.clone(),
        title: title.to_string(),
        start_time,
        end_time,
        description: candidate
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        category: candidate.category,
    })
}

/// Overlap in minute space, also comparing against the next-day copy of the
/// other interval when either side crosses midnight.
fn spans_conflict(a: (u32, u32), b: (u32, u32)) -> bool {
    if intervals_overlap(a.0, a.1, b.0, b.1) {
        return true;
    }
    let b_end = normalize_end(b.0, b.1);
    let a_wraps = a.1 > MINUTES_PER_DAY;
    let b_wraps = b_end > MINUTES_PER_DAY;
    if a_wraps && !b_wraps {
        return intervals_overlap(a.0, a.1, b.0 + MINUTES_PER_DAY, b_end + MINUTES_PER_DAY);
    }
    if b_wraps && !a_wraps {
        return intervals_overlap(a.0 + MINUTES_PER_DAY, a.1 + MINUTES_PER_DAY, b.0, b_end);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::spans_conflict;

    #[test]
    fn wrapped_interval_meets_next_morning() {
        assert!(spans_conflict((1410, 1470), (15, 45)));
        assert!(!spans_conflict((1410, 1470), (45, 75)));
        assert!(spans_conflict((15, 45), (1410, 30)));
    }

    #[test]
    fn touching_across_midnight_is_not_a_conflict() {
        assert!(!spans_conflict((1380, 1440), (0, 60)));
        assert!(!spans_conflict((0, 60), (1380, 0)));
    }
}
