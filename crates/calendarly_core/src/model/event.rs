//! Event domain model.
//!
//! # Responsibility
//! - Define the canonical calendar entry and its closed category set.
//! - Define the candidate shape that create/edit/move intents feed the engine.
//!
//! # Invariants
//! - `end_time > start_time` for every committed event.
//! - The calendar day of an event is the date of `start_time`.
//! - `title` is trimmed and non-empty for every committed event.

use crate::time::{anchor, minutes_of, minutes_since_midnight, TimeResult};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_GENERATED_ID: AtomicI64 = AtomicI64::new(0);

/// Opaque event identity, supplied by the caller on create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a millisecond-timestamp id, strictly increasing within
    /// this process even when called twice in the same millisecond.
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_millis();
        let mut last = LAST_GENERATED_ID.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match LAST_GENERATED_ID.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(next.to_string()),
                Err(observed) => last = observed,
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Closed set of event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Work,
    Personal,
    #[default]
    Other,
    Education,
    Hobbies,
    Health,
    Finance,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Work,
        Category::Personal,
        Category::Other,
        Category::Education,
        Category::Hobbies,
        Category::Health,
        Category::Finance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Other => "other",
            Self::Education => "education",
            Self::Hobbies => "hobbies",
            Self::Health => "health",
            Self::Finance => "finance",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| format!("unknown category `{value}`"))
    }
}

/// Committed calendar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// Local wall-clock start.
    pub start_time: NaiveDateTime,
    /// Local wall-clock end; may fall on the next day.
    pub end_time: NaiveDateTime,
    pub description: Option<String>,
    pub category: Category,
}

impl Event {
    /// Calendar day bucket this event belongs to.
    pub fn day(&self) -> NaiveDate {
        self.start_time.date()
    }

    pub fn start_minutes(&self) -> u16 {
        minutes_of(self.start_time)
    }

    pub fn end_minutes(&self) -> u16 {
        minutes_of(self.end_time)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Case-insensitive substring match over title and description.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(needle))
    }
}

/// Unvalidated intent payload for create, edit and move.
///
/// Times are minutes since midnight on `day`; `end < start` marks an event
/// that crosses midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCandidate {
    pub id: EventId,
    pub title: String,
    pub day: NaiveDate,
    pub start: u16,
    pub end: u16,
    pub description: Option<String>,
    pub category: Category,
}

impl EventCandidate {
    pub fn new(
        id: impl Into<EventId>,
        title: impl Into<String>,
        day: NaiveDate,
        start: u16,
        end: u16,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            day,
            start,
            end,
            description: None,
            category: Category::default(),
        }
    }

    /// Builds a candidate from `HH:MM` text (24h, or 12h with AM/PM).
    ///
    /// # Errors
    /// - `TimeError::InvalidFormat` for malformed clock text.
    pub fn from_clock(
        id: impl Into<EventId>,
        title: impl Into<String>,
        day: NaiveDate,
        start: &str,
        end: &str,
    ) -> TimeResult<Self> {
        let start = minutes_since_midnight(start, None)?;
        let end = minutes_since_midnight(end, None)?;
        Ok(Self::new(id, title, day, start, end))
    }

    /// Candidate that re-states an existing event, e.g. for a move.
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            day: event.day(),
            start: event.start_minutes(),
            end: event.end_minutes(),
            description: event.description.clone(),
            category: event.category,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Same wall-clock times, different calendar day.
    pub fn on_day(mut self, day: NaiveDate) -> Self {
        self.day = day;
        self
    }

    /// Absolute timestamps this candidate would occupy.
    ///
    /// # Errors
    /// - `TimeError::InvalidFormat` when a cross-midnight end has no next day.
    pub fn anchored(&self) -> TimeResult<(NaiveDateTime, NaiveDateTime)> {
        anchor(self.day, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_only_known_values() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("Work".parse::<Category>().is_err());
        assert!("meeting".parse::<Category>().is_err());
    }

    #[test]
    fn event_id_serializes_as_bare_string() {
        let id = EventId::from("1700000000000");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""1700000000000""#);
        assert_eq!(serde_json::from_str::<EventId>(&json).unwrap(), id);
    }

    #[test]
    fn generated_ids_are_strictly_increasing() {
        let first: i64 = EventId::generate().as_str().parse().unwrap();
        let second: i64 = EventId::generate().as_str().parse().unwrap();
        assert!(second > first);
    }

    #[test]
    fn candidate_from_event_keeps_wall_clock() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let candidate = EventCandidate::from_clock("1", "Late", day, "23:30", "00:30").unwrap();
        let (start_time, end_time) = candidate.anchored().unwrap();
        let event = Event {
            id: candidate.id.clone(),
            title: candidate.title.clone(),
            start_time,
            end_time,
            description: None,
            category: Category::Other,
        };

        let restated = EventCandidate::from_event(&event);
        assert_eq!(restated, candidate);
        assert_eq!(event.duration_minutes(), 60);
    }
}
