//! Scheduling controller.
//!
//! # Responsibility
//! - Apply create/edit/delete/move intents with commit-or-reject semantics.
//! - Own the day-indexed view of the loaded month.
//! - Serve the month-scoped text filter and export.
//!
//! # Invariants
//! - Siblings are re-read from the store before every validation.
//! - Validation runs before any store mutation; a rejected intent changes
//!   neither the store nor the index.
//! - The index is advanced only after the store write succeeded.
//! - Index buckets are ordered by start time and never left empty.

use crate::engine::{validate_event, SchedulingRules, ValidationError};
use crate::export::{export_month, ExportError, ExportFile, ExportFormat};
use crate::model::event::{Event, EventCandidate, EventId};
use crate::repo::event_store::EventStore;
use crate::repo::StoreError;
use crate::time::{first_of_month, shift_month, TimeError};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Day-bucketed view of one month.
pub type DayIndex = BTreeMap<NaiveDate, Vec<Event>>;

/// Coarse error classification for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidFormat,
    EmptyTitle,
    DuplicateTitle,
    InvalidRange,
    TooShort,
    TooLong,
    Overlap,
    NotFound,
    Storage,
    Export,
}

/// Error returned by controller intents.
#[derive(Debug)]
pub enum SchedulingError {
    InvalidFormat(TimeError),
    Validation(ValidationError),
    NotFound(EventId),
    /// Drag-end referenced a position the source bucket does not have.
    DragIndexOutOfRange { day: NaiveDate, index: usize },
    Store(StoreError),
    Export(ExportError),
}

impl SchedulingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::Validation(err) => match err {
                ValidationError::EmptyTitle => ErrorKind::EmptyTitle,
                ValidationError::DuplicateTitle { .. } => ErrorKind::DuplicateTitle,
                ValidationError::InvalidRange { .. } => ErrorKind::InvalidRange,
                ValidationError::TooShort { .. } => ErrorKind::TooShort,
                ValidationError::TooLong { .. } => ErrorKind::TooLong,
                ValidationError::Overlap(_) => ErrorKind::Overlap,
            },
            Self::NotFound(_) | Self::DragIndexOutOfRange { .. } => ErrorKind::NotFound,
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(StoreError::InvalidData(_)) => ErrorKind::InvalidFormat,
            Self::Store(_) => ErrorKind::Storage,
            Self::Export(_) => ErrorKind::Export,
        }
    }
}

impl Display for SchedulingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::DragIndexOutOfRange { day, index } => {
                write!(f, "no event at position {index} on {day}")
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SchedulingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFormat(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::NotFound(_) | Self::DragIndexOutOfRange { .. } => None,
        }
    }
}

impl From<TimeError> for SchedulingError {
    fn from(value: TimeError) -> Self {
        Self::InvalidFormat(value)
    }
}

impl From<ValidationError> for SchedulingError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for SchedulingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<ExportError> for SchedulingError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

/// Controller over an injected event store.
pub struct SchedulingController<S: EventStore> {
    store: S,
    rules: SchedulingRules,
    year: i32,
    month: u32,
    index: DayIndex,
}

impl<S: EventStore> SchedulingController<S> {
    /// Creates a controller and loads `month` (1-12) of `year`.
    pub fn new(store: S, rules: SchedulingRules, year: i32, month: u32) -> SchedulingResult<Self> {
        let mut controller = Self {
            store,
            rules,
            year,
            month,
            index: DayIndex::new(),
        };
        controller.load_month(year, month)?;
        Ok(controller)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &SchedulingRules {
        &self.rules
    }

    /// Loaded `(year, month)`.
    pub fn month(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    pub fn day_index(&self) -> &DayIndex {
        &self.index
    }

    /// Events on `day`, ordered by start; empty when the day has none.
    pub fn events_for_day(&self, day: NaiveDate) -> &[Event] {
        self.index.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All loaded events, by day then start time.
    pub fn month_events(&self) -> Vec<Event> {
        self.index.values().flatten().cloned().collect()
    }

    /// Rebuilds the index for another month. On error the current view stays.
    pub fn load_month(&mut self, year: i32, month: u32) -> SchedulingResult<()> {
        first_of_month(year, month)?;
        let events = self.store.list_for_month(year, month)?;

        let mut index = DayIndex::new();
        for event in events {
            index.entry(event.day()).or_default().push(event);
        }
        for bucket in index.values_mut() {
            sort_bucket(bucket);
        }

        info!(
            "event=month_load module=service status=ok year={year} month={month} days={}",
            index.len()
        );
        self.year = year;
        self.month = month;
        self.index = index;
        Ok(())
    }

    pub fn previous_month(&mut self) -> SchedulingResult<()> {
        let (year, month) = shift_month(self.year, self.month, -1)?;
        self.load_month(year, month)
    }

    pub fn next_month(&mut self) -> SchedulingResult<()> {
        let (year, month) = shift_month(self.year, self.month, 1)?;
        self.load_month(year, month)
    }

    /// Validates and stores a new event.
    pub fn create(&mut self, candidate: &EventCandidate) -> SchedulingResult<Event> {
        let event = self.validate("create", candidate)?;
        self.store.insert(&event)?;
        self.index_insert(event.clone());
        info!("event=schedule module=service status=ok op=create");
        Ok(event)
    }

    /// Re-validates and replaces an existing event (same id).
    pub fn edit(&mut self, candidate: &EventCandidate) -> SchedulingResult<Event> {
        if self.store.get(&candidate.id)?.is_none() {
            return Err(SchedulingError::NotFound(candidate.id.clone()));
        }
        let event = self.validate("edit", candidate)?;
        self.store.replace(&candidate.id, &event)?;
        self.index_remove(&event.id);
        self.index_insert(event.clone());
        info!("event=schedule module=service status=ok op=edit");
        Ok(event)
    }

    /// Removes an event; unknown ids are a no-op.
    pub fn delete(&mut self, id: &EventId) -> SchedulingResult<()> {
        self.store.remove(id)?;
        let removed = self.index_remove(id).is_some();
        info!("event=schedule module=service status=ok op=delete indexed={removed}");
        Ok(())
    }

    /// Moves an event to `destination_day`, keeping its wall-clock times.
    ///
    /// Dropping onto the source day returns the event unchanged.
    pub fn move_event(
        &mut self,
        id: &EventId,
        source_day: NaiveDate,
        destination_day: NaiveDate,
    ) -> SchedulingResult<Event> {
        let event = self
            .store
            .get(id)?
            .filter(|event| event.day() == source_day)
            .ok_or_else(|| SchedulingError::NotFound(id.clone()))?;
        if source_day == destination_day {
            return Ok(event);
        }

        let candidate = EventCandidate::from_event(&event).on_day(destination_day);
        let moved = self.validate("move", &candidate)?;
        self.store.replace(id, &moved)?;
        self.index_remove(id);
        self.index_insert(moved.clone());
        info!("event=schedule module=service status=ok op=move");
        Ok(moved)
    }

    /// Drag-end intent: the event at `index` in the source day's bucket.
    pub fn drop_dragged(
        &mut self,
        source_day: NaiveDate,
        index: usize,
        destination_day: NaiveDate,
    ) -> SchedulingResult<Event> {
        let id = self
            .index
            .get(&source_day)
            .and_then(|bucket| bucket.get(index))
            .map(|event| event.id.clone())
            .ok_or(SchedulingError::DragIndexOutOfRange {
                day: source_day,
                index,
            })?;
        self.move_event(&id, source_day, destination_day)
    }

    /// Case-insensitive title/description search over the loaded month.
    ///
    /// `text` is matched verbatim, whitespace included; empty text matches
    /// every event.
    pub fn filter(&self, text: &str) -> Vec<Event> {
        let needle = text.to_lowercase();
        self.index
            .values()
            .flatten()
            .filter(|event| event.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    /// Exports the loaded month.
    pub fn export(&self, format: ExportFormat) -> SchedulingResult<ExportFile> {
        Ok(export_month(
            &self.month_events(),
            self.year,
            self.month,
            format,
        )?)
    }

    fn validate(&self, op: &str, candidate: &EventCandidate) -> SchedulingResult<Event> {
        let siblings = self.store.list_for_day(candidate.day)?;
        validate_event(candidate, &siblings, &self.rules).map_err(|err| {
            let err = SchedulingError::from(err);
            warn!(
                "event=schedule module=service status=rejected op={op} reason={:?}",
                err.kind()
            );
            err
        })
    }

    fn in_loaded_month(&self, day: NaiveDate) -> bool {
        day.year() == self.year && day.month() == self.month
    }

    fn index_insert(&mut self, event: Event) {
        if !self.in_loaded_month(event.day()) {
            return;
        }
        let bucket = self.index.entry(event.day()).or_default();
        bucket.push(event);
        sort_bucket(bucket);
    }

    fn index_remove(&mut self, id: &EventId) -> Option<Event> {
        let (day, position) = self.index.iter().find_map(|(day, bucket)| {
            bucket
                .iter()
                .position(|event| &event.id == id)
                .map(|position| (*day, position))
        })?;
        let bucket = self.index.get_mut(&day)?;
        let removed = bucket.remove(position);
        if bucket.is_empty() {
            self.index.remove(&day);
        }
        Some(removed)
    }
}

fn sort_bucket(bucket: &mut [Event]) {
    bucket.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
}
