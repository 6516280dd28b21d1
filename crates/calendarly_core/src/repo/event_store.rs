//! Event store contract and its key-value implementation.
//!
//! # Responsibility
//! - Provide flat CRUD over the full event collection.
//! - Compute day and month views on read.
//!
//! # Invariants
//! - The collection is persisted as one JSON array of flat records under
//!   `EVENTS_STORAGE_KEY`.
//! - Writes normalize timestamps to `YYYY-MM-DDTHH:MM:SS` and sort by start.
//! - Unknown categories and malformed timestamps fail decoding.
//! - `remove` of an absent id is a no-op; `replace` of one is `NotFound`.

use super::kv::KvBackend;
use super::{StoreError, StoreResult};
use crate::config::EVENTS_STORAGE_KEY;
use crate::model::event::{Category, Event, EventId};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Persistence contract for calendar events.
pub trait EventStore {
    /// Every stored event, ordered by start time.
    fn list(&self) -> StoreResult<Vec<Event>>;
    /// Events whose start falls in `month` (1-12) of `year`.
    fn list_for_month(&self, year: i32, month: u32) -> StoreResult<Vec<Event>>;
    /// Events whose start falls on `day`.
    fn list_for_day(&self, day: NaiveDate) -> StoreResult<Vec<Event>>;
    fn get(&self, id: &EventId) -> StoreResult<Option<Event>>;
    fn insert(&self, event: &Event) -> StoreResult<()>;
    fn replace(&self, id: &EventId, event: &Event) -> StoreResult<()>;
    fn remove(&self, id: &EventId) -> StoreResult<()>;
}

/// Flat wire record, as stored in the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    id: EventId,
    title: String,
    start_time: String,
    end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    category: String,
}

/// Event store serializing the whole collection into one key-value entry.
pub struct KvEventStore<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> KvEventStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn load(&self) -> StoreResult<Vec<Event>> {
        let Some(blob) = self.backend.read(EVENTS_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        if blob.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<EventRecord> = serde_json::from_str(&blob)
            .map_err(|err| StoreError::InvalidData(format!("event blob: {err}")))?;
        let mut events = records
            .into_iter()
            .map(decode_record)
            .collect::<StoreResult<Vec<_>>>()?;
        sort_by_start(&mut events);
        Ok(events)
    }

    fn save(&self, op: &str, mut events: Vec<Event>) -> StoreResult<()> {
        sort_by_start(&mut events);
        let records = events.iter().map(encode_record).collect::<Vec<_>>();
        let blob = serde_json::to_string(&records)
            .map_err(|err| StoreError::InvalidData(format!("encode event blob: {err}")))?;
        self.backend.write(EVENTS_STORAGE_KEY, &blob)?;
        info!(
            "event=store_write module=repo status=ok op={op} count={}",
            records.len()
        );
        Ok(())
    }

    fn list_where(&self, keep: impl Fn(&Event) -> bool) -> StoreResult<Vec<Event>> {
        Ok(self.load()?.into_iter().filter(|e| keep(e)).collect())
    }
}

impl<B: KvBackend> EventStore for KvEventStore<B> {
    fn list(&self) -> StoreResult<Vec<Event>> {
        self.load()
    }

    fn list_for_month(&self, year: i32, month: u32) -> StoreResult<Vec<Event>> {
        self.list_where(|e| e.start_time.year() == year && e.start_time.month() == month)
    }

    fn list_for_day(&self, day: NaiveDate) -> StoreResult<Vec<Event>> {
        self.list_where(|e| e.day() == day)
    }

    fn get(&self, id: &EventId) -> StoreResult<Option<Event>> {
        Ok(self.load()?.into_iter().find(|e| &e.id == id))
    }

    fn insert(&self, event: &Event) -> StoreResult<()> {
        let mut events = self.load()?;
        if events.iter().any(|e| e.id == event.id) {
            return Err(StoreError::DuplicateId(event.id.clone()));
        }
        events.push(event.clone());
        self.save("insert", events)
    }

    fn replace(&self, id: &EventId, event: &Event) -> StoreResult<()> {
        let mut events = self.load()?;
        if event.id != *id && events.iter().any(|e| e.id == event.id) {
            return Err(StoreError::DuplicateId(event.id.clone()));
        }
        let slot = events
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        *slot = event.clone();
        self.save("replace", events)
    }

    fn remove(&self, id: &EventId) -> StoreResult<()> {
        let events = self.load()?;
        let before = events.len();
        let kept = events.into_iter().filter(|e| &e.id != id).collect::<Vec<_>>();
        if kept.len() == before {
            debug!("event=store_write module=repo status=skipped op=remove reason=absent");
            return Ok(());
        }
        self.save("remove", kept)
    }
}

fn sort_by_start(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn encode_record(event: &Event) -> EventRecord {
    EventRecord {
        id: event.id.clone(),
        title: event.title.clone(),
        start_time: event.start_time.format(TIMESTAMP_FORMAT).to_string(),
        end_time: event.end_time.format(TIMESTAMP_FORMAT).to_string(),
        description: event.description.clone(),
        category: event.category.as_str().to_string(),
    }
}

fn decode_record(record: EventRecord) -> StoreResult<Event> {
    let category = record
        .category
        .parse::<Category>()
        .map_err(|message| StoreError::InvalidData(format!("event `{}`: {message}", record.id)))?;
    let start_time = parse_timestamp(&record.start_time)?;
    let end_time = parse_timestamp(&record.end_time)?;

    if record.title.trim().is_empty() {
        return Err(StoreError::InvalidData(format!(
            "event `{}` has a blank title",
            record.id
        )));
    }
    if end_time <= start_time {
        return Err(StoreError::InvalidData(format!(
            "event `{}` ends ({end_time}) before it starts ({start_time})",
            record.id
        )));
    }

    Ok(Event {
        id: record.id,
        title: record.title,
        start_time,
        end_time,
        description: record.description.filter(|text| !text.is_empty()),
        category,
    })
}

/// Accepts the normalized naive form and RFC 3339 strings with an offset,
/// which are converted to local wall-clock time.
fn parse_timestamp(value: &str) -> StoreResult<NaiveDateTime> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Local).naive_local())
        .map_err(|_| StoreError::InvalidData(format!("invalid timestamp `{value}`")))
}

#[cfg(test)]
mod tests {
    use super::{decode_record, encode_record, parse_timestamp, EventRecord};
    use crate::model::event::EventId;
    use crate::repo::StoreError;

    fn record(category: &str, start: &str, end: &str) -> EventRecord {
        EventRecord {
            id: EventId::from("1700000000000"),
            title: "Standup".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            description: None,
            category: category.to_string(),
        }
    }

    #[test]
    fn decode_rejects_unknown_category() {
        let err = decode_record(record("meeting", "2024-03-04T09:00:00", "2024-03-04T10:00:00"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(message) if message.contains("meeting")));
    }

    #[test]
    fn decode_rejects_reversed_window() {
        let err = decode_record(record("work", "2024-03-04T10:00:00", "2024-03-04T09:00:00"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn encode_normalizes_fractional_seconds_away() {
        let event = decode_record(record(
            "work",
            "2024-03-04T09:00:00.000",
            "2024-03-04T10:00:00",
        ))
        .unwrap();
        let encoded = encode_record(&event);
        assert_eq!(encoded.start_time, "2024-03-04T09:00:00");
        assert_eq!(encoded.end_time, "2024-03-04T10:00:00");
    }

    #[test]
    fn parse_timestamp_accepts_offset_form() {
        assert!(parse_timestamp("2024-03-04T09:00:00.000Z").is_ok());
        assert!(parse_timestamp("2024-03-04T09:00:00+02:00").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
