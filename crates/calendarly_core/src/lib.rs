//! Core scheduling logic for Calendarly.
//! This crate is the single source of truth for calendar invariants: every
//! create, edit and drag-move is decided by one validation engine before
//! anything is persisted.

pub mod config;
pub mod db;
pub mod engine;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod time;

pub use engine::{validate_event, Conflict, SchedulingRules, ValidationError};
pub use export::{export_events, export_file_name, ExportError, ExportFile, ExportFormat};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Category, Event, EventCandidate, EventId};
pub use repo::event_store::{EventStore, KvEventStore};
pub use repo::kv::{KvBackend, MemoryKv, SqliteKv};
pub use repo::{StoreError, StoreResult};
pub use service::filter::FilterDebouncer;
pub use service::scheduling_service::{
    DayIndex, ErrorKind, SchedulingController, SchedulingError, SchedulingResult,
};
pub use time::{
    days_in_month, first_weekday_of_month, format_minutes, format_minutes_12h,
    intervals_overlap, minutes_since_midnight, month_grid, Meridiem, TimeError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
