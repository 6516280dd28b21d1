//! Core defaults shared by engine, store, filter and logging.
//!
//! There is no configuration file; hosts override scheduling bounds by
//! injecting their own `SchedulingRules` into the controller.

/// Shortest accepted event, in minutes.
pub const DEFAULT_MIN_DURATION_MINUTES: u32 = 30;
/// Longest accepted event, in minutes.
pub const DEFAULT_MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Quiet period before a filter keystroke is applied.
pub const FILTER_DEBOUNCE_MS: u64 = 300;

/// Key of the event collection inside the key-value backend.
pub const EVENTS_STORAGE_KEY: &str = "calendar_events";

/// Default SQLite file used by hosts that do not pass an explicit path.
pub const DEFAULT_DB_FILE_NAME: &str = "calendarly.sqlite3";
