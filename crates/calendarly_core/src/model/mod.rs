//! Calendar domain model.
//!
//! # Responsibility
//! - Define the committed `Event` record and the unvalidated `EventCandidate`.
//! - Keep category values a closed set.
//!
//! # Invariants
//! - An `Event` only exists after engine validation or a checked store decode.
//! - Event identity (`EventId`) is stable across edit and move.

pub mod event;
