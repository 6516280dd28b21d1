//! Persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the `EventStore` contract the scheduling controller depends on.
//! - Keep the key-value blob format inside the persistence boundary.
//!
//! # Invariants
//! - The persisted collection is flat; day/month views are computed on read.
//! - Read paths reject invalid persisted records instead of masking them.

pub mod event_store;
pub mod kv;

use crate::db::DbError;
use crate::model::event::EventId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for event persistence and decoding.
#[derive(Debug)]
pub enum StoreError {
    /// `replace` targeted an id that is not stored.
    NotFound(EventId),
    /// `insert` used an id that is already stored.
    DuplicateId(EventId),
    /// Persisted blob or record could not be decoded.
    InvalidData(String),
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::DuplicateId(id) => write!(f, "event id already stored: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted event data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
