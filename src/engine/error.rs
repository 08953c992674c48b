use chrono::Weekday;
use ulid::Ulid;

use crate::model::Minutes;
use crate::store::StoreError;
use crate::timefmt::InvalidTimeFormat;

#[derive(Debug)]
pub enum EngineError {
    InvalidTimeFormat(String),
    /// Non-positive length or outside the bounds of what it addresses.
    InvalidInterval { start: Minutes, end: Minutes },
    NotFound(Ulid),
    /// The posting is (or just became) exclusively reserved.
    Conflict(Ulid),
    /// An active booking already covers part of the requested time.
    SlotConflict(Ulid),
    NotAvailableOnDay(Weekday),
    OutsideOperatingHours(Weekday),
    Forbidden(Ulid),
    AlreadyCancelled(Ulid),
    SpotInactive(Ulid),
    Store(StoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidTimeFormat(text) => write!(f, "invalid time format: {text:?}"),
            EngineError::InvalidInterval { start, end } => {
                write!(f, "invalid interval: [{start}, {end})")
            }
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::Conflict(id) => write!(f, "posting already reserved: {id}"),
            EngineError::SlotConflict(id) => {
                write!(f, "time slot already booked by: {id}")
            }
            EngineError::NotAvailableOnDay(day) => {
                write!(f, "spot has no operating hours on {day}")
            }
            EngineError::OutsideOperatingHours(day) => {
                write!(f, "requested time is outside the operating hours for {day}")
            }
            EngineError::Forbidden(id) => write!(f, "not the owner of booking: {id}"),
            EngineError::AlreadyCancelled(id) => write!(f, "booking already cancelled: {id}"),
            EngineError::SpotInactive(id) => write!(f, "spot is not active: {id}"),
            EngineError::Store(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}

impl From<InvalidTimeFormat> for EngineError {
    fn from(e: InvalidTimeFormat) -> Self {
        EngineError::InvalidTimeFormat(e.0)
    }
}
