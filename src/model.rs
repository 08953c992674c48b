use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Minutes since midnight — the only time axis the engine computes on.
pub type Minutes = i32;

/// Exclusive upper bound of the minute-of-day axis.
pub const MINUTES_PER_DAY: Minutes = 24 * 60;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Minutes,
    pub end: Minutes,
}

impl Span {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_minutes(&self) -> Minutes {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Lifecycle of a booking row. Cancelled rows stay in the store as history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// The statuses that count as demand when computing free time.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// A concrete, date-scoped claim on part of a spot's time.
///
/// Times are carried in the store's text form (`"9:00am"`, `"17:00"`); they
/// are parsed at the point of use so one malformed row never poisons a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub spot_id: Ulid,
    pub user_id: Ulid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Recurring weekday window during which a spot is nominally open.
/// Immutable once created; the host replaces a spot's windows wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingWindow {
    pub id: Ulid,
    pub spot_id: Ulid,
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
}

/// An exclusively-claimable availability window (whole-record model).
/// Reserving a sub-interval claims the record and spins off fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub id: Ulid,
    pub owner_id: Ulid,
    pub span: Span,
    pub price: f64,
    pub date: NaiveDate,
    pub reserved_by: Option<Ulid>,
}

impl Posting {
    pub fn is_reserved(&self) -> bool {
        self.reserved_by.is_some()
    }
}

/// The spot fields the engine needs: the active flag and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: Ulid,
    pub host_id: Ulid,
    pub price_per_hour: f64,
    pub is_active: bool,
}

/// Record-change notifications — flat, no nesting. This is the NotifyHub payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    PostingReserved {
        id: Ulid,
        span: Span,
        reserved_by: Ulid,
    },
    FragmentInserted {
        id: Ulid,
        source: Ulid,
        span: Span,
    },
    BookingCreated {
        id: Ulid,
        spot_id: Ulid,
        date: NaiveDate,
        span: Span,
    },
    BookingCancelled {
        id: Ulid,
        spot_id: Ulid,
    },
}

// ── Availability query output ────────────────────────────────────

/// One display slot. Computed slots carry the codec's 12-hour form;
/// operating hours pass through exactly as the host stored them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDisplay {
    pub start_time: String,
    pub end_time: String,
}

/// Free time remaining on one date after subtracting active bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub weekday: String,
    pub operating_hours: Vec<SlotDisplay>,
    pub available_slots: Vec<SlotDisplay>,
}
