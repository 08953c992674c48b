use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use ulid::Ulid;

use crate::model::{Booking, BookingStatus, DayAvailability, Minutes, Posting, SlotDisplay, Span};
use crate::timefmt;

use super::availability::free_slots;
use super::{Engine, EngineError};

impl Engine {
    /// Free sub-intervals on `date` after subtracting active bookings from
    /// the weekday's recurring windows. A weekday without windows yields an
    /// empty report, not an error.
    pub async fn availability_for_date(
        &self,
        spot_id: Ulid,
        date: NaiveDate,
    ) -> Result<DayAvailability, EngineError> {
        let started = Instant::now();
        self.store
            .get_spot(spot_id)
            .await?
            .ok_or(EngineError::NotFound(spot_id))?;

        let weekday = date.format("%A").to_string();
        let windows = self
            .store
            .operating_windows(spot_id, date.weekday())
            .await?;
        if windows.is_empty() {
            return Ok(DayAvailability {
                date,
                weekday,
                operating_hours: Vec::new(),
                available_slots: Vec::new(),
            });
        }

        let bookings = self
            .store
            .bookings_for_date(spot_id, date, &BookingStatus::ACTIVE)
            .await?;
        let slots = free_slots(&windows, &bookings);

        let report = DayAvailability {
            date,
            weekday,
            // operating hours pass through exactly as the host stored them
            operating_hours: windows
                .iter()
                .map(|w| SlotDisplay {
                    start_time: w.start_time.clone(),
                    end_time: w.end_time.clone(),
                })
                .collect(),
            available_slots: slots
                .iter()
                .map(|s| SlotDisplay {
                    start_time: timefmt::format_minutes(s.start),
                    end_time: timefmt::format_minutes(s.end),
                })
                .collect(),
        };
        metrics::histogram!(crate::observability::AVAILABILITY_QUERY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        Ok(report)
    }

    /// Unreserved postings on `date` whose window fully contains `[start, end)`.
    pub async fn find_postings(
        &self,
        date: NaiveDate,
        start: Minutes,
        end: Minutes,
    ) -> Result<Vec<Posting>, EngineError> {
        if start >= end {
            return Err(EngineError::InvalidInterval { start, end });
        }
        let wanted = Span::new(start, end);
        let postings = self.store.postings_for_date(date).await?;
        Ok(postings
            .into_iter()
            .filter(|p| !p.is_reserved() && p.span.contains_span(&wanted))
            .collect())
    }

    /// A single booking, restricted to its owner.
    pub async fn get_booking(
        &self,
        booking_id: Ulid,
        requester_id: Ulid,
    ) -> Result<Booking, EngineError> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or(EngineError::NotFound(booking_id))?;
        if booking.user_id != requester_id {
            return Err(EngineError::Forbidden(booking_id));
        }
        Ok(booking)
    }

    /// All of a user's bookings, optionally restricted to one status.
    pub async fn list_bookings(
        &self,
        user_id: Ulid,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, EngineError> {
        let mut bookings = self.store.bookings_for_user(user_id).await?;
        if let Some(status) = status {
            bookings.retain(|b| b.status == status);
        }
        Ok(bookings)
    }
}
