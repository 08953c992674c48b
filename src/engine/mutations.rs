use chrono::{Datelike, NaiveDate, Utc};
use tracing::warn;
use ulid::Ulid;

use crate::model::{
    Booking, BookingStatus, Change, MINUTES_PER_DAY, Minutes, Posting, Span,
};
use crate::timefmt;

use super::calendar::IntervalCalendar;
use super::{Engine, EngineError};

impl Engine {
    /// Carve `[start, end)` out of a posting, exclusively.
    ///
    /// The guarded update is the commit point: once it applies, the
    /// reservation stands even if writing the leftover fragments fails.
    /// Returns the fragments actually inserted.
    pub async fn reserve_subinterval(
        &self,
        posting_id: Ulid,
        start: Minutes,
        end: Minutes,
        reserver_id: Ulid,
    ) -> Result<Vec<Posting>, EngineError> {
        let posting = self
            .store
            .get_posting(posting_id)
            .await?
            .ok_or(EngineError::NotFound(posting_id))?;
        if posting.is_reserved() {
            return Err(EngineError::Conflict(posting_id));
        }
        if start >= end || start < posting.span.start || end > posting.span.end {
            return Err(EngineError::InvalidInterval { start, end });
        }
        let requested = Span::new(start, end);

        // Split the posting's window now; remainder holds the 0–2 leftovers.
        let mut remainder = IntervalCalendar::new();
        remainder.add_available(posting.span.start, posting.span.end);
        let split = remainder.reserve(start, end);
        debug_assert!(split, "posting window must contain the request");

        if !self
            .store
            .conditional_reserve(posting_id, requested, reserver_id)
            .await?
        {
            // Another caller won the race between our read and the update.
            metrics::counter!(crate::observability::RESERVATION_CONFLICTS_TOTAL).increment(1);
            return Err(EngineError::Conflict(posting_id));
        }
        metrics::counter!(crate::observability::RESERVATIONS_TOTAL).increment(1);
        self.notify.send(
            posting_id,
            &Change::PostingReserved {
                id: posting_id,
                span: requested,
                reserved_by: reserver_id,
            },
        );

        let mut fragments = Vec::new();
        for leftover in remainder.spans() {
            match self.store.insert_fragment(&posting, *leftover).await {
                Ok(fragment) => {
                    self.notify.send(
                        posting_id,
                        &Change::FragmentInserted {
                            id: fragment.id,
                            source: posting_id,
                            span: *leftover,
                        },
                    );
                    fragments.push(fragment);
                }
                Err(e) => {
                    // The reservation is already committed; a lost fragment is
                    // recoverable availability data, not a booking failure.
                    warn!(
                        posting = %posting_id,
                        "failed to insert leftover fragment [{}, {}): {e}",
                        leftover.start, leftover.end
                    );
                    metrics::counter!(crate::observability::FRAGMENT_INSERT_FAILURES_TOTAL)
                        .increment(1);
                }
            }
        }
        Ok(fragments)
    }

    /// Book `[start_time, end_time)` on `date`, validating against the
    /// spot's recurring hours and the date's existing active bookings.
    pub async fn create_booking(
        &self,
        spot_id: Ulid,
        date: NaiveDate,
        start_time: &str,
        end_time: &str,
        user_id: Ulid,
    ) -> Result<Booking, EngineError> {
        let spot = self
            .store
            .get_spot(spot_id)
            .await?
            .ok_or(EngineError::NotFound(spot_id))?;
        if !spot.is_active {
            return Err(EngineError::SpotInactive(spot_id));
        }

        let start = timefmt::parse_minutes(start_time)?;
        let end = timefmt::parse_minutes(end_time)?;
        if start >= end || end > MINUTES_PER_DAY {
            return Err(EngineError::InvalidInterval { start, end });
        }
        let requested = Span::new(start, end);

        let day = date.weekday();
        let windows = self.store.operating_windows(spot_id, day).await?;
        if windows.is_empty() {
            return Err(EngineError::NotAvailableOnDay(day));
        }

        // The request must sit inside a single recurring window; a row with
        // unparsable times cannot host it.
        let within = windows.iter().any(|w| {
            matches!(
                (
                    timefmt::parse_minutes(&w.start_time),
                    timefmt::parse_minutes(&w.end_time),
                ),
                (Ok(ws), Ok(we)) if ws <= start && end <= we
            )
        });
        if !within {
            return Err(EngineError::OutsideOperatingHours(day));
        }

        let existing = self
            .store
            .bookings_for_date(spot_id, date, &BookingStatus::ACTIVE)
            .await?;
        for other in &existing {
            let (Ok(other_start), Ok(other_end)) = (
                timefmt::parse_minutes(&other.start_time),
                timefmt::parse_minutes(&other.end_time),
            ) else {
                continue; // malformed row cannot veto the request
            };
            if other_start < other_end && requested.overlaps(&Span::new(other_start, other_end)) {
                metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                return Err(EngineError::SlotConflict(other.id));
            }
        }

        let duration_hours = f64::from(requested.duration_minutes()) / 60.0;
        let booking = Booking {
            id: Ulid::new(),
            spot_id,
            user_id,
            date,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            total_price: duration_hours * spot.price_per_hour,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };
        let created = self.store.insert_booking(booking).await?;
        metrics::counter!(crate::observability::BOOKINGS_TOTAL).increment(1);
        self.notify.send(
            spot_id,
            &Change::BookingCreated {
                id: created.id,
                spot_id,
                date,
                span: requested,
            },
        );
        Ok(created)
    }

    /// Cancellation flips status only. Freed time reappears through the next
    /// availability computation; records are never re-merged.
    pub async fn cancel_booking(
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
        if booking.status == BookingStatus::Cancelled {
            return Err(EngineError::AlreadyCancelled(booking_id));
        }

        let updated = self
            .store
            .update_booking_status(booking_id, BookingStatus::Cancelled)
            .await?
            .ok_or(EngineError::NotFound(booking_id))?;
        metrics::counter!(crate::observability::BOOKINGS_CANCELLED_TOTAL).increment(1);
        self.notify.send(
            booking.spot_id,
            &Change::BookingCancelled {
                id: booking_id,
                spot_id: booking.spot_id,
            },
        );
        Ok(updated)
    }
}
