use tracing::warn;

use crate::model::{Booking, Minutes, OperatingWindow, Span};
use crate::timefmt;

// ── Free-slot subtraction ────────────────────────────────────────

/// Subtract active bookings from a day's operating windows, yielding the
/// still-free sub-intervals.
///
/// One linear sweep per window with a cursor that only moves forward;
/// bookings are processed in start-time order so overlapping demand cannot
/// push the cursor backwards. A row whose time fails to parse is skipped and
/// logged — partial data must not hide the remaining legitimate free time.
/// Slots concatenate in window order and are not re-sorted globally.
pub fn free_slots(windows: &[OperatingWindow], bookings: &[Booking]) -> Vec<Span> {
    let mut demand: Vec<(&Booking, Minutes)> = bookings
        .iter()
        .filter(|b| b.status.is_active())
        .filter_map(|b| match timefmt::parse_minutes(&b.start_time) {
            Ok(start) => Some((b, start)),
            Err(e) => {
                warn!(booking = %b.id, "skipping booking with bad start time: {e}");
                None
            }
        })
        .collect();
    demand.sort_by_key(|(_, start)| *start);

    let mut slots = Vec::new();
    for window in windows {
        let bounds = timefmt::parse_minutes(&window.start_time)
            .and_then(|s| timefmt::parse_minutes(&window.end_time).map(|e| (s, e)));
        let (base_start, base_end) = match bounds {
            Ok(b) => b,
            Err(e) => {
                warn!(window = %window.id, "skipping operating window: {e}");
                continue;
            }
        };

        let mut cursor = base_start;
        for (booking, book_start) in &demand {
            let book_end = match timefmt::parse_minutes(&booking.end_time) {
                Ok(m) => m,
                Err(e) => {
                    warn!(booking = %booking.id, "skipping booking with bad end time: {e}");
                    continue;
                }
            };

            // No intersection with the part of the window still ahead.
            if book_end <= cursor || *book_start >= base_end {
                continue;
            }

            // Clamp to the window so a booking reaching in from before
            // base_start cannot produce a slot outside it.
            let effective_start = cursor.max(base_start);
            let effective_book_start = (*book_start).max(base_start);
            if effective_start < effective_book_start {
                slots.push(Span::new(effective_start, effective_book_start));
            }

            cursor = cursor.max(book_end);
            if cursor >= base_end {
                break;
            }
        }

        if cursor < base_end {
            slots.push(Span::new(cursor, base_end));
        }
    }
    slots
}
