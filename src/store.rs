use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{Booking, BookingStatus, OperatingWindow, Posting, Span, Spot};

/// Collaborator I/O failure. The engine surfaces it as-is; it never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// The backing-store contract the engine coordinates against.
///
/// `conditional_reserve` is the only concurrency control in the system: it
/// must apply atomically against the expected unreserved state, so a lost
/// race surfaces as `false` instead of a double booking. Everything else is
/// plain record read/write.
#[async_trait]
pub trait SpotStore: Send + Sync {
    async fn get_spot(&self, id: Ulid) -> Result<Option<Spot>, StoreError>;

    async fn get_posting(&self, id: Ulid) -> Result<Option<Posting>, StoreError>;

    async fn postings_for_date(&self, date: NaiveDate) -> Result<Vec<Posting>, StoreError>;

    /// Mark the posting reserved by `reserver_id` with the requested bounds,
    /// only if it is still unreserved. Returns whether the update applied.
    async fn conditional_reserve(
        &self,
        id: Ulid,
        span: Span,
        reserver_id: Ulid,
    ) -> Result<bool, StoreError>;

    /// Insert a new unreserved posting cut from `template`'s window.
    async fn insert_fragment(
        &self,
        template: &Posting,
        span: Span,
    ) -> Result<Posting, StoreError>;

    async fn operating_windows(
        &self,
        spot_id: Ulid,
        day: Weekday,
    ) -> Result<Vec<OperatingWindow>, StoreError>;

    async fn bookings_for_date(
        &self,
        spot_id: Ulid,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<Vec<Booking>, StoreError>;

    async fn bookings_for_user(&self, user_id: Ulid) -> Result<Vec<Booking>, StoreError>;

    async fn get_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError>;

    async fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError>;

    async fn update_booking_status(
        &self,
        id: Ulid,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError>;
}

/// DashMap-backed store: the reference implementation and the test fake.
///
/// Each map entry guard doubles as the row lock, which is what makes
/// `conditional_reserve` an honest compare-and-swap.
#[derive(Default)]
pub struct InMemoryStore {
    spots: DashMap<Ulid, Spot>,
    postings: DashMap<Ulid, Posting>,
    windows: DashMap<Ulid, Vec<OperatingWindow>>,
    bookings: DashMap<Ulid, Booking>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ──────────────────────────────────────────

    pub fn insert_spot(&self, spot: Spot) {
        self.spots.insert(spot.id, spot);
    }

    pub fn insert_posting(&self, posting: Posting) {
        self.postings.insert(posting.id, posting);
    }

    pub fn add_operating_window(&self, window: OperatingWindow) {
        self.windows.entry(window.spot_id).or_default().push(window);
    }

    /// Host edits replace a spot's recurring windows wholesale.
    pub fn replace_operating_windows(&self, spot_id: Ulid, windows: Vec<OperatingWindow>) {
        self.windows.insert(spot_id, windows);
    }

    pub fn posting_count(&self) -> usize {
        self.postings.len()
    }
}

#[async_trait]
impl SpotStore for InMemoryStore {
    async fn get_spot(&self, id: Ulid) -> Result<Option<Spot>, StoreError> {
        Ok(self.spots.get(&id).map(|e| e.value().clone()))
    }

    async fn get_posting(&self, id: Ulid) -> Result<Option<Posting>, StoreError> {
        Ok(self.postings.get(&id).map(|e| e.value().clone()))
    }

    async fn postings_for_date(&self, date: NaiveDate) -> Result<Vec<Posting>, StoreError> {
        let mut rows: Vec<Posting> = self
            .postings
            .iter()
            .filter(|e| e.value().date == date)
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by_key(|p| (p.span.start, p.id));
        Ok(rows)
    }

    async fn conditional_reserve(
        &self,
        id: Ulid,
        span: Span,
        reserver_id: Ulid,
    ) -> Result<bool, StoreError> {
        let Some(mut posting) = self.postings.get_mut(&id) else {
            return Ok(false);
        };
        if posting.reserved_by.is_some() {
            return Ok(false);
        }
        posting.span = span;
        posting.reserved_by = Some(reserver_id);
        Ok(true)
    }

    async fn insert_fragment(
        &self,
        template: &Posting,
        span: Span,
    ) -> Result<Posting, StoreError> {
        let fragment = Posting {
            id: Ulid::new(),
            owner_id: template.owner_id,
            span,
            price: template.price,
            date: template.date,
            reserved_by: None,
        };
        self.postings.insert(fragment.id, fragment.clone());
        Ok(fragment)
    }

    async fn operating_windows(
        &self,
        spot_id: Ulid,
        day: Weekday,
    ) -> Result<Vec<OperatingWindow>, StoreError> {
        Ok(self
            .windows
            .get(&spot_id)
            .map(|e| e.iter().filter(|w| w.day == day).cloned().collect())
            .unwrap_or_default())
    }

    async fn bookings_for_date(
        &self,
        spot_id: Ulid,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<Vec<Booking>, StoreError> {
        let mut rows: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| {
                let b = e.value();
                b.spot_id == spot_id && b.date == date && statuses.contains(&b.status)
            })
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by_key(|b| b.id);
        Ok(rows)
    }

    async fn bookings_for_user(&self, user_id: Ulid) -> Result<Vec<Booking>, StoreError> {
        let mut rows: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by_key(|b| b.id);
        Ok(rows)
    }

    async fn get_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update_booking_status(
        &self,
        id: Ulid,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let Some(mut booking) = self.bookings.get_mut(&id) else {
            return Ok(None);
        };
        booking.status = status;
        Ok(Some(booking.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};

    use super::*;

    fn posting(span: Span) -> Posting {
        Posting {
            id: Ulid::new(),
            owner_id: Ulid::new(),
            span,
            price: 2.5,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            reserved_by: None,
        }
    }

    fn booking(spot_id: Ulid, user_id: Ulid, status: BookingStatus) -> Booking {
        Booking {
            id: Ulid::new(),
            spot_id,
            user_id,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: "9:00am".into(),
            end_time: "11:00am".into(),
            total_price: 5.0,
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn conditional_reserve_applies_once() {
        let store = InMemoryStore::new();
        let p = posting(Span::new(0, 600));
        store.insert_posting(p.clone());

        let renter = Ulid::new();
        assert!(store
            .conditional_reserve(p.id, Span::new(100, 200), renter)
            .await
            .unwrap());
        // second attempt sees the reserved state and refuses
        assert!(!store
            .conditional_reserve(p.id, Span::new(300, 400), Ulid::new())
            .await
            .unwrap());

        let stored = store.get_posting(p.id).await.unwrap().unwrap();
        assert_eq!(stored.reserved_by, Some(renter));
        assert_eq!(stored.span, Span::new(100, 200));
    }

    #[tokio::test]
    async fn conditional_reserve_missing_posting_is_false() {
        let store = InMemoryStore::new();
        assert!(!store
            .conditional_reserve(Ulid::new(), Span::new(0, 10), Ulid::new())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn concurrent_reserves_have_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let p = posting(Span::new(0, 600));
        store.insert_posting(p.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let id = p.id;
            handles.push(tokio::spawn(async move {
                store
                    .conditional_reserve(id, Span::new(60, 120), Ulid::new())
                    .await
                    .unwrap()
            }));
        }
        let mut wins = 0;
        for h in handles {
            if h.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn fragment_inherits_template_fields() {
        let store = InMemoryStore::new();
        let p = posting(Span::new(0, 600));
        let fragment = store
            .insert_fragment(&p, Span::new(0, 100))
            .await
            .unwrap();
        assert_ne!(fragment.id, p.id);
        assert_eq!(fragment.owner_id, p.owner_id);
        assert_eq!(fragment.price, p.price);
        assert_eq!(fragment.date, p.date);
        assert!(!fragment.is_reserved());

        let listed = store.postings_for_date(p.date).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn windows_filter_by_day() {
        let store = InMemoryStore::new();
        let spot_id = Ulid::new();
        for (day, start, end) in [
            (Weekday::Mon, "9:00am", "12:00pm"),
            (Weekday::Mon, "2:00pm", "5:00pm"),
            (Weekday::Tue, "9:00am", "5:00pm"),
        ] {
            store.add_operating_window(OperatingWindow {
                id: Ulid::new(),
                spot_id,
                day,
                start_time: start.into(),
                end_time: end.into(),
            });
        }

        assert_eq!(
            store.operating_windows(spot_id, Weekday::Mon).await.unwrap().len(),
            2
        );
        assert_eq!(
            store.operating_windows(spot_id, Weekday::Wed).await.unwrap().len(),
            0
        );

        store.replace_operating_windows(spot_id, Vec::new());
        assert_eq!(
            store.operating_windows(spot_id, Weekday::Mon).await.unwrap().len(),
            0
        );
    }

    #[tokio::test]
    async fn bookings_filter_by_spot_date_status() {
        let store = InMemoryStore::new();
        let spot_id = Ulid::new();
        let user_id = Ulid::new();
        store
            .insert_booking(booking(spot_id, user_id, BookingStatus::Confirmed))
            .await
            .unwrap();
        store
            .insert_booking(booking(spot_id, user_id, BookingStatus::Cancelled))
            .await
            .unwrap();
        store
            .insert_booking(booking(Ulid::new(), user_id, BookingStatus::Pending))
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let active = store
            .bookings_for_date(spot_id, date, &BookingStatus::ACTIVE)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].status, BookingStatus::Confirmed);

        let mine = store.bookings_for_user(user_id).await.unwrap();
        assert_eq!(mine.len(), 3);
    }

    #[tokio::test]
    async fn update_status_missing_booking_is_none() {
        let store = InMemoryStore::new();
        let updated = store
            .update_booking_status(Ulid::new(), BookingStatus::Cancelled)
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
