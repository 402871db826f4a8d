use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{info, warn};

use super::categorize::{CategorizedReservations, ReservationCategorizer};
use super::traits::BookingSource;
use crate::error::BackendError;
use crate::models::Reservation;

/// Read-only client copy of the host's reservations, refreshed on demand
#[derive(Debug, Clone, Default)]
pub struct ReservationBook {
    reservations: Vec<Reservation>,
    fetched_at: Option<DateTime<Utc>>,
}

impl ReservationBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book holding a snapshot that was fetched at `fetched_at`.
    pub fn from_payload(payload: &Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            reservations: Reservation::parse_all(payload),
            fetched_at: Some(fetched_at),
        }
    }

    /// Replaces the cached copy with a fresh fetch stamped `now`. A pending
    /// host entitlement empties the book; any other failure keeps the
    /// previous copy and its stamp.
    pub async fn refresh<S: BookingSource + ?Sized>(
        &mut self,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<usize, BackendError> {
        match source.host_bookings().await {
            Ok(payload) => {
                self.reservations = Reservation::parse_all(&payload);
                self.fetched_at = Some(now);
                info!(count = self.reservations.len(), "Reservation book refreshed");
                Ok(self.reservations.len())
            }
            Err(BackendError::AuthorizationPending) => {
                info!("Host entitlement pending, reservation book is empty");
                self.reservations.clear();
                self.fetched_at = Some(now);
                Ok(0)
            }
            Err(error) => {
                warn!(error = %error, "Reservation refresh failed, keeping cached copy");
                Err(error)
            }
        }
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn categorize<Tz: TimeZone>(
        &self,
        categorizer: &ReservationCategorizer,
        now: &DateTime<Tz>,
    ) -> CategorizedReservations<'_> {
        categorizer.bucket(&self.reservations, now)
    }
}
