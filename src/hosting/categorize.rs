use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use super::start_of_day;
use crate::config::ReservationSettings;
use crate::models::{Reservation, ReservationStatus};

/// Mutually exclusive lifecycle bucket of a reservation at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReservationCategory {
    CheckingOut,
    CurrentlyHosting,
    ArrivingSoon,
    Upcoming,
    PendingReview,
}

impl ReservationCategory {
    /// Evaluation order; the first matching predicate wins
    pub const PRECEDENCE: [ReservationCategory; 5] = [
        ReservationCategory::CheckingOut,
        ReservationCategory::CurrentlyHosting,
        ReservationCategory::ArrivingSoon,
        ReservationCategory::Upcoming,
        ReservationCategory::PendingReview,
    ];

    /// Order of buckets in the "all" view
    pub const DISPLAY_ORDER: [ReservationCategory; 5] = [
        ReservationCategory::CurrentlyHosting,
        ReservationCategory::CheckingOut,
        ReservationCategory::ArrivingSoon,
        ReservationCategory::Upcoming,
        ReservationCategory::PendingReview,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ReservationCategory::CheckingOut => "checking-out",
            ReservationCategory::CurrentlyHosting => "currently-hosting",
            ReservationCategory::ArrivingSoon => "arriving-soon",
            ReservationCategory::Upcoming => "upcoming",
            ReservationCategory::PendingReview => "pending-review",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ReservationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Filter tab: one bucket, or everything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservationTab {
    #[default]
    All,
    Category(ReservationCategory),
}

impl FromStr for ReservationTab {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let slug = raw.trim().to_ascii_lowercase().replace('_', "-");
        if slug == "all" {
            return Ok(ReservationTab::All);
        }
        ReservationCategory::PRECEDENCE
            .into_iter()
            .find(|category| category.slug() == slug)
            .map(ReservationTab::Category)
            .ok_or_else(|| format!("unknown reservation tab '{raw}'"))
    }
}

/// Window lengths measured from local midnight of "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryWindows {
    pub checkout: Duration,
    pub arrival: Duration,
}

impl Default for CategoryWindows {
    fn default() -> Self {
        Self::from(&ReservationSettings::default())
    }
}

impl From<&ReservationSettings> for CategoryWindows {
    fn from(settings: &ReservationSettings) -> Self {
        Self {
            checkout: Duration::hours(settings.checkout_window_hours),
            arrival: Duration::hours(settings.arrival_window_hours),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReservationCategorizer {
    windows: CategoryWindows,
}

impl ReservationCategorizer {
    pub fn new(windows: CategoryWindows) -> Self {
        Self { windows }
    }

    /// Bucket of `reservation` at `now`, or `None` for statuses outside the
    /// tabs (pending, cancelled, unknown) and active stays matching no window.
    ///
    /// "Today" is the local day of `now`, so pass `now` in the host's zone.
    /// Stay times sent without a zone are read in that same zone.
    pub fn categorize<Tz: TimeZone>(
        &self,
        reservation: &Reservation,
        now: &DateTime<Tz>,
    ) -> Option<ReservationCategory> {
        let today = start_of_day(now);
        let zone = now.timezone();
        let now = now.with_timezone(&Utc);
        let check_in = reservation.check_in.resolve(&zone);
        let check_out = reservation.check_out.resolve(&zone);
        let within = |instant: DateTime<Utc>, window: Duration| instant >= today && instant < today + window;

        match reservation.status {
            ReservationStatus::Active if within(check_out, self.windows.checkout) => {
                Some(ReservationCategory::CheckingOut)
            }
            ReservationStatus::Active if check_in < now && now < check_out => {
                Some(ReservationCategory::CurrentlyHosting)
            }
            ReservationStatus::Upcoming if within(check_in, self.windows.arrival) => {
                Some(ReservationCategory::ArrivingSoon)
            }
            ReservationStatus::Upcoming => Some(ReservationCategory::Upcoming),
            ReservationStatus::Completed => Some(ReservationCategory::PendingReview),
            _ => None,
        }
    }

    /// Splits `reservations` into buckets, keeping fetch order inside each one.
    pub fn bucket<'a, Tz: TimeZone>(
        &self,
        reservations: &'a [Reservation],
        now: &DateTime<Tz>,
    ) -> CategorizedReservations<'a> {
        let mut categorized = CategorizedReservations::default();
        for reservation in reservations {
            match self.categorize(reservation, now) {
                Some(category) => categorized.buckets[category.index()].push(reservation),
                None => categorized.uncategorized.push(reservation),
            }
        }
        categorized
    }
}

/// Reservations split into filter tabs at one instant
#[derive(Debug, Default)]
pub struct CategorizedReservations<'a> {
    buckets: [Vec<&'a Reservation>; 5],
    uncategorized: Vec<&'a Reservation>,
}

impl<'a> CategorizedReservations<'a> {
    pub fn get(&self, category: ReservationCategory) -> &[&'a Reservation] {
        &self.buckets[category.index()]
    }

    pub fn count(&self, category: ReservationCategory) -> usize {
        self.buckets[category.index()].len()
    }

    /// Reservations in no bucket, in fetch order
    pub fn uncategorized(&self) -> &[&'a Reservation] {
        &self.uncategorized
    }

    /// Buckets in display order, attention-requiring stays first, then the
    /// uncategorized rest.
    pub fn all(&self) -> Vec<&'a Reservation> {
        ReservationCategory::DISPLAY_ORDER
            .iter()
            .flat_map(|category| self.get(*category).iter().copied())
            .chain(self.uncategorized.iter().copied())
            .collect()
    }

    pub fn view(&self, tab: ReservationTab) -> Vec<&'a Reservation> {
        match tab {
            ReservationTab::All => self.all(),
            ReservationTab::Category(category) => self.get(category).to_vec(),
        }
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum::<usize>() + self.uncategorized.len()
    }
}
