pub mod book;
pub mod categorize;
pub mod dashboard;
pub mod traits;

pub use book::ReservationBook;
pub use categorize::{
    CategorizedReservations, CategoryWindows, ReservationCategorizer, ReservationCategory,
    ReservationTab,
};
pub use dashboard::{Dashboard, DashboardAggregator, DashboardOutcome, Earnings, MonthlyEarning, Stats};
pub use traits::BookingSource;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};

/// Midnight starting `date` in `tz`. Falls back to the earliest valid local
/// time when midnight is skipped by a DST change.
pub(crate) fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    (0..=2)
        .filter_map(|hour| tz.from_local_datetime(&midnight.with_hour(hour)?).earliest())
        .map(|local| local.with_timezone(&Utc))
        .next()
}

/// Start of the local day containing `now`
pub(crate) fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    local_midnight(&now.timezone(), now.date_naive()).unwrap_or_else(|| {
        let elapsed = now.time().num_seconds_from_midnight();
        now.with_timezone(&Utc) - chrono::Duration::seconds(i64::from(elapsed))
    })
}
