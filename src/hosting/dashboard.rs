use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::local_midnight;
use crate::error::BackendError;
use crate::models::{Reservation, ReservationStatus, BOOKING_LIST};
use crate::probe::{self, FieldProbe};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// Server-computed summary fields, most specific location first. A field no
// probe resolves is derived from the booking list instead.
const THIS_MONTH: FieldProbe = FieldProbe::new(
    "earnings.thisMonth",
    &["/earnings/thisMonth", "/earnings/currentMonth", "/data/earnings/thisMonth"],
);
const LAST_MONTH: FieldProbe = FieldProbe::new(
    "earnings.lastMonth",
    &["/earnings/lastMonth", "/earnings/previousMonth", "/data/earnings/lastMonth"],
);
const YEAR_TOTAL: FieldProbe = FieldProbe::new(
    "earnings.yearTotal",
    &["/earnings/yearTotal", "/earnings/thisYear", "/data/earnings/yearTotal"],
);
const MONTHLY_SERIES: FieldProbe = FieldProbe::new(
    "earnings.monthlySeries",
    &["/earnings/monthlySeries", "/earnings/monthly", "/data/earnings/monthly"],
);
const MONTH_AMOUNT: FieldProbe = FieldProbe::new("amount", &["/amount", "/earnings", "/total", "/value"]);
const MONTH_KEY: FieldProbe = FieldProbe::new("month", &["/month", "/monthNumber", "/label"]);
const TOTAL_EARNINGS: FieldProbe = FieldProbe::new(
    "stats.totalEarnings",
    &["/stats/totalEarnings", "/totalEarnings", "/data/stats/totalEarnings", "/earnings/total"],
);
const ACTIVE_LISTINGS: FieldProbe = FieldProbe::new(
    "stats.activeListings",
    &["/stats/activeListings", "/activeListings", "/data/stats/activeListings", "/listings/active"],
);
const OCCUPANCY_RATE: FieldProbe = FieldProbe::new(
    "stats.occupancyRate",
    &["/stats/occupancyRate", "/occupancyRate", "/data/stats/occupancyRate"],
);
const TOTAL_RESERVATIONS: FieldProbe = FieldProbe::new(
    "stats.totalReservations",
    &["/stats/totalReservations", "/stats/totalBookings", "/totalReservations", "/data/stats/totalReservations"],
);
const AVERAGE_RATING: FieldProbe = FieldProbe::new(
    "stats.averageRating",
    &["/stats/averageRating", "/averageRating", "/data/stats/averageRating", "/rating/average"],
);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEarning {
    /// 1 to 12
    pub month: u32,
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub this_month: f64,
    pub last_month: f64,
    pub year_total: f64,
    /// Always twelve entries, January first
    pub monthly_series: Vec<MonthlyEarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_earnings: f64,
    pub active_listings: u32,
    /// Percent of listing-nights booked this month
    pub occupancy_rate: f64,
    pub total_reservations: u32,
    pub average_rating: f64,
}

/// Host summary cards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub earnings: Earnings,
    pub stats: Stats,
    /// Ascending by check-in
    pub recent_reservations: Vec<Reservation>,
}

impl Dashboard {
    /// The shape rendered when there is no data at all
    pub fn zeroed() -> Self {
        Self {
            earnings: Earnings {
                this_month: 0.0,
                last_month: 0.0,
                year_total: 0.0,
                monthly_series: series(|_| 0.0),
            },
            stats: Stats {
                total_earnings: 0.0,
                active_listings: 0,
                occupancy_rate: 0.0,
                total_reservations: 0,
                average_rating: 0.0,
            },
            recent_reservations: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum DashboardOutcome {
    Ready(Dashboard),
    /// Host onboarding is incomplete; carries the zeroed dashboard
    OnboardingRequired(Dashboard),
    Failed(BackendError),
}

impl DashboardOutcome {
    pub fn dashboard(&self) -> Option<&Dashboard> {
        match self {
            DashboardOutcome::Ready(dashboard) | DashboardOutcome::OnboardingRequired(dashboard) => {
                Some(dashboard)
            }
            DashboardOutcome::Failed(_) => None,
        }
    }
}

/// Folds raw host bookings into [`Dashboard`] figures.
#[derive(Debug, Clone, Copy)]
pub struct DashboardAggregator {
    recent_limit: usize,
}

impl Default for DashboardAggregator {
    fn default() -> Self {
        Self { recent_limit: 5 }
    }
}

impl DashboardAggregator {
    pub fn new(recent_limit: usize) -> Self {
        Self { recent_limit }
    }

    /// Maps a backend response, turning a pending host entitlement into the
    /// zeroed dashboard rather than an error.
    pub fn from_response<Tz: TimeZone>(
        &self,
        response: Result<Value, BackendError>,
        now: &DateTime<Tz>,
    ) -> DashboardOutcome {
        match response {
            Ok(payload) => DashboardOutcome::Ready(self.aggregate(&payload, now)),
            Err(BackendError::AuthorizationPending) => {
                info!("Host entitlement pending, showing empty dashboard");
                DashboardOutcome::OnboardingRequired(Dashboard::zeroed())
            }
            Err(error) => DashboardOutcome::Failed(error),
        }
    }

    /// Month boundaries are taken in the zone of `now`.
    pub fn aggregate<Tz: TimeZone>(&self, payload: &Value, now: &DateTime<Tz>) -> Dashboard {
        let tz = now.timezone();
        let records = probe::records(payload, &BOOKING_LIST);
        let reservations = Reservation::parse_all(payload);
        debug!(records = records.len(), usable = reservations.len(), "Aggregating dashboard");

        let (year, month) = (now.year(), now.month());
        let (last_year, last_month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };

        let reported = MONTHLY_SERIES
            .array(payload)
            .filter(|items| !items.is_empty())
            .map(|items| place_by_month(items));
        let monthly_series = match &reported {
            Some(amounts) => series(|m| amounts[m as usize - 1]),
            None => series(|m| earned_in(&reservations, &tz, year, m)),
        };

        // A reported series only covers this year, so January falls back to bookings
        let last_from_series =
            (reported.is_some() && month > 1).then(|| monthly_series[month as usize - 2].amount);
        let series_total = monthly_series.iter().fold(0.0, |acc, m| acc + m.amount);
        let earnings = Earnings {
            this_month: THIS_MONTH
                .number(payload)
                .unwrap_or(monthly_series[month as usize - 1].amount),
            last_month: LAST_MONTH
                .number(payload)
                .or(last_from_series)
                .unwrap_or_else(|| earned_in(&reservations, &tz, last_year, last_month)),
            year_total: YEAR_TOTAL.number(payload).unwrap_or(series_total),
            monthly_series,
        };

        let active_listings = ACTIVE_LISTINGS
            .number(payload)
            .map(to_count)
            .unwrap_or_else(|| listings_in(&reservations));

        let stats = Stats {
            total_earnings: TOTAL_EARNINGS.number(payload).unwrap_or_else(|| {
                reservations
                    .iter()
                    .filter(|r| r.status.is_earning())
                    .fold(0.0, |acc, r| acc + r.total_amount)
            }),
            active_listings,
            occupancy_rate: OCCUPANCY_RATE
                .number(payload)
                .unwrap_or_else(|| occupancy(&reservations, now, active_listings)),
            total_reservations: TOTAL_RESERVATIONS
                .number(payload)
                .map(to_count)
                .unwrap_or(records.len() as u32),
            average_rating: AVERAGE_RATING
                .number(payload)
                .unwrap_or_else(|| average_rating(&reservations)),
        };

        let now_utc = now.with_timezone(&Utc);
        let mut recent: Vec<Reservation> = reservations
            .into_iter()
            .filter(|r| r.status != ReservationStatus::Cancelled && r.check_out.resolve(&tz) >= now_utc)
            .collect();
        recent.sort_by_key(|r| r.check_in.resolve(&tz));
        recent.truncate(self.recent_limit);

        Dashboard {
            earnings,
            stats,
            recent_reservations: recent,
        }
    }
}

fn series(amount: impl Fn(u32) -> f64) -> Vec<MonthlyEarning> {
    (1..=12)
        .map(|month| MonthlyEarning {
            month,
            label: MONTH_LABELS[month as usize - 1].to_string(),
            amount: amount(month),
        })
        .collect()
}

/// Amounts of a reported series by calendar month. Entries naming their month
/// land there; the others fill by position, and a named entry wins a clash.
fn place_by_month(items: &[Value]) -> [f64; 12] {
    let mut amounts = [0.0; 12];
    let mut named = Vec::new();
    for (position, item) in items.iter().enumerate() {
        let amount = match item {
            Value::Object(_) => MONTH_AMOUNT.number(item),
            other => other.as_f64(),
        };
        let Some(amount) = amount else { continue };
        match MONTH_KEY.parse_with(item, month_index) {
            Some(index) => named.push((index, amount)),
            None if position < 12 => amounts[position] = amount,
            None => debug!(position, "Ignoring series entry past December"),
        }
    }
    for (index, amount) in named {
        amounts[index] = amount;
    }
    amounts
}

/// Zero-based month of `1..=12`, `"3"`, `"Mar"`, `"March"` or `"2024-03"`.
fn month_index(value: &Value) -> Option<usize> {
    let number = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            let month = s.split('-').nth(1).unwrap_or(s);
            month.parse::<u64>().ok().or_else(|| {
                let prefix = s.get(..3)?;
                MONTH_LABELS
                    .iter()
                    .position(|label| label.eq_ignore_ascii_case(prefix))
                    .map(|index| index as u64 + 1)
            })
        }
        _ => None,
    }?;
    (1..=12).contains(&number).then(|| number as usize - 1)
}

fn to_count(value: f64) -> u32 {
    value.max(0.0).round().min(u32::MAX as f64) as u32
}

/// Earning bookings checking in during the given local month
fn earned_in<Tz: TimeZone>(reservations: &[Reservation], tz: &Tz, year: i32, month: u32) -> f64 {
    reservations
        .iter()
        .filter(|r| r.status.is_earning())
        .filter(|r| {
            let local = r.check_in.local(tz);
            local.year() == year && local.month() == month
        })
        .fold(0.0, |acc, r| acc + r.total_amount)
}

/// Distinct properties with at least one non-cancelled booking
fn listings_in(reservations: &[Reservation]) -> u32 {
    let listings: BTreeSet<&str> = reservations
        .iter()
        .filter(|r| r.status != ReservationStatus::Cancelled)
        .map(|r| r.property_id.as_deref().unwrap_or(&r.property_name))
        .collect();
    listings.len() as u32
}

fn occupancy<Tz: TimeZone>(reservations: &[Reservation], now: &DateTime<Tz>, listings: u32) -> f64 {
    if listings == 0 {
        return 0.0;
    }

    let tz = now.timezone();
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1);
    let next = if now.month() == 12 {
        NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)
    };
    let (Some(start), Some(end)) = (
        first.and_then(|d| local_midnight(&tz, d)),
        next.and_then(|d| local_midnight(&tz, d)),
    ) else {
        return 0.0;
    };

    let booked = reservations
        .iter()
        .filter(|r| r.status.is_earning())
        .map(|r| {
            let from = r.check_in.resolve(&tz).max(start);
            let to = r.check_out.resolve(&tz).min(end);
            if to > from {
                (to - from).num_seconds() as f64
            } else {
                0.0
            }
        })
        .fold(0.0, |acc, seconds| acc + seconds);
    let capacity = (end - start).num_seconds() as f64 * f64::from(listings);

    (booked / capacity * 100.0).clamp(0.0, 100.0)
}

fn average_rating(reservations: &[Reservation]) -> f64 {
    let ratings: Vec<f64> = reservations.iter().filter_map(|r| r.rating).collect();
    if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().fold(0.0, |acc, r| acc + r) / ratings.len() as f64
    }
}
