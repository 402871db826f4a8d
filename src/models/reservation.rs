use std::cmp::Ordering;

use chrono::Utc;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::StayTime;
use crate::probe::{self, FieldProbe};

pub const UNKNOWN_GUEST: &str = "Guest";
pub const UNKNOWN_PROPERTY: &str = "Property";

pub(crate) const BOOKING_LIST: FieldProbe = FieldProbe::new(
    "bookings",
    &["/bookings", "/data/bookings", "/data", "/reservations", "/results"],
);

const ID: FieldProbe = FieldProbe::new("id", &["/id", "/_id", "/bookingId", "/reservationId"]);
const GUEST_NAME: FieldProbe = FieldProbe::new(
    "guestName",
    &["/guest/name", "/guest/fullName", "/guestName", "/user/name", "/guest/email"],
);
const PROPERTY_NAME: FieldProbe = FieldProbe::new(
    "propertyName",
    &["/property/title", "/property/name", "/propertyName", "/listing/title"],
);
const PROPERTY_ID: FieldProbe = FieldProbe::new(
    "propertyId",
    &["/property/id", "/property/_id", "/propertyId", "/listing/id"],
);
const CHECK_IN: FieldProbe = FieldProbe::new(
    "checkIn",
    &["/checkIn", "/check_in", "/checkInDate", "/startDate", "/dates/checkIn"],
);
const CHECK_OUT: FieldProbe = FieldProbe::new(
    "checkOut",
    &["/checkOut", "/check_out", "/checkOutDate", "/endDate", "/dates/checkOut"],
);
const STATUS: FieldProbe = FieldProbe::new("status", &["/status", "/bookingStatus"]);
const TOTAL_AMOUNT: FieldProbe = FieldProbe::new(
    "totalAmount",
    &["/totalAmount", "/totalPrice", "/pricing/total", "/payment/amount", "/amount"],
);
const IS_PAID: FieldProbe = FieldProbe::new(
    "isPaid",
    &["/isPaid", "/paid", "/payment/isPaid", "/payment/paid"],
);
const PAYMENT_STATUS: FieldProbe = FieldProbe::new(
    "paymentStatus",
    &["/paymentStatus", "/payment/status"],
);
const RATING: FieldProbe = FieldProbe::new("rating", &["/review/rating", "/guestRating", "/rating"]);

/// Coarse lifecycle status reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Pending,
    Active,
    Upcoming,
    Completed,
    Cancelled,
    /// Any status string outside the known five, kept verbatim
    Other(String),
}

impl ReservationStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(|c: char| c == '-' || c == ' ', "_");
        match normalized.as_str() {
            "pending" | "requested" | "awaiting_approval" => Self::Pending,
            "active" | "checked_in" | "in_progress" | "ongoing" => Self::Active,
            "upcoming" | "confirmed" | "accepted" | "approved" => Self::Upcoming,
            "completed" | "checked_out" | "finished" => Self::Completed,
            "cancelled" | "canceled" | "declined" | "rejected" => Self::Cancelled,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Statuses whose amount counts towards host earnings
    pub fn is_earning(&self) -> bool {
        matches!(self, Self::Active | Self::Upcoming | Self::Completed)
    }
}

impl Serialize for ReservationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ReservationError {
    #[error("booking {id} has no usable {field}")]
    MissingField { id: String, field: &'static str },

    #[error("booking {id} checks out at {check_out} which is not after check-in {check_in}")]
    InvertedStay {
        id: String,
        check_in: StayTime,
        check_out: StayTime,
    },
}

/// Read-only client copy of a backend booking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub guest_name: String,
    pub property_name: String,
    pub property_id: Option<String>,
    pub check_in: StayTime,
    pub check_out: StayTime,
    pub status: ReservationStatus,
    pub total_amount: f64,
    pub is_paid: bool,
    pub rating: Option<f64>,
}

impl Reservation {
    /// Creates an unpaid, zero-amount reservation. Fails unless `check_out > check_in`.
    pub fn new(
        id: impl Into<String>,
        check_in: impl Into<StayTime>,
        check_out: impl Into<StayTime>,
        status: ReservationStatus,
    ) -> Result<Self, ReservationError> {
        let id = id.into();
        let (check_in, check_out) = (check_in.into(), check_out.into());
        if check_out.cmp_unzoned(&check_in) != Ordering::Greater {
            return Err(ReservationError::InvertedStay {
                id,
                check_in,
                check_out,
            });
        }

        Ok(Self {
            id,
            guest_name: UNKNOWN_GUEST.to_string(),
            property_name: UNKNOWN_PROPERTY.to_string(),
            property_id: None,
            check_in,
            check_out,
            status,
            total_amount: 0.0,
            is_paid: false,
            rating: None,
        })
    }

    pub fn with_guest(mut self, guest_name: impl Into<String>) -> Self {
        self.guest_name = guest_name.into();
        self
    }

    pub fn with_property(mut self, property_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.property_id = Some(property_id.into());
        self.property_name = name.into();
        self
    }

    pub fn with_amount(mut self, total_amount: f64, is_paid: bool) -> Self {
        self.total_amount = total_amount;
        self.is_paid = is_paid;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Builds a reservation from a booking record whose nested guest and
    /// property objects may be partial or absent.
    pub fn from_payload(payload: &Value) -> Result<Self, ReservationError> {
        let id = ID.text_or(payload, "unknown");
        let check_in = CHECK_IN.parse_with(payload, StayTime::parse).ok_or_else(|| ReservationError::MissingField {
            id: id.clone(),
            field: CHECK_IN.field,
        })?;
        let check_out = CHECK_OUT.parse_with(payload, StayTime::parse).ok_or_else(|| ReservationError::MissingField {
            id: id.clone(),
            field: CHECK_OUT.field,
        })?;
        let status = STATUS
            .text(payload)
            .map(|raw| ReservationStatus::parse(&raw))
            .unwrap_or(ReservationStatus::Pending);

        let is_paid = IS_PAID.boolean(payload).unwrap_or_else(|| {
            PAYMENT_STATUS
                .text(payload)
                .map(|s| matches!(s.to_ascii_lowercase().as_str(), "paid" | "succeeded" | "completed"))
                .unwrap_or(false)
        });

        let mut reservation = Self::new(id, check_in, check_out, status)?
            .with_guest(GUEST_NAME.text_or(payload, UNKNOWN_GUEST))
            .with_amount(TOTAL_AMOUNT.number_or(payload, 0.0).max(0.0), is_paid);
        reservation.property_name = PROPERTY_NAME.text_or(payload, UNKNOWN_PROPERTY);
        reservation.property_id = PROPERTY_ID.text(payload);
        reservation.rating = RATING.number(payload).map(|r| r.clamp(0.0, 5.0));

        Ok(reservation)
    }

    /// Parses every usable booking in a bare or wrapped list, skipping invalid ones.
    pub fn parse_all(payload: &Value) -> Vec<Self> {
        probe::records(payload, &BOOKING_LIST)
            .iter()
            .filter_map(|record| match Self::from_payload(record) {
                Ok(reservation) => Some(reservation),
                Err(e) => {
                    warn!(error = %e, "Skipping unusable booking record");
                    None
                }
            })
            .collect()
    }

    pub fn nights(&self) -> i64 {
        (self.check_out.resolve(&Utc) - self.check_in.resolve(&Utc)).num_days()
    }
}
