use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::probe::FieldProbe;

pub const UNTITLED: &str = "Untitled property";
pub const UNKNOWN_ID: &str = "unknown";
pub const NO_LOCATION: &str = "Location unavailable";
pub const DEFAULT_CURRENCY: &str = "USD";

const ID: FieldProbe = FieldProbe::new("id", &["/id", "/_id", "/propertyId", "/listingId"]);
const TITLE: FieldProbe = FieldProbe::new("title", &["/title", "/name", "/listing/title"]);
const PRICE: FieldProbe = FieldProbe::new(
    "price",
    &["/price", "/pricePerNight", "/pricing/basePrice", "/pricing/perNight", "/nightlyRate"],
);
const CURRENCY: FieldProbe = FieldProbe::new("currency", &["/currency", "/pricing/currency"]);
const RATING: FieldProbe = FieldProbe::new(
    "rating",
    &["/rating", "/averageRating", "/reviews/average", "/ratings/overall"],
);
const REVIEW_COUNT: FieldProbe = FieldProbe::new(
    "reviewCount",
    &["/reviewCount", "/reviewsCount", "/numReviews", "/reviews/count"],
);
const LOCATION_TEXT: FieldProbe = FieldProbe::new(
    "location",
    &["/location", "/locationText", "/address", "/location/address", "/address/full"],
);
const CITY: FieldProbe = FieldProbe::new("city", &["/location/city", "/city", "/address/city"]);
const STATE: FieldProbe = FieldProbe::new("state", &["/location/state", "/state", "/address/state"]);
const COUNTRY: FieldProbe = FieldProbe::new(
    "country",
    &["/location/country", "/country", "/address/country"],
);
const IMAGES: FieldProbe = FieldProbe::new("images", &["/images", "/photos", "/imageUrls"]);
const COVER_IMAGE: FieldProbe = FieldProbe::new("image", &["/image", "/thumbnail", "/coverImage"]);
const IMAGE_URL: FieldProbe = FieldProbe::new("url", &["/url", "/secure_url", "/src"]);
const CREATED_AT: FieldProbe = FieldProbe::new("createdAt", &["/createdAt", "/created_at"]);

/// Canonical projection of a backend property record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    /// 0 to 5
    pub rating: f64,
    pub review_count: u32,
    pub location: String,
    pub images: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl PropertySummary {
    /// Projects an arbitrary backend record, defaulting numbers to 0 and
    /// strings to placeholders. Never fails.
    pub fn from_payload(payload: &Value) -> Self {
        let review_count = REVIEW_COUNT.number_or(payload, 0.0).max(0.0).round();

        Self {
            id: ID.text_or(payload, UNKNOWN_ID),
            title: TITLE.text_or(payload, UNTITLED),
            price: PRICE.number_or(payload, 0.0).max(0.0),
            currency: CURRENCY.text_or(payload, DEFAULT_CURRENCY),
            rating: RATING.number_or(payload, 0.0).clamp(0.0, 5.0),
            review_count: review_count.min(u32::MAX as f64) as u32,
            location: location_text(payload),
            images: images(payload),
            created_at: CREATED_AT.timestamp(payload),
        }
    }
}

fn location_text(payload: &Value) -> String {
    if let Some(text) = LOCATION_TEXT.text(payload) {
        return text;
    }

    let parts: Vec<String> = [CITY, STATE, COUNTRY]
        .iter()
        .filter_map(|probe| probe.text(payload))
        .collect();

    if parts.is_empty() {
        NO_LOCATION.to_string()
    } else {
        parts.join(", ")
    }
}

fn images(payload: &Value) -> Vec<String> {
    let listed: Vec<String> = IMAGES
        .array(payload)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(url) if !url.trim().is_empty() => Some(url.trim().to_string()),
                    Value::Object(_) => IMAGE_URL.text(item),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if listed.is_empty() {
        COVER_IMAGE.text(payload).into_iter().collect()
    } else {
        listed
    }
}
