use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::query::{Coordinates, LocationQuery};
use super::ranker::{SortField, SortOrder};
use crate::config::SearchSettings;

/// Stay dates. Never relaxed by the tier cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Malformed or inverted dates disable the date filter instead of failing the search.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let parsed = (
            NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d"),
            NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d"),
        );
        match parsed {
            (Ok(start), Ok(end)) => {
                let range = Self::new(start, end);
                if range.is_none() {
                    warn!(%start, %end, "Ignoring date filter: check-out is not after check-in");
                }
                range
            }
            _ => {
                warn!(start, end, "Ignoring malformed date filter");
                None
            }
        }
    }
}

/// Secondary filters held fixed across every tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub dates: Option<DateRange>,
    pub guests: Option<u32>,
    pub property_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub amenities: Vec<String>,
}

/// Immutable input of one resolution. Updates return a new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: LocationQuery,
    pub filters: SearchFilters,
    pub order: SortOrder,
}

impl SearchState {
    pub fn new(query: LocationQuery) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_query(&self, query: LocationQuery) -> Self {
        Self {
            query,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_filters(&self, filters: SearchFilters) -> Self {
        Self {
            filters,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_sort(&self, field: SortField) -> Self {
        Self {
            order: self.order.select(field),
            ..self.clone()
        }
    }
}

/// Flat query sent to the property search endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    /// Comma-joined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl SearchRequest {
    fn with_filters(filters: &SearchFilters, order: &SortOrder) -> Self {
        let amenities: Vec<&str> = filters
            .amenities
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();

        Self {
            start_date: filters.dates.map(|d| d.start),
            end_date: filters.dates.map(|d| d.end),
            guests: filters.guests.filter(|g| *g > 0),
            min_price: filters.min_price,
            max_price: filters.max_price,
            property_type: filters.property_type.clone(),
            amenities: (!amenities.is_empty()).then(|| amenities.join(",")),
            sort: Some(order.backend_key()),
            ..Self::default()
        }
    }

    fn centre_on(&mut self, coordinates: Coordinates, radius_km: f64) {
        self.lat = Some(coordinates.latitude);
        self.lng = Some(coordinates.longitude);
        self.radius = Some(radius_km);
    }

    pub fn has_text_filter(&self) -> bool {
        self.keyword.is_some() || self.city.is_some() || self.state.is_some() || self.country.is_some()
    }
}

/// Radius rules for the initial and coordinates-only tiers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusPolicy {
    pub default_km: f64,
    pub relaxed_multiplier: f64,
    pub relaxed_floor_km: f64,
}

impl Default for RadiusPolicy {
    fn default() -> Self {
        Self::from(&SearchSettings::default())
    }
}

impl From<&SearchSettings> for RadiusPolicy {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            default_km: settings.default_radius_km,
            relaxed_multiplier: settings.relaxed_radius_multiplier,
            relaxed_floor_km: settings.relaxed_radius_floor_km,
        }
    }
}

impl RadiusPolicy {
    pub fn initial(&self, coordinates: &Coordinates) -> f64 {
        coordinates.radius_km.unwrap_or(self.default_km)
    }

    pub fn relaxed(&self, coordinates: &Coordinates) -> f64 {
        (self.initial(coordinates) * self.relaxed_multiplier).max(self.relaxed_floor_km)
    }
}

/// One relaxation level, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchTier {
    Exact,
    StateCountry,
    CountryOnly,
    CoordinatesOnly,
}

impl SearchTier {
    pub const ALL: [SearchTier; 4] = [
        SearchTier::Exact,
        SearchTier::StateCountry,
        SearchTier::CountryOnly,
        SearchTier::CoordinatesOnly,
    ];

    /// Outgoing request for this tier, or `None` when the query lacks what
    /// the tier relaxes to.
    pub fn request(&self, state: &SearchState, radii: &RadiusPolicy) -> Option<SearchRequest> {
        let query = &state.query;
        let place = &query.place;
        let mut request = SearchRequest::with_filters(&state.filters, &state.order);

        match self {
            SearchTier::Exact => {
                // a keyword suppresses the structured fields
                match query.keyword() {
                    Some(keyword) => request.keyword = Some(keyword.to_string()),
                    None => {
                        request.city = place.city.clone();
                        request.state = place.state.clone();
                        request.country = place.country.clone();
                    }
                }
                if let Some(coordinates) = &query.coordinates {
                    request.centre_on(*coordinates, radii.initial(coordinates));
                }
            }
            SearchTier::StateCountry => {
                if !place.is_complete() {
                    return None;
                }
                request.state = place.state.clone();
                request.country = place.country.clone();
                if let Some(coordinates) = &query.coordinates {
                    request.centre_on(*coordinates, radii.initial(coordinates));
                }
            }
            SearchTier::CountryOnly => {
                request.country = Some(place.country.clone()?);
                if let Some(coordinates) = &query.coordinates {
                    request.centre_on(*coordinates, radii.initial(coordinates));
                }
            }
            SearchTier::CoordinatesOnly => {
                let coordinates = query.coordinates?;
                request.centre_on(coordinates, radii.relaxed(&coordinates));
            }
        }

        Some(request)
    }
}

impl fmt::Display for SearchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchTier::Exact => "exact",
            SearchTier::StateCountry => "state+country",
            SearchTier::CountryOnly => "country-only",
            SearchTier::CoordinatesOnly => "coordinates-only",
        };
        f.write_str(name)
    }
}
