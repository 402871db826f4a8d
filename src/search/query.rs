use serde::Serialize;

/// Structured place fields. Blank strings are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Place {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Place {
    pub fn new(city: Option<&str>, state: Option<&str>, country: Option<&str>) -> Self {
        Self {
            city: clean(city),
            state: clean(state),
            country: clean(country),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.country.is_none()
    }

    /// City, state and country are all known
    pub fn is_complete(&self) -> bool {
        self.city.is_some() && self.state.is_some() && self.country.is_some()
    }

    /// Fields set on `other` win over ours
    fn overlay(self, other: Place) -> Place {
        Place {
            city: other.city.or(self.city),
            state: other.state.or(self.state),
            country: other.country.or(self.country),
        }
    }
}

/// Validated search centre. Out-of-range or non-finite input never produces one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64, radius_km: Option<f64>) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return None;
        }

        Some(Self {
            latitude,
            longitude,
            radius_km: radius_km.filter(|r| r.is_finite() && *r > 0.0),
        })
    }

    /// Parses raw text input; a malformed radius falls back to the default radius.
    pub fn parse(latitude: &str, longitude: &str, radius_km: Option<&str>) -> Option<Self> {
        let latitude = latitude.trim().parse::<f64>().ok()?;
        let longitude = longitude.trim().parse::<f64>().ok()?;
        let radius_km = radius_km.and_then(|r| r.trim().parse::<f64>().ok());
        Self::new(latitude, longitude, radius_km)
    }
}

/// Canonical location part of a search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    pub keyword: Option<String>,
    pub place: Place,
    pub coordinates: Option<Coordinates>,
}

impl LocationQuery {
    /// Normalizes free text. `"city, region"` and `"city, region, country"`
    /// also fill the structured fields so later tiers have something to relax
    /// to; the keyword stays the primary filter.
    pub fn from_text(text: &str) -> Self {
        let segments: Vec<&str> = text
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();

        if segments.is_empty() {
            return Self::default();
        }

        let looks_like_place = segments
            .iter()
            .all(|segment| segment.chars().any(char::is_alphabetic));

        let place = match segments.as_slice() {
            [city, state] if looks_like_place => Place::new(Some(*city), Some(*state), None),
            [city, state, country] if looks_like_place => {
                Place::new(Some(*city), Some(*state), Some(*country))
            }
            _ => Place::default(),
        };

        Self {
            keyword: Some(segments.join(", ")),
            place,
            coordinates: None,
        }
    }

    pub fn from_place(place: Place) -> Self {
        Self {
            place,
            ..Self::default()
        }
    }

    /// Explicit structured fields override any parsed from the keyword.
    pub fn with_place(self, place: Place) -> Self {
        Self {
            place: self.place.overlay(place),
            ..self
        }
    }

    pub fn with_coordinates(self, coordinates: Option<Coordinates>) -> Self {
        Self { coordinates, ..self }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// No location filter at all
    pub fn is_empty(&self) -> bool {
        self.keyword().is_none() && self.place.is_empty() && self.coordinates.is_none()
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_segments_fill_place() {
        let query = LocationQuery::from_text("  Springfield , Illinois,USA ");
        assert_eq!(query.keyword(), Some("Springfield, Illinois, USA"));
        assert_eq!(
            query.place,
            Place::new(Some("Springfield"), Some("Illinois"), Some("USA"))
        );
    }

    #[test]
    fn two_segments_are_city_and_region() {
        let query = LocationQuery::from_text("Porto, Norte");
        assert_eq!(query.place, Place::new(Some("Porto"), Some("Norte"), None));
    }

    #[test]
    fn single_or_numeric_segments_stay_keyword_only() {
        let query = LocationQuery::from_text("Lisbon");
        assert_eq!(query.keyword(), Some("Lisbon"));
        assert!(query.place.is_empty());

        let query = LocationQuery::from_text("12, 34");
        assert!(query.place.is_empty());

        let query = LocationQuery::from_text("a, b, c, d");
        assert!(query.place.is_empty());
    }

    #[test]
    fn blank_input_is_no_filter() {
        assert!(LocationQuery::from_text("").is_empty());
        assert!(LocationQuery::from_text(" , ,, ").is_empty());
    }

    #[test]
    fn explicit_place_overrides_parsed_fields() {
        let query = LocationQuery::from_text("Springfield")
            .with_place(Place::new(Some("Springfield"), Some("Illinois"), Some("USA")));
        assert_eq!(query.keyword(), Some("Springfield"));
        assert!(query.place.is_complete());
    }

    #[test]
    fn invalid_coordinates_are_dropped() {
        assert!(Coordinates::new(91.0, 200.0, None).is_none());
        assert!(Coordinates::new(f64::NAN, 10.0, None).is_none());
        assert!(Coordinates::parse("abc", "10", None).is_none());
        assert!(Coordinates::parse("inf", "10", None).is_none());

        let parsed = Coordinates::parse("41.15", "-8.61", Some("-4")).unwrap();
        assert_eq!(parsed.latitude, 41.15);
        assert_eq!(parsed.radius_km, None);
    }
}
