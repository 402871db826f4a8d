use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::PropertySummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Price,
    Rating,
    #[default]
    Newest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Active sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Re-selecting the active field flips direction; a new field starts descending.
    #[must_use]
    pub fn select(self, field: SortField) -> Self {
        if field == self.field {
            Self::new(field, self.direction.flipped())
        } else {
            Self::new(field, SortDirection::Desc)
        }
    }

    /// Value of the `sort` query parameter
    pub fn backend_key(&self) -> String {
        let field = match self.field {
            SortField::Price => "price",
            SortField::Rating => "rating",
            SortField::Newest => "newest",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        format!("{field}_{direction}")
    }
}

/// Client-side bounds applied after ranking
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResultFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
}

impl ResultFilter {
    pub fn matches(&self, property: &PropertySummary) -> bool {
        self.min_price.map_or(true, |min| property.price >= min)
            && self.max_price.map_or(true, |max| property.price <= max)
            && self.min_rating.map_or(true, |min| property.rating >= min)
    }
}

/// Stable sort by the chosen field. Ties keep their input order in either direction.
///
/// `Newest` compares explicit creation timestamps when every record carries
/// one. Otherwise it falls back to [`id_recency`], which is only a proxy and
/// not guaranteed to be chronological.
pub fn rank(properties: &[PropertySummary], order: SortOrder) -> Vec<PropertySummary> {
    let mut ranked = properties.to_vec();
    let direction = order.direction;

    match order.field {
        SortField::Price => {
            ranked.sort_by(|a, b| direction.apply(a.price.total_cmp(&b.price)));
        }
        SortField::Rating => {
            ranked.sort_by(|a, b| direction.apply(a.rating.total_cmp(&b.rating)));
        }
        SortField::Newest if ranked.iter().all(|p| p.created_at.is_some()) => {
            ranked.sort_by(|a, b| direction.apply(a.created_at.cmp(&b.created_at)));
        }
        SortField::Newest => {
            ranked.sort_by(|a, b| direction.apply(id_recency(&a.id).cmp(&id_recency(&b.id))));
        }
    }

    ranked
}

/// Ranks, then drops records outside `filter`.
pub fn rank_filtered(
    properties: &[PropertySummary],
    order: SortOrder,
    filter: &ResultFilter,
) -> Vec<PropertySummary> {
    rank(properties, order)
        .into_iter()
        .filter(|property| filter.matches(property))
        .collect()
}

/// Digits of an opaque identifier read as one integer; 0 when there are none.
pub fn id_recency(id: &str) -> u128 {
    id.bytes()
        .filter(u8::is_ascii_digit)
        .take(38)
        .fold(0u128, |acc, digit| acc * 10 + u128::from(digit - b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property(id: &str, price: f64, rating: f64) -> PropertySummary {
        PropertySummary::from_payload(&json!({"id": id, "price": price, "rating": rating}))
    }

    fn ids(properties: &[PropertySummary]) -> Vec<&str> {
        properties.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn ties_keep_input_order() {
        let input = vec![
            property("a", 100.0, 4.0),
            property("b", 80.0, 4.0),
            property("c", 100.0, 3.0),
            property("d", 80.0, 5.0),
        ];

        let asc = rank(&input, SortOrder::new(SortField::Price, SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["b", "d", "a", "c"]);

        let desc = rank(&input, SortOrder::new(SortField::Price, SortDirection::Desc));
        assert_eq!(ids(&desc), vec!["a", "c", "b", "d"]);

        assert_eq!(rank(&input, SortOrder::new(SortField::Price, SortDirection::Asc)), asc);
    }

    #[test]
    fn toggling_active_field_reverses_order() {
        let input = vec![
            property("a", 120.0, 4.1),
            property("b", 60.0, 4.9),
            property("c", 90.0, 3.2),
        ];
        let order = SortOrder::default().select(SortField::Rating);
        assert_eq!(order, SortOrder::new(SortField::Rating, SortDirection::Desc));

        let first = rank(&input, order);
        let toggled = rank(&input, order.select(SortField::Rating));
        let mut reversed = first.clone();
        reversed.reverse();
        assert_eq!(toggled, reversed);
    }

    #[test]
    fn new_field_resets_to_descending() {
        let order = SortOrder::new(SortField::Price, SortDirection::Asc).select(SortField::Newest);
        assert_eq!(order.direction, SortDirection::Desc);
        assert_eq!(order.backend_key(), "newest_desc");
    }

    #[test]
    fn newest_uses_identifier_digits_without_timestamps() {
        let input = vec![property("prop_17", 1.0, 1.0), property("prop_203", 1.0, 1.0), property("x", 1.0, 1.0)];
        let ranked = rank(&input, SortOrder::new(SortField::Newest, SortDirection::Desc));
        assert_eq!(ids(&ranked), vec!["prop_203", "prop_17", "x"]);
        assert_eq!(id_recency("a1b2c3"), 123);
    }

    #[test]
    fn newest_prefers_explicit_timestamps() {
        let input = vec![
            PropertySummary::from_payload(&json!({"id": "9", "createdAt": "2024-01-01T00:00:00Z"})),
            PropertySummary::from_payload(&json!({"id": "1", "createdAt": "2024-06-01T00:00:00Z"})),
        ];
        let ranked = rank(&input, SortOrder::new(SortField::Newest, SortDirection::Desc));
        assert_eq!(ids(&ranked), vec!["1", "9"]);
    }

    #[test]
    fn filter_bounds() {
        let input = vec![property("a", 50.0, 4.5), property("b", 150.0, 4.8), property("c", 90.0, 3.0)];
        let filter = ResultFilter {
            max_price: Some(100.0),
            min_rating: Some(4.0),
            ..ResultFilter::default()
        };
        let kept = rank_filtered(&input, SortOrder::new(SortField::Price, SortDirection::Asc), &filter);
        assert_eq!(ids(&kept), vec!["a"]);
    }
}
