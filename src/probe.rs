use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Number, Value};

/// Ordered list of JSON pointer paths that may hold one logical field.
///
/// Backend payloads drift between releases (`price` vs `pricing.basePrice`,
/// `guest.name` vs `guestName`), so every logical field is read through a
/// probe table instead of ad-hoc lookups. Paths are tried in order and the
/// first one holding a usable value wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldProbe {
    pub field: &'static str,
    pub paths: &'static [&'static str],
}

impl FieldProbe {
    pub const fn new(field: &'static str, paths: &'static [&'static str]) -> Self {
        Self { field, paths }
    }

    fn candidates<'a>(&self, payload: &'a Value) -> impl Iterator<Item = &'a Value> + 'a {
        let paths = self.paths;
        paths
            .iter()
            .filter_map(move |path| payload.pointer(path))
            .filter(|value| !value.is_null())
    }

    /// First finite number, accepting numeric strings such as `"120.50"`.
    pub fn number(&self, payload: &Value) -> Option<f64> {
        self.candidates(payload).find_map(as_number)
    }

    pub fn number_or(&self, payload: &Value, default: f64) -> f64 {
        self.number(payload).unwrap_or(default)
    }

    /// First non-blank string. Numbers are rendered, since ids are sometimes numeric.
    pub fn text(&self, payload: &Value) -> Option<String> {
        self.candidates(payload).find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn text_or(&self, payload: &Value, placeholder: &str) -> String {
        self.text(payload).unwrap_or_else(|| placeholder.to_string())
    }

    pub fn boolean(&self, payload: &Value) -> Option<bool> {
        self.candidates(payload).find_map(|value| match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn timestamp(&self, payload: &Value) -> Option<DateTime<Utc>> {
        self.candidates(payload).find_map(parse_timestamp)
    }

    /// First candidate accepted by a caller-supplied parser.
    pub fn parse_with<T>(&self, payload: &Value, parse: impl FnMut(&Value) -> Option<T>) -> Option<T> {
        self.candidates(payload).find_map(parse)
    }

    pub fn array<'a>(&self, payload: &'a Value) -> Option<&'a Vec<Value>> {
        self.candidates(payload).find_map(Value::as_array)
    }
}

/// Record list of a response that is either a bare array or wrapped in an object.
pub fn records<'a>(payload: &'a Value, wrappers: &FieldProbe) -> &'a [Value] {
    match payload {
        Value::Array(items) => items,
        _ => wrappers.array(payload).map(Vec::as_slice).unwrap_or(&[]),
    }
}

/// Owned variant of [`records`] for responses that are consumed whole.
pub fn take_records(payload: Value, wrappers: &FieldProbe) -> Vec<Value> {
    let mut payload = match payload {
        Value::Array(items) => return items,
        other => other,
    };
    for path in wrappers.paths {
        if let Some(Value::Array(items)) = payload.pointer_mut(path) {
            return std::mem::take(items);
        }
    }
    Vec::new()
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Parses RFC 3339, naive (assumed UTC), date-only and epoch-millisecond timestamps.
///
/// Used for metadata such as listing creation times. Stay dates go through
/// `StayTime`, which keeps zone-less values in the viewer's zone instead.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => parse_epoch_millis(n),
        _ => None,
    }
}

pub fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    parse_zoned_str(raw)
        .map(|zoned| zoned.with_timezone(&Utc))
        .or_else(|| parse_naive_str(raw).map(|naive| Utc.from_utc_datetime(&naive)))
}

pub fn parse_epoch_millis(n: &Number) -> Option<DateTime<Utc>> {
    n.as_i64().and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

/// RFC 3339 string carrying an explicit offset.
pub fn parse_zoned_str(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

/// Wall-clock date-time without a zone. Date-only input maps to midnight.
pub fn parse_naive_str(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRICE: FieldProbe = FieldProbe::new("price", &["/price", "/pricing/basePrice"]);
    const WRAPPED: FieldProbe = FieldProbe::new("records", &["/data", "/results"]);

    #[test]
    fn number_skips_null_and_unparseable_paths() {
        assert_eq!(PRICE.number(&json!({"price": null, "pricing": {"basePrice": 80}})), Some(80.0));
        assert_eq!(PRICE.number(&json!({"price": "n/a", "pricing": {"basePrice": "95.5"}})), Some(95.5));
        assert_eq!(PRICE.number(&json!({"price": "NaN"})), None);
        assert_eq!(PRICE.number_or(&json!({}), 0.0), 0.0);
    }

    #[test]
    fn earlier_paths_take_priority() {
        assert_eq!(PRICE.number(&json!({"price": 10, "pricing": {"basePrice": 20}})), Some(10.0));
    }

    #[test]
    fn text_ignores_blank_strings() {
        let title = FieldProbe::new("title", &["/title", "/name"]);
        assert_eq!(title.text(&json!({"title": "  ", "name": "Loft"})), Some("Loft".to_string()));
        assert_eq!(title.text_or(&json!({}), "Untitled"), "Untitled");
    }

    #[test]
    fn timestamps_in_several_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-01-10T14:00:00Z")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-01-10T14:00:00.000Z")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-01-10T14:00:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(
            parse_timestamp(&json!("2024-01-10")),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(&json!("next tuesday")), None);
    }

    #[test]
    fn naive_strings_keep_their_wall_clock() {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(14, 0, 0).unwrap();
        assert_eq!(parse_naive_str("2024-01-10T14:00"), Some(naive));
        assert_eq!(parse_naive_str(" 2024-01-10 14:00:00 "), Some(naive));
        assert_eq!(parse_naive_str("2024-01-10T14:00:00Z"), None);
        assert!(parse_zoned_str("2024-01-10T14:00").is_none());
        assert_eq!(
            parse_zoned_str("2024-01-10T09:00:00-05:00").map(|t| t.with_timezone(&Utc)),
            Some(Utc.from_utc_datetime(&naive))
        );
    }

    #[test]
    fn records_accept_bare_and_wrapped_lists() {
        assert_eq!(records(&json!([1, 2]), &WRAPPED).len(), 2);
        assert_eq!(records(&json!({"results": [1]}), &WRAPPED).len(), 1);
        assert!(records(&json!({"message": "ok"}), &WRAPPED).is_empty());
        assert_eq!(take_records(json!({"data": [1, 2, 3]}), &WRAPPED).len(), 3);
    }
}
