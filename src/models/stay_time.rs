use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::probe;

const WALL_CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Check-in or check-out time as the backend sent it.
///
/// Bookings carry either an absolute instant (`...Z`, an offset, epoch
/// millis) or a bare wall-clock time such as `"2024-01-10T14:00"`. A bare
/// time means that hour in the viewer's zone, so it stays floating until a
/// zone is supplied by whoever holds the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StayTime {
    Instant(DateTime<Utc>),
    WallClock(NaiveDateTime),
}

impl StayTime {
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => probe::parse_zoned_str(s)
                .map(|zoned| Self::Instant(zoned.with_timezone(&Utc)))
                .or_else(|| probe::parse_naive_str(s).map(Self::WallClock)),
            Value::Number(n) => probe::parse_epoch_millis(n).map(Self::Instant),
            _ => None,
        }
    }

    /// This time seen from `tz`.
    ///
    /// A wall-clock time falling in a DST gap resolves to the first valid
    /// instant after it; an ambiguous one to the earlier reading.
    pub fn local<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        match self {
            Self::Instant(instant) => instant.with_timezone(tz),
            Self::WallClock(naive) => (0..=2)
                .find_map(|hours| tz.from_local_datetime(&(*naive + Duration::hours(hours))).earliest())
                .unwrap_or_else(|| tz.from_utc_datetime(naive)),
        }
    }

    /// Absolute instant of this time when wall-clock values are read in `tz`.
    pub fn resolve<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Utc> {
        self.local(tz).with_timezone(&Utc)
    }

    /// Orders two stay times without a viewer zone.
    ///
    /// Times of the same kind compare directly. Mixed pairs compare with the
    /// wall-clock side read as UTC.
    pub fn cmp_unzoned(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::WallClock(a), Self::WallClock(b)) => a.cmp(b),
            _ => self.resolve(&Utc).cmp(&other.resolve(&Utc)),
        }
    }
}

impl From<DateTime<Utc>> for StayTime {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Instant(instant)
    }
}

impl From<NaiveDateTime> for StayTime {
    fn from(naive: NaiveDateTime) -> Self {
        Self::WallClock(naive)
    }
}

impl fmt::Display for StayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(instant) => write!(f, "{}", instant.to_rfc3339()),
            Self::WallClock(naive) => write!(f, "{}", naive.format(WALL_CLOCK_FORMAT)),
        }
    }
}

impl Serialize for StayTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use serde_json::json;

    fn wall(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn zoned_and_bare_strings_parse_differently() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap();
        assert_eq!(StayTime::parse(&json!("2024-01-10T14:00:00Z")), Some(StayTime::Instant(instant)));
        assert_eq!(
            StayTime::parse(&json!(instant.timestamp_millis())),
            Some(StayTime::Instant(instant))
        );
        assert_eq!(StayTime::parse(&json!("2024-01-10T14:00")), Some(StayTime::WallClock(wall(10, 14, 0))));
        assert_eq!(StayTime::parse(&json!("2024-01-10")), Some(StayTime::WallClock(wall(10, 0, 0))));
        assert_eq!(StayTime::parse(&json!(true)), None);
    }

    #[test]
    fn wall_clock_resolves_in_the_given_zone() {
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        let bare = StayTime::WallClock(wall(11, 2, 0));

        assert_eq!(bare.resolve(&eastern), Utc.with_ymd_and_hms(2024, 1, 11, 7, 0, 0).unwrap());
        assert_eq!(bare.resolve(&Utc), Utc.with_ymd_and_hms(2024, 1, 11, 2, 0, 0).unwrap());

        let instant = StayTime::Instant(Utc.with_ymd_and_hms(2024, 1, 11, 2, 0, 0).unwrap());
        assert_eq!(instant.resolve(&eastern), instant.resolve(&Utc));
    }

    #[test]
    fn display_keeps_the_original_kind() {
        assert_eq!(StayTime::WallClock(wall(10, 14, 30)).to_string(), "2024-01-10T14:30:00");
        assert_eq!(
            StayTime::Instant(Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap()).to_string(),
            "2024-01-10T14:30:00+00:00"
        );
    }

    #[test]
    fn unzoned_ordering() {
        assert_eq!(
            StayTime::WallClock(wall(10, 14, 0)).cmp_unzoned(&StayTime::WallClock(wall(11, 2, 0))),
            Ordering::Less
        );
        assert_eq!(
            StayTime::WallClock(wall(10, 14, 0))
                .cmp_unzoned(&StayTime::Instant(Utc.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap())),
            Ordering::Equal
        );
    }
}
