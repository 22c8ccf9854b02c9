//! Timestamps are persisted in UTC and converted to the caller's timezone only
//! when a model is presented.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

/// Column type used for every `*_at` field
pub type Timestamp = DateTime<FixedOffset>;

pub fn now_utc() -> Timestamp {
    Utc::now().fixed_offset()
}

/// Normalize to a `+00:00` offset before persisting
pub fn to_utc(value: Timestamp) -> Timestamp {
    value.with_timezone(&Utc).fixed_offset()
}

/// Same instant expressed in `tz`
pub fn localize(value: Timestamp, tz: &Tz) -> Timestamp {
    value.with_timezone(tz).fixed_offset()
}

/// Presentation-time conversion of every timestamp a model carries
pub trait Localize {
    fn localize(self, tz: &Tz) -> Self;
}

impl Localize for Timestamp {
    fn localize(self, tz: &Tz) -> Self {
        localize(self, tz)
    }
}

impl<T: Localize> Localize for Option<T> {
    fn localize(self, tz: &Tz) -> Self {
        self.map(|value| value.localize(tz))
    }
}

impl<T: Localize> Localize for Vec<T> {
    fn localize(self, tz: &Tz) -> Self {
        self.into_iter().map(|value| value.localize(tz)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn localize_keeps_the_instant() {
        let tokyo = localize(stamp(), &chrono_tz::Asia::Tokyo);
        assert_eq!(tokyo, stamp());
        assert_eq!(tokyo.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(tokyo.format("%H:%M").to_string(), "21:00");
    }

    #[test]
    fn to_utc_normalizes_offsets() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap();
        let utc = to_utc(local);
        assert_eq!(utc.offset().local_minus_utc(), 0);
        assert_eq!(utc, stamp());
    }

    #[test]
    fn daylight_saving_is_applied_per_instant() {
        let summer = Utc
            .with_ymd_and_hms(2024, 7, 1, 12, 0, 0)
            .unwrap()
            .fixed_offset();
        let london = chrono_tz::Europe::London;
        assert_eq!(localize(stamp(), &london).offset().local_minus_utc(), 0);
        assert_eq!(localize(summer, &london).offset().local_minus_utc(), 3600);
    }

    #[test]
    fn option_and_vec_localize_elementwise() {
        let tz = chrono_tz::America::New_York;
        assert_eq!(None::<Timestamp>.localize(&tz), None);
        let out = vec![stamp(), stamp()].localize(&tz);
        assert!(out.iter().all(|t| t.offset().local_minus_utc() == -5 * 3600));
    }
}
