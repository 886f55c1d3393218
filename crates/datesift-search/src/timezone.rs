//! Request timezone handling.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::SearchError;

/// Timezone a request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl RequestZone {
    /// Parse an IANA name (`Europe/Berlin`), `UTC`/`GMT`, or a fixed offset
    /// (`+05:30`, `-0800`).
    pub fn parse(id: &str) -> Result<Self, SearchError> {
        let id = id.trim();
        if let Some(offset) = parse_fixed_offset(id) {
            return Ok(Self::Fixed(offset));
        }
        id.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| SearchError::UnknownTimezone(id.to_string()))
    }

    /// Current wall-clock time in this zone.
    pub fn now_local(&self) -> NaiveDateTime {
        let now = Utc::now();
        match self {
            Self::Named(tz) => now.with_timezone(tz).naive_local(),
            Self::Fixed(offset) => now.with_timezone(offset).naive_local(),
        }
    }

    /// Attach this zone to a wall-clock time.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
    /// DST gap move forward by the usual one-hour gap, or by the nearest
    /// shift that exists for odd-sized gaps.
    pub fn localize(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Fixed(offset) => offset.from_local_datetime(&local).single(),
            Self::Named(tz) => [0, 60, 30, 120].into_iter().find_map(|minutes| {
                let shifted = local.checked_add_signed(TimeDelta::try_minutes(minutes)?)?;
                tz.from_local_datetime(&shifted)
                    .earliest()
                    .map(|dt| dt.fixed_offset())
            }),
        }
    }
}

/// `UTC`, `GMT`, `Z`, or `[+-]HH[:]MM` with hours up to 14.
pub fn parse_fixed_offset(text: &str) -> Option<FixedOffset> {
    if ["utc", "gmt", "z"]
        .iter()
        .any(|name| text.eq_ignore_ascii_case(name))
    {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
