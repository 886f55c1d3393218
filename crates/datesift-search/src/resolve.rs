//! Turning a pattern match into a point in time.
//!
//! Every function here returns `None` for values that do not exist on the
//! calendar or the clock; the caller drops such candidates.

use chrono::{
    Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
};
use regex::Captures;

use crate::language::{Unit, Vocabulary};
use crate::patterns::Kind;
use crate::timezone::parse_fixed_offset;

/// Wall-clock result of one match, plus the offset written next to it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn parse(text: &str) -> Self {
        if text.starts_with(['p', 'P']) {
            Self::Pm
        } else {
            Self::Am
        }
    }
}

/// Resolve the captures of a `kind` expression against `base`.
pub(crate) fn resolve(
    kind: Kind,
    caps: &Captures<'_>,
    vocab: &Vocabulary,
    base: NaiveDateTime,
) -> Option<Resolved> {
    let local = match kind {
        Kind::MonthDay | Kind::DayMonth => {
            let month = vocab.month_number(caps.name("month")?.as_str())?;
            let day = number(caps, "day")?;
            let year = year_or(caps, base)?;
            on_date(NaiveDate::from_ymd_opt(year, month, day)?, caps, None)?
        }
        Kind::MonthYear => {
            let month = vocab.month_number(caps.name("month")?.as_str())?;
            let year = year_or(caps, base)?;
            let day = base.day().min(days_in_month(year, month)?);
            on_date(NaiveDate::from_ymd_opt(year, month, day)?, caps, None)?
        }
        Kind::Iso => {
            let date = NaiveDate::from_ymd_opt(
                year_or(caps, base)?,
                number(caps, "month")?,
                number(caps, "day")?,
            )?;
            on_date(date, caps, None)?
        }
        Kind::Numeric => {
            let (a, b) = (number(caps, "num_a")?, number(caps, "num_b")?);
            let (month, day) = if vocab.day_first { (b, a) } else { (a, b) };
            on_date(
                NaiveDate::from_ymd_opt(year_or(caps, base)?, month, day)?,
                caps,
                None,
            )?
        }
        Kind::RelativeDay => {
            let days = vocab.relative_day(caps.name("rel_day")?.as_str())?;
            let date = base.date().checked_add_signed(TimeDelta::try_days(days)?)?;
            on_date(date, caps, Some(base.time()))?
        }
        Kind::Ago | Kind::In => {
            let amount = vocab.amount(caps.name("amount")?.as_str())?;
            let unit = vocab.unit(caps.name("unit")?.as_str())?;
            shift(base, amount, unit, kind == Kind::In)?
        }
        Kind::Clock => on_date(base.date(), caps, None)?,
    };

    let offset = match caps.name("zone") {
        Some(zone) => Some(parse_fixed_offset(zone.as_str().trim())?),
        None => None,
    };

    Some(Resolved { local, offset })
}

/// Combine `date` with the captured time, `fallback` (or midnight) when the
/// expression carries none.
fn on_date(
    date: NaiveDate,
    caps: &Captures<'_>,
    fallback: Option<NaiveTime>,
) -> Option<NaiveDateTime> {
    let time = match captured_time(caps)? {
        Some(time) => time,
        None => fallback.unwrap_or(NaiveTime::MIN),
    };
    Some(date.and_time(time))
}

/// `Some(None)` when the expression has no time part, `None` when it has one
/// that is not a valid clock reading.
fn captured_time(caps: &Captures<'_>) -> Option<Option<NaiveTime>> {
    if let Some(hour) = caps.name("hour") {
        let meridiem = caps.name("meridiem").map(|m| Meridiem::parse(m.as_str()));
        let nanos = match caps.name("fraction") {
            Some(f) => fraction_nanos(f.as_str())?,
            None => 0,
        };
        return clock_time(
            hour.as_str().parse().ok()?,
            number(caps, "minute")?,
            optional_number(caps, "second")?,
            nanos,
            meridiem,
        )
        .map(Some);
    }
    if let Some(hour) = caps.name("bare_hour") {
        let meridiem = caps.name("bare_meridiem").map(|m| Meridiem::parse(m.as_str()));
        return clock_time(hour.as_str().parse().ok()?, 0, 0, 0, meridiem).map(Some);
    }
    if let Some(hour) = caps.name("mark_hour") {
        return clock_time(
            hour.as_str().parse().ok()?,
            optional_number(caps, "mark_minute")?,
            0,
            0,
            None,
        )
        .map(Some);
    }
    Some(None)
}

fn clock_time(
    hour: u32,
    minute: u32,
    second: u32,
    nanos: u32,
    meridiem: Option<Meridiem>,
) -> Option<NaiveTime> {
    let hour = match meridiem {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(Meridiem::Am) => hour % 12,
        Some(Meridiem::Pm) => hour % 12 + 12,
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

/// `"5"` is half a second, `"123456789"` is 123456789 ns.
fn fraction_nanos(digits: &str) -> Option<u32> {
    if digits.len() > 9 {
        return None;
    }
    format!("{digits:0<9}").parse().ok()
}

fn shift(base: NaiveDateTime, amount: u32, unit: Unit, forward: bool) -> Option<NaiveDateTime> {
    let months = match unit {
        Unit::Month => Some(amount),
        Unit::Year => amount.checked_mul(12),
        _ => None,
    };
    if let Some(months) = months {
        let months = Months::new(months);
        return if forward {
            base.checked_add_months(months)
        } else {
            base.checked_sub_months(months)
        };
    }

    let amount = i64::from(amount);
    let delta = match unit {
        Unit::Second => TimeDelta::try_seconds(amount),
        Unit::Minute => TimeDelta::try_minutes(amount),
        Unit::Hour => TimeDelta::try_hours(amount),
        Unit::Day => TimeDelta::try_days(amount),
        Unit::Week => TimeDelta::try_weeks(amount),
        Unit::Month | Unit::Year => None,
    }?;
    if forward {
        base.checked_add_signed(delta)
    } else {
        base.checked_sub_signed(delta)
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    (28..=31)
        .rev()
        .find(|day| NaiveDate::from_ymd_opt(year, month, *day).is_some())
}

fn number(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

/// Zero when the group did not participate, `None` when it did but is not a
/// number.
fn optional_number(caps: &Captures<'_>, name: &str) -> Option<u32> {
    match caps.name(name) {
        Some(m) => m.as_str().parse().ok(),
        None => Some(0),
    }
}

fn year_or(caps: &Captures<'_>, base: NaiveDateTime) -> Option<i32> {
    match caps.name("year") {
        Some(year) => year.as_str().parse().ok(),
        None => Some(base.year()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    #[test]
    fn meridiem_conversion() {
        let t = |h, m| clock_time(h, 0, 0, 0, Some(m)).map(|t| t.format("%H").to_string());
        assert_eq!(t(12, Meridiem::Am).as_deref(), Some("00"));
        assert_eq!(t(12, Meridiem::Pm).as_deref(), Some("12"));
        assert_eq!(t(5, Meridiem::Pm).as_deref(), Some("17"));
        assert_eq!(t(0, Meridiem::Pm), None);
        assert_eq!(t(13, Meridiem::Am), None);
        assert_eq!(clock_time(25, 0, 0, 0, None), None);
    }

    #[test]
    fn fractions_pad_to_nanoseconds() {
        assert_eq!(fraction_nanos("5"), Some(500_000_000));
        assert_eq!(fraction_nanos("000123"), Some(123_000));
        assert_eq!(fraction_nanos("1234567890"), None);
    }

    #[test]
    fn month_shifts_clamp_to_month_end() {
        let shifted = shift(base(), 1, Unit::Month, true).unwrap();
        assert_eq!(shifted.to_string(), "2024-02-29 09:15:00");
        let back = shift(base(), 1, Unit::Year, false).unwrap();
        assert_eq!(back.to_string(), "2023-01-31 09:15:00");
    }

    #[test]
    fn time_shifts() {
        assert_eq!(
            shift(base(), 2, Unit::Hour, false).unwrap().to_string(),
            "2024-01-31 07:15:00"
        );
        assert_eq!(
            shift(base(), 1, Unit::Week, true).unwrap().to_string(),
            "2024-02-07 09:15:00"
        );
        assert_eq!(shift(base(), u32::MAX, Unit::Year, true), None);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 13), None);
    }
}
