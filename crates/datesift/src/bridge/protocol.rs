//! Wire payload types for host-worker communication.
//!
//! One request shape in, one response shape out. There is no envelope, no
//! request id and no message tag: the n-th response answers the n-th request.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};

/// A search request from the host.
///
/// Both fields are optional on the wire; `null` and a missing key mean the same
/// thing. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub content: Option<String>,
    /// Timezone used to localize naive matches. Absent means "leave naive".
    #[serde(default)]
    pub tz: Option<String>,
}

impl SearchRequest {
    /// Text to scan, or `None` when there is nothing worth searching.
    pub fn searchable_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }

    /// Requested timezone, treating an empty identifier as absent.
    pub fn timezone(&self) -> Option<&str> {
        self.tz.as_deref().filter(|tz| !tz.is_empty())
    }
}

/// Resolved point in time for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDate {
    /// No timezone could be resolved for the match.
    Naive(NaiveDateTime),
    /// Absolute instant with the offset it was resolved in.
    Zoned(DateTime<FixedOffset>),
}

impl MatchDate {
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Self::Naive(dt) => *dt,
            Self::Zoned(dt) => dt.naive_local(),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            Self::Naive(_) => None,
            Self::Zoned(dt) => Some(*dt.offset()),
        }
    }
}

/// ISO-8601 with seconds always present and microseconds only when non-zero.
impl fmt::Display for MatchDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = self.naive_local();
        if local.nanosecond() == 0 {
            write!(f, "{}", local.format("%Y-%m-%dT%H:%M:%S"))?;
        } else {
            write!(f, "{}", local.format("%Y-%m-%dT%H:%M:%S%.6f"))?;
        }
        if let Some(offset) = self.offset() {
            write!(f, "{offset}")?;
        }
        Ok(())
    }
}

impl Serialize for MatchDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One recognized date expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateMatch {
    /// Exact span of the request content that was recognized.
    pub substring: String,
    pub date: MatchDate,
}

impl DateMatch {
    pub fn new(substring: impl Into<String>, date: MatchDate) -> Self {
        Self {
            substring: substring.into(),
            date,
        }
    }
}

/// Response to one request: matches in the order they occur in the content.
///
/// Serializes as a bare JSON array, `[]` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchResponse {
    matches: Vec<DateMatch>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl From<Vec<DateMatch>> for SearchResponse {
    fn from(matches: Vec<DateMatch>) -> Self {
        Self { matches }
    }
}

impl From<Option<Vec<DateMatch>>> for SearchResponse {
    fn from(matches: Option<Vec<DateMatch>>) -> Self {
        Self {
            matches: matches.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn request_missing_fields_are_absent() {
        let req: SearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, SearchRequest::default());
    }

    #[test]
    fn request_null_fields_are_absent() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"content": null, "tz": null}"#).unwrap();
        assert!(req.content.is_none());
        assert!(req.tz.is_none());
    }

    #[test]
    fn request_ignores_unknown_fields() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"content": "tomorrow", "lang": "en"}"#).unwrap();
        assert_eq!(req.content.as_deref(), Some("tomorrow"));
    }

    #[test]
    fn request_rejects_non_string_content() {
        let result = serde_json::from_str::<SearchRequest>(r#"{"content": 42}"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_content_and_tz_are_not_searchable() {
        let req = SearchRequest {
            content: Some(String::new()),
            tz: Some(String::new()),
        };
        assert!(req.searchable_content().is_none());
        assert!(req.timezone().is_none());
    }

    #[test]
    fn naive_date_formats_without_offset() {
        let date = MatchDate::Naive(naive(2024, 1, 5, 0, 0));
        assert_eq!(date.to_string(), "2024-01-05T00:00:00");
    }

    #[test]
    fn zoned_date_formats_with_offset() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 1, 5, 17, 30, 0).unwrap();
        assert_eq!(MatchDate::Zoned(dt).to_string(), "2024-01-05T17:30:00-05:00");
    }

    #[test]
    fn utc_formats_as_zero_offset() {
        let dt = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, 8, 0, 0)
            .unwrap();
        assert_eq!(MatchDate::Zoned(dt).to_string(), "2024-06-01T08:00:00+00:00");
    }

    #[test]
    fn fractional_seconds_use_microseconds() {
        let dt = naive(2024, 1, 5, 10, 30)
            .with_nanosecond(250_000_000)
            .unwrap();
        assert_eq!(
            MatchDate::Naive(dt).to_string(),
            "2024-01-05T10:30:00.250000"
        );
    }

    #[test]
    fn empty_response_serializes_as_empty_array() {
        let json = serde_json::to_string(&SearchResponse::empty()).unwrap();
        assert_eq!(json, "[]");

        let json = serde_json::to_string(&SearchResponse::from(None)).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn response_serializes() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let resp = SearchResponse::from(vec![
            DateMatch::new("January 5, 2024", MatchDate::Naive(naive(2024, 1, 5, 0, 0))),
            DateMatch::new(
                "tomorrow at 5pm",
                MatchDate::Zoned(offset.with_ymd_and_hms(2024, 1, 6, 17, 0, 0).unwrap()),
            ),
        ]);
        insta::assert_json_snapshot!(resp, @r#"
        [
          {
            "substring": "January 5, 2024",
            "date": "2024-01-05T00:00:00"
          },
          {
            "substring": "tomorrow at 5pm",
            "date": "2024-01-06T17:00:00+01:00"
          }
        ]
        "#);
    }
}
