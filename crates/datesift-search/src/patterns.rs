//! Compiled date expressions for one language.
//!
//! Each expression kind is its own regex so capture names can repeat across
//! kinds. Matching is case-insensitive and Unicode-aware; digits are ASCII.

use std::ops::Range;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::language::{Language, Vocabulary};
use crate::resolve::{Resolved, resolve};

/// Shape of a date expression; decides how its captures are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    /// `January 5, 2024`
    MonthDay,
    /// `5th of January`, `5. Januar`
    DayMonth,
    /// `March 2024`
    MonthYear,
    /// `2024-01-05T10:30:00Z`
    Iso,
    /// `01/05/2024`
    Numeric,
    /// `tomorrow`
    RelativeDay,
    /// `2 hours ago`, `vor 2 Stunden`
    Ago,
    /// `in 3 days`
    In,
    /// `5pm`, `17:30`
    Clock,
}

/// One recognized, resolvable span of the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    /// Byte range into the searched text.
    pub range: Range<usize>,
    pub resolved: Resolved,
}

/// All date expressions of one language.
#[derive(Debug)]
pub struct PatternSet {
    language: Language,
    patterns: Vec<(Kind, Regex)>,
}

impl PatternSet {
    pub fn compile(language: Language) -> Result<Self, regex::Error> {
        let vocab = language.vocabulary();
        let patterns = sources(vocab)
            .into_iter()
            .map(|(kind, source)| Regex::new(&format!("(?i){source}")).map(|re| (kind, re)))
            .collect::<Result<_, _>>()?;
        Ok(Self { language, patterns })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Non-overlapping date expressions in `content`, in order of appearance.
    ///
    /// Candidates that do not resolve to a real date are dropped before
    /// overlaps are settled. Among overlapping candidates the one starting
    /// first wins, then the longer one.
    pub fn find(&self, content: &str, base: NaiveDateTime) -> Vec<Found> {
        let vocab = self.language.vocabulary();
        let mut candidates: Vec<Found> = self
            .patterns
            .iter()
            .flat_map(|(kind, regex)| {
                regex.captures_iter(content).filter_map(move |caps| {
                    let whole = caps.get(0)?;
                    let resolved = resolve(*kind, &caps, vocab, base)?;
                    Some(Found {
                        range: whole.range(),
                        resolved,
                    })
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then_with(|| b.range.len().cmp(&a.range.len()))
        });

        let mut selected: Vec<Found> = Vec::with_capacity(candidates.len());
        for found in candidates {
            let free = selected
                .last()
                .is_none_or(|last| found.range.start >= last.range.end);
            if free {
                selected.push(found);
            }
        }
        selected
    }
}

/// Regex alternation of `words`, longest first so prefixes never shadow
/// longer words. Spaces inside a word match any run of whitespace.
fn alternation<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    let mut words: Vec<&str> = words.into_iter().collect();
    words.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    words.dedup();
    words
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

/// `(?:(?:words)tail)?`, or nothing when the language has no such words.
fn optional_words(words: &[&str], tail: &str) -> String {
    if words.is_empty() {
        String::new()
    } else {
        format!("(?:(?:{}){tail})?", alternation(words.iter().copied()))
    }
}

fn time_fragment(vocab: &Vocabulary) -> String {
    const MERIDIEM: &str = r"[ap]\.m\.|[ap]m\b";

    let markers = (!vocab.hour_markers.is_empty())
        .then(|| alternation(vocab.hour_markers.iter().copied()));

    let mut colon = String::from(
        r"(?P<hour>[0-9]{1,2}):(?P<minute>[0-5][0-9])(?::(?P<second>[0-5][0-9])(?:\.(?P<fraction>[0-9]{1,9}))?)?",
    );
    if vocab.meridiem {
        colon.push_str(&format!(r"(?:\s*(?P<meridiem>{MERIDIEM}))?"));
    }
    if let Some(markers) = &markers {
        colon.push_str(&format!(r"(?:\s*(?:{markers})\b)?"));
    }

    let mut alternatives = vec![colon];
    if vocab.meridiem {
        alternatives.push(format!(
            r"(?P<bare_hour>[0-9]{{1,2}})\s*(?P<bare_meridiem>{MERIDIEM})"
        ));
    }
    if let Some(markers) = &markers {
        alternatives.push(format!(
            r"(?P<mark_hour>[0-9]{{1,2}})\s*(?:{markers})(?:\s*(?P<mark_minute>[0-5][0-9]))?\b"
        ));
    }
    format!("(?:{})", alternatives.join("|"))
}

const ISO_DATE: &str =
    r"(?P<year>[0-9]{4})[-/](?P<month>[0-9]{1,2})[-/](?P<day>[0-9]{1,2})";

/// Zone after a clock time. A numeric offset needs leading whitespace so
/// ranges such as `9:30-10:30` stay two times.
const CLOCK_ZONE: &str =
    r"(?:(?P<zone>z|\s?(?:utc|gmt)|\s[+-](?:0[0-9]|1[0-4]):?[0-5][0-9])\b)?";

/// Zone after an ISO `T` time with seconds, where the offset may be attached.
const ISO_ZONE: &str = r"(?:(?P<zone>z|[+-](?:0[0-9]|1[0-4]):?[0-5][0-9]|\s?(?:utc|gmt)|\s[+-](?:0[0-9]|1[0-4]):?[0-5][0-9])\b)?";

/// Optional time (and zone) following a date.
fn time_suffix(vocab: &Vocabulary) -> String {
    format!(
        r"(?:,?\s*{}{}{CLOCK_ZONE})?",
        optional_words(vocab.time_connectors, r"\s*"),
        time_fragment(vocab),
    )
}

fn sources(vocab: &Vocabulary) -> Vec<(Kind, String)> {
    let months = alternation(vocab.month_words());
    let ordinal = alternation(vocab.ordinal_suffixes.iter().copied());
    let connector = optional_words(vocab.month_connectors, r"\s+");
    let year = format!(r"(?:,?\s*{connector}(?P<year>[0-9]{{4}})\b)?");
    let amount = format!(
        "(?P<amount>[0-9]{{1,6}}|{})",
        alternation(vocab.one.iter().copied())
    );
    let units = alternation(vocab.unit_words());
    let time = time_suffix(vocab);

    let mut sources = vec![
        (
            Kind::MonthDay,
            format!(
                r"\b(?P<month>{months})\b\.?\s+{connector}(?P<day>[0-9]{{1,2}})(?:(?:{ordinal})|\b){year}{time}"
            ),
        ),
        (
            Kind::DayMonth,
            format!(
                r"\b(?P<day>[0-9]{{1,2}})(?:{ordinal})?\s*{connector}(?P<month>{months})\b\.?{year}{time}"
            ),
        ),
        (
            Kind::MonthYear,
            format!(r"\b(?P<month>{months})\b\.?\s+{connector}(?P<year>[0-9]{{4}})\b"),
        ),
        (
            Kind::Iso,
            format!(
                r"\b{ISO_DATE}(?:(?:t|\s+){}{CLOCK_ZONE})?",
                time_fragment(vocab)
            ),
        ),
        (
            Kind::Iso,
            format!(
                r"\b{ISO_DATE}t(?P<hour>[0-9]{{1,2}}):(?P<minute>[0-5][0-9]):(?P<second>[0-5][0-9])(?:\.(?P<fraction>[0-9]{{1,9}}))?{ISO_ZONE}"
            ),
        ),
        (
            Kind::Numeric,
            format!(r"\b(?P<num_a>[0-9]{{1,2}})[/.](?P<num_b>[0-9]{{1,2}})[/.](?P<year>[0-9]{{4}})\b{time}"),
        ),
        (
            Kind::RelativeDay,
            format!(
                r"\b(?P<rel_day>{})\b{time}",
                alternation(vocab.relative_day_words())
            ),
        ),
        (
            Kind::In,
            format!(
                r"\b(?:{})\s+{amount}\s+(?P<unit>{units})\b",
                alternation(vocab.in_prefix.iter().copied())
            ),
        ),
        (
            Kind::Clock,
            format!(r"\b{}{CLOCK_ZONE}", time_fragment(vocab)),
        ),
    ];

    if !vocab.ago_prefix.is_empty() {
        sources.push((
            Kind::Ago,
            format!(
                r"\b(?:{})\s+{amount}\s+(?P<unit>{units})\b",
                alternation(vocab.ago_prefix.iter().copied())
            ),
        ));
    }
    if !vocab.ago_suffix.is_empty() {
        sources.push((
            Kind::Ago,
            format!(
                r"\b{amount}\s+(?P<unit>{units})\s+(?:{})\b",
                alternation(vocab.ago_suffix.iter().copied())
            ),
        ));
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn spans(language: Language, content: &str) -> Vec<(String, String)> {
        let set = PatternSet::compile(language).unwrap();
        set.find(content, base())
            .into_iter()
            .map(|found| {
                (
                    content[found.range].to_string(),
                    found.resolved.local.format("%Y-%m-%dT%H:%M:%S").to_string(),
                )
            })
            .collect()
    }

    fn pair(substring: &str, date: &str) -> (String, String) {
        (substring.to_string(), date.to_string())
    }

    #[test]
    fn every_language_compiles() {
        for language in Language::ALL {
            let set = PatternSet::compile(language).unwrap();
            assert_eq!(set.language(), language);
        }
    }

    #[test]
    fn alternation_prefers_longer_words() {
        assert_eq!(alternation(["jan", "january"]), "january|jan");
        assert_eq!(alternation(["il y a"]), r"il\s+y\s+a");
        assert_eq!(alternation(["a", "a"]), "a");
    }

    #[test]
    fn month_name_dates() {
        assert_eq!(
            spans(Language::English, "Let's meet on January 5, 2024"),
            vec![pair("January 5, 2024", "2024-01-05T00:00:00")]
        );
        assert_eq!(
            spans(Language::English, "the 5th of January"),
            vec![pair("5th of January", "2024-01-05T00:00:00")]
        );
        assert_eq!(
            spans(Language::English, "Jan. 7th at 3pm"),
            vec![pair("Jan. 7th at 3pm", "2024-01-07T15:00:00")]
        );
    }

    #[test]
    fn month_and_year_keeps_base_day() {
        assert_eq!(
            spans(Language::English, "released in March 2023"),
            vec![pair("March 2023", "2023-03-15T00:00:00")]
        );
    }

    #[test]
    fn iso_and_numeric_dates() {
        assert_eq!(
            spans(Language::English, "deploy 2024-01-05T10:30:00Z"),
            vec![pair("2024-01-05T10:30:00Z", "2024-01-05T10:30:00")]
        );
        assert_eq!(
            spans(Language::English, "due 03/04/2024"),
            vec![pair("03/04/2024", "2024-03-04T00:00:00")]
        );
        assert_eq!(
            spans(Language::German, "fällig am 03.04.2024"),
            vec![pair("03.04.2024", "2024-04-03T00:00:00")]
        );
    }

    #[test]
    fn relative_expressions() {
        assert_eq!(
            spans(
                Language::English,
                "sent 2 hours ago, follow up in 3 days or tomorrow at 9:30 am"
            ),
            vec![
                pair("2 hours ago", "2024-03-15T10:00:00"),
                pair("in 3 days", "2024-03-18T12:00:00"),
                pair("tomorrow at 9:30 am", "2024-03-16T09:30:00"),
            ]
        );
        assert_eq!(
            spans(Language::English, "see you tomorrow"),
            vec![pair("tomorrow", "2024-03-16T12:00:00")]
        );
        assert_eq!(
            spans(Language::English, "a month ago"),
            vec![pair("a month ago", "2024-02-15T12:00:00")]
        );
    }

    #[test]
    fn other_languages() {
        assert_eq!(
            spans(Language::German, "Wir treffen uns am 5. Januar 2024 um 15 Uhr"),
            vec![pair("5. Januar 2024 um 15 Uhr", "2024-01-05T15:00:00")]
        );
        assert_eq!(
            spans(Language::German, "vor 2 Tagen"),
            vec![pair("vor 2 Tagen", "2024-03-13T12:00:00")]
        );
        assert_eq!(
            spans(Language::French, "Rendez-vous le 3 février à 10h30"),
            vec![pair("3 février à 10h30", "2024-02-03T10:30:00")]
        );
        assert_eq!(
            spans(Language::French, "il y a 3 jours"),
            vec![pair("il y a 3 jours", "2024-03-12T12:00:00")]
        );
        assert_eq!(
            spans(Language::Spanish, "Nos vemos el 5 de enero de 2024"),
            vec![pair("5 de enero de 2024", "2024-01-05T00:00:00")]
        );
        assert_eq!(
            spans(Language::Spanish, "hace 3 días"),
            vec![pair("hace 3 días", "2024-03-12T12:00:00")]
        );
    }

    #[test]
    fn clock_times_use_base_date() {
        assert_eq!(
            spans(Language::English, "lunch at 12:30 pm"),
            vec![pair("12:30 pm", "2024-03-15T12:30:00")]
        );
        assert_eq!(
            spans(Language::German, "bis 17:45"),
            vec![pair("17:45", "2024-03-15T17:45:00")]
        );
    }

    #[test]
    fn invalid_values_are_dropped() {
        assert!(spans(Language::English, "February 30, 2024").is_empty());
        assert!(spans(Language::English, "at 25:00").is_empty());
        assert!(spans(Language::English, "13/13/2024").is_empty());
    }

    #[test]
    fn explicit_zone_is_kept() {
        let set = PatternSet::compile(Language::English).unwrap();
        let found = set.find("2024-01-05 10:00 +02:00", base());
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].resolved.offset,
            chrono::FixedOffset::east_opt(7200)
        );
    }

    #[test]
    fn attached_offset_needs_iso_seconds() {
        let set = PatternSet::compile(Language::English).unwrap();
        let found = set.find("2024-01-05T10:30:00+02:00", base());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range, 0.."2024-01-05T10:30:00+02:00".len());
        assert_eq!(
            found[0].resolved.offset,
            chrono::FixedOffset::east_opt(7200)
        );
    }

    #[test]
    fn clock_range_is_not_an_offset() {
        assert_eq!(
            spans(Language::English, "9:30-10:30"),
            vec![
                ("9:30".to_string(), "2024-03-15T09:30:00".to_string()),
                ("10:30".to_string(), "2024-03-15T10:30:00".to_string()),
            ]
        );
        let found = PatternSet::compile(Language::English)
            .unwrap()
            .find("9:30-10:30", base());
        assert!(found.iter().all(|m| m.resolved.offset.is_none()));
    }

    #[test]
    fn no_dates_no_matches() {
        assert!(spans(Language::English, "nothing to see here").is_empty());
    }
}
