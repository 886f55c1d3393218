//! The stateful searcher the worker calls once per request.

use chrono::{Local, NaiveDateTime, TimeZone};
use datesift::{DateMatch, DateSearch, MatchDate};
use lru::LruCache;
use tracing::{debug, trace};

use crate::error::SearchError;
use crate::language::{Language, choose_language};
use crate::patterns::PatternSet;
use crate::settings::SearchSettings;
use crate::timezone::RequestZone;

/// Natural-language date searcher.
///
/// Compiled pattern sets are kept in an LRU cache keyed by language, bounded
/// by [`SearchSettings::cache_size_limit`].
pub struct DateSearcher {
    settings: SearchSettings,
    cache: LruCache<Language, PatternSet>,
}

impl DateSearcher {
    pub fn new(settings: SearchSettings) -> Self {
        let cache = LruCache::new(settings.cache_size_limit);
        Self { settings, cache }
    }

    /// Languages with compiled patterns, most recently used first.
    pub fn cached_languages(&self) -> Vec<Language> {
        self.cache.iter().map(|(language, _)| *language).collect()
    }

    /// Find date expressions in `content`, in order of appearance.
    ///
    /// Matches without a zone of their own are localized in `tz` when given;
    /// otherwise they stay naive. An empty `tz` counts as absent.
    pub fn search_dates(
        &mut self,
        content: &str,
        tz: Option<&str>,
    ) -> Result<Vec<DateMatch>, SearchError> {
        let zone = tz
            .filter(|tz| !tz.trim().is_empty())
            .map(RequestZone::parse)
            .transpose()?;

        let base = self.relative_base(zone.as_ref());
        let language = choose_language(content, &self.settings.default_languages);

        let patterns = self.cache.try_get_or_insert(language, || {
            debug!(%language, "Compiling date patterns");
            PatternSet::compile(language).map_err(|source| SearchError::Pattern { language, source })
        })?;

        let found = patterns.find(content, base);
        trace!(%language, %base, matches = found.len(), "Date search done");

        Ok(found
            .into_iter()
            .map(|found| {
                let local = found.resolved.local;
                let zoned = match (found.resolved.offset, zone) {
                    (Some(offset), _) => offset.from_local_datetime(&local).single(),
                    (None, Some(zone)) => zone.localize(local),
                    (None, None) => None,
                };
                let date = zoned.map_or(MatchDate::Naive(local), MatchDate::Zoned);
                DateMatch::new(&content[found.range], date)
            })
            .collect())
    }

    fn relative_base(&self, zone: Option<&RequestZone>) -> NaiveDateTime {
        match (self.settings.relative_base, zone) {
            (Some(base), _) => base,
            (None, Some(zone)) => zone.now_local(),
            (None, None) => Local::now().naive_local(),
        }
    }
}

impl Default for DateSearcher {
    fn default() -> Self {
        Self::new(SearchSettings::default())
    }
}

impl DateSearch for DateSearcher {
    type Error = SearchError;

    fn search(&mut self, content: &str, tz: Option<&str>) -> Result<Vec<DateMatch>, SearchError> {
        self.search_dates(content, tz)
    }
}
