//! Search settings.

use std::num::NonZeroUsize;

use chrono::NaiveDateTime;

use crate::language::Language;

/// Knobs for a [`DateSearcher`](crate::DateSearcher).
///
/// `Default` is the configuration the worker binary runs with: English as the
/// fallback language and a single cached pattern set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Languages used when detection is inconclusive, most preferred first.
    pub default_languages: Vec<Language>,
    /// Compiled pattern sets kept between calls.
    pub cache_size_limit: NonZeroUsize,
    /// Fixed "now" for relative expressions, as wall-clock time in the
    /// request's timezone. `None` uses the current time.
    pub relative_base: Option<NaiveDateTime>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_languages: vec![Language::English],
            cache_size_limit: NonZeroUsize::MIN,
            relative_base: None,
        }
    }
}

impl SearchSettings {
    pub fn with_default_languages(mut self, languages: impl Into<Vec<Language>>) -> Self {
        self.default_languages = languages.into();
        self
    }

    pub fn with_cache_size_limit(mut self, limit: NonZeroUsize) -> Self {
        self.cache_size_limit = limit;
        self
    }

    pub fn with_relative_base(mut self, base: NaiveDateTime) -> Self {
        self.relative_base = Some(base);
        self
    }
}
