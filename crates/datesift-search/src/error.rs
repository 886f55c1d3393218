//! Errors the searcher reports back to the worker loop.

use crate::language::Language;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request named a timezone that is neither an IANA name nor an offset.
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("failed to compile {language} date patterns: {source}")]
    Pattern {
        language: Language,
        #[source]
        source: regex::Error,
    },
}
