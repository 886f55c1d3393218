//! Natural-language date search for the datesift worker.
//!
//! [`DateSearcher`] finds date expressions ("January 5, 2024", "tomorrow at
//! 5pm", "vor 2 Stunden") in free text and resolves each to a point in time.
//! It plugs into the worker loop through [`datesift::DateSearch`].

pub mod error;
pub mod language;
pub mod patterns;
mod resolve;
pub mod searcher;
pub mod settings;
pub mod timezone;

pub use error::SearchError;
pub use language::{Language, choose_language, detect_languages};
pub use resolve::Resolved;
pub use searcher::DateSearcher;
pub use settings::SearchSettings;
pub use timezone::RequestZone;
