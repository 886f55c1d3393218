//! Supported languages, their date vocabulary, and keyword-based detection.

use std::fmt;
use std::str::FromStr;

/// A language the searcher has date vocabulary for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    English,
    German,
    French,
    Spanish,
}

impl Language {
    /// Declaration order; also the tie-break order for detection.
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::German,
        Language::French,
        Language::Spanish,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::German => "de",
            Self::French => "fr",
            Self::Spanish => "es",
        }
    }

    pub fn vocabulary(self) -> &'static Vocabulary {
        match self {
            Self::English => &ENGLISH,
            Self::German => &GERMAN,
            Self::French => &FRENCH,
            Self::Spanish => &SPANISH,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported language code '{0}'")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Time units usable in relative expressions ("in 3 days", "2 hours ago").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Date words of one language. All entries are lowercase.
#[derive(Debug)]
pub struct Vocabulary {
    /// Names and abbreviations, indexed by month - 1.
    pub months: [&'static [&'static str]; 12],
    pub today: &'static [&'static str],
    pub tomorrow: &'static [&'static str],
    pub yesterday: &'static [&'static str],
    pub now: &'static [&'static str],
    pub units: &'static [(&'static str, Unit)],
    /// Words meaning "one" in relative expressions ("an hour ago").
    pub one: &'static [&'static str],
    pub ago_prefix: &'static [&'static str],
    pub ago_suffix: &'static [&'static str],
    pub in_prefix: &'static [&'static str],
    /// Joins a date to a following time ("at", "um").
    pub time_connectors: &'static [&'static str],
    /// Joins day, month and year ("of", "de").
    pub month_connectors: &'static [&'static str],
    pub ordinal_suffixes: &'static [&'static str],
    /// Clock markers following an hour ("Uhr", "h").
    pub hour_markers: &'static [&'static str],
    /// Accepts am/pm.
    pub meridiem: bool,
    /// Numeric dates are day-first (`05/01/2024` is 5 January).
    pub day_first: bool,
    /// Common words that only count towards detection.
    pub function_words: &'static [&'static str],
}

impl Vocabulary {
    pub fn month_number(&self, word: &str) -> Option<u32> {
        let word = word.to_lowercase();
        self.months
            .iter()
            .position(|names| names.contains(&word.as_str()))
            .map(|idx| idx as u32 + 1)
    }

    /// Day offset for a relative day word, `None` for anything else.
    pub fn relative_day(&self, word: &str) -> Option<i64> {
        let word = normalize(word);
        let word = word.as_str();
        if self.today.contains(&word) || self.now.contains(&word) {
            Some(0)
        } else if self.tomorrow.contains(&word) {
            Some(1)
        } else if self.yesterday.contains(&word) {
            Some(-1)
        } else {
            None
        }
    }

    pub fn unit(&self, word: &str) -> Option<Unit> {
        let word = word.to_lowercase();
        self.units
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(_, unit)| *unit)
    }

    pub fn amount(&self, word: &str) -> Option<u32> {
        if let Ok(n) = word.parse() {
            return Some(n);
        }
        let word = word.to_lowercase();
        self.one.contains(&word.as_str()).then_some(1)
    }

    pub fn relative_day_words(&self) -> impl Iterator<Item = &'static str> {
        self.today
            .iter()
            .chain(self.tomorrow)
            .chain(self.yesterday)
            .chain(self.now)
            .copied()
    }

    pub fn month_words(&self) -> impl Iterator<Item = &'static str> {
        self.months.iter().flat_map(|names| names.iter().copied())
    }

    pub fn unit_words(&self) -> impl Iterator<Item = &'static str> {
        self.units.iter().map(|(name, _)| *name)
    }

    /// Single words that suggest this language.
    fn keywords(&self) -> impl Iterator<Item = &'static str> {
        self.month_words()
            .chain(self.relative_day_words())
            .chain(self.unit_words())
            .chain(self.ago_prefix.iter().copied())
            .chain(self.ago_suffix.iter().copied())
            .chain(self.hour_markers.iter().copied())
            .chain(self.function_words.iter().copied())
            .filter(|w| w.chars().all(char::is_alphabetic))
    }

    fn is_keyword(&self, token: &str) -> bool {
        self.keywords().any(|w| w == token)
    }
}

fn normalize(word: &str) -> String {
    word.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keyword hits per language, in declaration order.
fn scores(text: &str) -> [(Language, usize); 4] {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();

    Language::ALL.map(|lang| {
        let vocab = lang.vocabulary();
        (lang, tokens.iter().filter(|t| vocab.is_keyword(t)).count())
    })
}

/// Languages whose vocabulary appears in `text` with their keyword hits,
/// best first.
///
/// Languages with no hits are left out, so an empty result means detection
/// was inconclusive. Equal scores keep declaration order.
pub fn detect_languages(text: &str) -> Vec<(Language, usize)> {
    let mut scored: Vec<(Language, usize)> = scores(text)
        .into_iter()
        .filter(|(_, hits)| *hits > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

/// Pick the language to search `text` in.
///
/// Best detected language, preferring one of `defaults` among equal scores;
/// the first default when nothing is detected.
pub fn choose_language(text: &str, defaults: &[Language]) -> Language {
    let fallback = defaults.first().copied().unwrap_or(Language::English);
    let detected = detect_languages(text);
    let Some(&(leader, best)) = detected.first() else {
        return fallback;
    };

    let tied: Vec<Language> = detected
        .iter()
        .take_while(|(_, hits)| *hits == best)
        .map(|(lang, _)| *lang)
        .collect();
    defaults
        .iter()
        .copied()
        .find(|lang| tied.contains(lang))
        .unwrap_or(leader)
}

static ENGLISH: Vocabulary = Vocabulary {
    months: [
        &["january", "jan"],
        &["february", "feb"],
        &["march", "mar"],
        &["april", "apr"],
        &["may"],
        &["june", "jun"],
        &["july", "jul"],
        &["august", "aug"],
        &["september", "sept", "sep"],
        &["october", "oct"],
        &["november", "nov"],
        &["december", "dec"],
    ],
    today: &["today"],
    tomorrow: &["tomorrow"],
    yesterday: &["yesterday"],
    now: &["now", "right now"],
    units: &[
        ("second", Unit::Second),
        ("seconds", Unit::Second),
        ("sec", Unit::Second),
        ("secs", Unit::Second),
        ("minute", Unit::Minute),
        ("minutes", Unit::Minute),
        ("min", Unit::Minute),
        ("mins", Unit::Minute),
        ("hour", Unit::Hour),
        ("hours", Unit::Hour),
        ("hr", Unit::Hour),
        ("hrs", Unit::Hour),
        ("day", Unit::Day),
        ("days", Unit::Day),
        ("week", Unit::Week),
        ("weeks", Unit::Week),
        ("month", Unit::Month),
        ("months", Unit::Month),
        ("year", Unit::Year),
        ("years", Unit::Year),
    ],
    one: &["a", "an", "one"],
    ago_prefix: &[],
    ago_suffix: &["ago"],
    in_prefix: &["in"],
    time_connectors: &["at", "@"],
    month_connectors: &["of"],
    ordinal_suffixes: &["st", "nd", "rd", "th"],
    hour_markers: &["o'clock"],
    meridiem: true,
    day_first: false,
    function_words: &[
        "the", "and", "on", "at", "of", "to", "is", "we", "you", "meet", "see", "next", "this",
        "let", "will", "be", "until", "from", "before", "after",
    ],
};

static GERMAN: Vocabulary = Vocabulary {
    months: [
        &["januar", "jänner", "jan"],
        &["februar", "feb"],
        &["märz", "maerz", "mär", "mrz"],
        &["april", "apr"],
        &["mai"],
        &["juni", "jun"],
        &["juli", "jul"],
        &["august", "aug"],
        &["september", "sept", "sep"],
        &["oktober", "okt"],
        &["november", "nov"],
        &["dezember", "dez"],
    ],
    today: &["heute"],
    tomorrow: &["morgen"],
    yesterday: &["gestern"],
    now: &["jetzt"],
    units: &[
        ("sekunde", Unit::Second),
        ("sekunden", Unit::Second),
        ("minute", Unit::Minute),
        ("minuten", Unit::Minute),
        ("stunde", Unit::Hour),
        ("stunden", Unit::Hour),
        ("tag", Unit::Day),
        ("tage", Unit::Day),
        ("tagen", Unit::Day),
        ("woche", Unit::Week),
        ("wochen", Unit::Week),
        ("monat", Unit::Month),
        ("monate", Unit::Month),
        ("monaten", Unit::Month),
        ("jahr", Unit::Year),
        ("jahre", Unit::Year),
        ("jahren", Unit::Year),
    ],
    one: &["einer", "einem", "einen", "eine", "ein"],
    ago_prefix: &["vor"],
    ago_suffix: &[],
    in_prefix: &["in"],
    time_connectors: &["um"],
    month_connectors: &[],
    ordinal_suffixes: &["."],
    hour_markers: &["uhr"],
    meridiem: false,
    day_first: true,
    function_words: &[
        "der", "die", "das", "und", "am", "um", "wir", "ist", "nicht", "mit", "bis", "sehen",
        "uns", "treffen", "nach", "ab",
    ],
};

static FRENCH: Vocabulary = Vocabulary {
    months: [
        &["janvier", "janv"],
        &["février", "fevrier", "févr", "fevr"],
        &["mars"],
        &["avril", "avr"],
        &["mai"],
        &["juin"],
        &["juillet", "juil"],
        &["août", "aout"],
        &["septembre", "sept"],
        &["octobre", "oct"],
        &["novembre", "nov"],
        &["décembre", "decembre", "déc", "dec"],
    ],
    today: &["aujourd'hui", "aujourd’hui"],
    tomorrow: &["demain"],
    yesterday: &["hier"],
    now: &["maintenant"],
    units: &[
        ("seconde", Unit::Second),
        ("secondes", Unit::Second),
        ("minute", Unit::Minute),
        ("minutes", Unit::Minute),
        ("heure", Unit::Hour),
        ("heures", Unit::Hour),
        ("jour", Unit::Day),
        ("jours", Unit::Day),
        ("semaine", Unit::Week),
        ("semaines", Unit::Week),
        ("mois", Unit::Month),
        ("an", Unit::Year),
        ("ans", Unit::Year),
        ("année", Unit::Year),
        ("années", Unit::Year),
    ],
    one: &["une", "un"],
    ago_prefix: &["il y a"],
    ago_suffix: &[],
    in_prefix: &["dans"],
    time_connectors: &["à", "a"],
    month_connectors: &[],
    ordinal_suffixes: &["er"],
    hour_markers: &["h"],
    meridiem: false,
    day_first: true,
    function_words: &[
        "le", "la", "les", "et", "est", "nous", "vous", "du", "des", "une", "rendez", "aujourd",
        "voir", "avant", "après", "jusqu",
    ],
};

static SPANISH: Vocabulary = Vocabulary {
    months: [
        &["enero", "ene"],
        &["febrero", "feb"],
        &["marzo", "mar"],
        &["abril", "abr"],
        &["mayo", "may"],
        &["junio", "jun"],
        &["julio", "jul"],
        &["agosto", "ago"],
        &["septiembre", "setiembre", "sept", "sep"],
        &["octubre", "oct"],
        &["noviembre", "nov"],
        &["diciembre", "dic"],
    ],
    today: &["hoy"],
    tomorrow: &["mañana"],
    yesterday: &["ayer"],
    now: &["ahora"],
    units: &[
        ("segundo", Unit::Second),
        ("segundos", Unit::Second),
        ("minuto", Unit::Minute),
        ("minutos", Unit::Minute),
        ("hora", Unit::Hour),
        ("horas", Unit::Hour),
        ("día", Unit::Day),
        ("días", Unit::Day),
        ("dia", Unit::Day),
        ("dias", Unit::Day),
        ("semana", Unit::Week),
        ("semanas", Unit::Week),
        ("mes", Unit::Month),
        ("meses", Unit::Month),
        ("año", Unit::Year),
        ("años", Unit::Year),
    ],
    one: &["una", "un"],
    ago_prefix: &["hace"],
    ago_suffix: &[],
    in_prefix: &["dentro de", "en"],
    time_connectors: &["a las", "a la"],
    month_connectors: &["de"],
    ordinal_suffixes: &["º"],
    hour_markers: &[],
    meridiem: false,
    day_first: true,
    function_words: &[
        "el", "la", "los", "las", "y", "es", "nos", "vemos", "del", "con", "por", "hasta",
        "antes", "después",
    ],
};
