//! English to Spanish substitution for spoken status messages
//!
//! This is a fixed lexical layer, not machine translation: a handful of
//! autopilot messages and flight mode names have Spanish equivalents, and
//! anything else is spoken as it came in.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

lazy_static! {
    static ref FLIGHT_MODE_RE: Regex = Regex::new(r"([\w\s]+)flight mode").unwrap();
    static ref INIT_FAILED_RE: Regex =
        Regex::new(r"mode change to (\w+) failed: init failed").unwrap();
}

/// Flight mode names known out of the box
pub const DEFAULT_MODE_PHRASES: &[(&str, &str)] = &[
    ("guided", "guiado"),
    ("stabilize", "estabilizado"),
    ("auto", "automático"),
    ("altitude hold", "mantenimiento de altura"),
];

const BATTERY_BELOW_MINIMUM: &str = "Batería por debajo del mínimo requerido para el armado";
const BATTERY_BELOW_FAILSAFE: &str = "Batería por debajo del voltaje de seguridad, feilseif";

/// Whole messages, compared after trimming and lowercasing
const EXACT_PHRASES: &[(&str, &str)] = &[
    (
        "pre arm: battery 1 below minimum arming voltage",
        BATTERY_BELOW_MINIMUM,
    ),
    (
        "arm: battery 1 below minimum arming voltage",
        BATTERY_BELOW_MINIMUM,
    ),
    (
        "pre arm: battery 1 low voltage failsafe",
        BATTERY_BELOW_FAILSAFE,
    ),
    ("pre arm: battery failsafe", BATTERY_BELOW_FAILSAFE),
    ("arm: battery failsafe", BATTERY_BELOW_FAILSAFE),
    ("armed", "armado"),
    ("disarmed", "desarmado"),
];

#[derive(Clone, Copy, Debug)]
enum PhraseMatch {
    Contains(&'static str),
    Exact(&'static str),
}

impl PhraseMatch {
    fn matches(&self, text: &str) -> bool {
        match self {
            PhraseMatch::Contains(needle) => text.contains(needle),
            PhraseMatch::Exact(phrase) => text == *phrase,
        }
    }
}

/// Checked in order after the exact phrases; first hit wins
const FALLBACK_PHRASES: &[(PhraseMatch, &str)] = &[
    (
        PhraseMatch::Contains("potential thrust loss"),
        "Pérdida del potencial de empuje",
    ),
    // The double space is what the autopilot sends
    (PhraseMatch::Exact("battery  level low"), "Nivel de batería bajo"),
    (PhraseMatch::Contains("battery failsafe"), "Modo feilseif"),
];

/// Lowercase flight mode name -> spoken Spanish name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhraseTable {
    entries: HashMap<String, String>,
}

impl PhraseTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding [`DEFAULT_MODE_PHRASES`]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.extend(DEFAULT_MODE_PHRASES.iter().copied());
        table
    }

    /// Add or replace an entry; the key is trimmed and lowercased
    pub fn insert(&mut self, mode: impl AsRef<str>, phrase: impl Into<String>) {
        self.entries
            .insert(mode.as_ref().trim().to_lowercase(), phrase.into());
    }

    /// Insert every `(mode, phrase)` pair, replacing existing entries
    pub fn extend<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (mode, phrase) in entries {
            self.insert(mode, phrase);
        }
    }

    /// Exact lookup of an already lowercased, trimmed mode name
    pub fn lookup(&self, mode: &str) -> Option<&str> {
        self.entries.get(mode).map(String::as_str)
    }

    /// Translated mode name, or the name itself when unknown
    pub fn translate_mode(&self, mode: &str) -> String {
        self.lookup(mode).unwrap_or(mode).to_string()
    }

    /// Number of known flight modes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no flight mode has a translation
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Applies the phrase rules to normalized text
#[derive(Clone, Debug)]
pub struct Translator {
    phrases: PhraseTable,
    enabled: bool,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(PhraseTable::with_defaults())
    }
}

impl Translator {
    /// Create a translator using the given mode table
    pub fn new(phrases: PhraseTable) -> Self {
        if phrases.is_empty() {
            debug!("No flight mode phrases; mode names are spoken as is");
        } else {
            debug!("Translator loaded {} flight mode phrases", phrases.len());
        }

        Self {
            phrases,
            enabled: true,
        }
    }

    /// A translator that returns every message untouched
    pub fn passthrough() -> Self {
        Self {
            phrases: PhraseTable::new(),
            enabled: false,
        }
    }

    /// Translate a normalized message
    ///
    /// Rules are tried in order on the trimmed, lowercased text and the first
    /// one that matches decides the output. Text no rule recognises is
    /// returned exactly as given.
    pub fn translate(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let lowered = text.trim().to_lowercase();

        if let Some(caps) = FLIGHT_MODE_RE.captures(&lowered) {
            let mode = self.phrases.translate_mode(caps[1].trim());
            return format!("Modo de vuelo: {}", mode);
        }

        if let Some(caps) = INIT_FAILED_RE.captures(&lowered) {
            let mode = self.phrases.translate_mode(caps[1].trim());
            return format!("Error en cambio a modo {}: fallo de inicialización", mode);
        }

        if lowered.contains("no such mode") {
            return lowered.replace("no such mode", "No existe el modo");
        }

        if let Some((_, phrase)) = EXACT_PHRASES.iter().find(|(known, _)| *known == lowered) {
            return phrase.to_string();
        }

        if let Some((_, phrase)) = FALLBACK_PHRASES
            .iter()
            .find(|(matcher, _)| matcher.matches(&lowered))
        {
            return phrase.to_string();
        }

        text.to_string()
    }
}
