//! Text normalization for spoken telemetry messages
//!
//! Autopilot status text is terse: mode names are abbreviated, numbers carry
//! signs, decimal points and unit suffixes, and timeouts are given in raw
//! milliseconds. A synthesizer reads all of that badly, so every message is
//! rewritten into words before it is spoken.
//!
//! The rewrite runs in a fixed order:
//! 1. abbreviation expansion (ordered rule table)
//! 2. negative numbers
//! 3. decimal points
//! 4. meter suffixes
//! 5. millisecond durations

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

/// A case-insensitive literal substitution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternRule {
    /// Literal text to look for (matched ignoring case)
    pub matcher: &'static str,

    /// Literal text substituted for every occurrence
    pub replacement: &'static str,
}

impl PatternRule {
    pub const fn new(matcher: &'static str, replacement: &'static str) -> Self {
        Self {
            matcher,
            replacement,
        }
    }
}

/// Ordered abbreviation table
///
/// Groups are applied one after another, each to the output of the previous
/// one. Inside a group only the first rule whose matcher is present fires,
/// which is how `AUTO_RTL` shadows the bare `RTL` rule.
pub const ABBREVIATIONS: &[&[PatternRule]] = &[
    &[PatternRule::new("ERR ", "error ")],
    &[PatternRule::new("ERR:", "error.")],
    &[PatternRule::new("POSCTL", "Position Control")],
    &[PatternRule::new("ALTCTL", "Altitude Control")],
    &[
        PatternRule::new("AUTO_RTL", "auto Return To Launch"),
        PatternRule::new("RTL", "Return To Launch"),
    ],
    &[PatternRule::new("ACCEL ", "accelerometer ")],
    &[PatternRule::new("RC_MAP_MODE_SW", "RC mode switch")],
    &[PatternRule::new("REJ.", "Rejected")],
    &[PatternRule::new("WP", "way point")],
    &[PatternRule::new("CMD", "command")],
    &[PatternRule::new("COMPID", "component eye dee")],
    &[PatternRule::new(" params ", " parameters ")],
    &[PatternRule::new(" id ", " eye dee ")],
    &[PatternRule::new(" ADSB ", " Hey Dee Ess Bee ")],
    &[PatternRule::new(" EKF ", " Eee Kay Eff ")],
    &[PatternRule::new("PREARM", "pre arm")],
    &[PatternRule::new("PITOT", "pee toe")],
];

struct CompiledRule {
    regex: Regex,
    replacement: &'static str,
}

lazy_static! {
    static ref COMPILED_ABBREVIATIONS: Vec<Vec<CompiledRule>> = ABBREVIATIONS
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|rule| CompiledRule {
                    regex: Regex::new(&format!("(?i){}", regex::escape(rule.matcher))).unwrap(),
                    replacement: rule.replacement,
                })
                .collect()
        })
        .collect();

    /// `-` directly in front of a number
    static ref NEGATIVE_RE: Regex = Regex::new(r"(-)[0-9]*\.?[0-9]").unwrap();

    /// `.` between two runs of digits
    static ref DECIMAL_RE: Regex = Regex::new(r"([0-9]+)(\.)([0-9]+)").unwrap();

    /// `m` after a number, not followed by another letter
    static ref METER_RE: Regex = Regex::new(r"[0-9]*\.?[0-9]\s?(m)([^A-Za-z]|$)").unwrap();

    static ref MILLISECONDS_RE: Regex = Regex::new(r"([0-9]+)ms").unwrap();
}

/// Normalize a raw status message for speech
///
/// Total: text no rule recognises comes back unchanged.
pub fn normalize_text_for_speech(raw: &str) -> String {
    let mut result = expand_abbreviations(raw);
    result = spell_negative_numbers(&result);
    result = spell_decimal_points(&result);
    result = spell_meter_units(&result);

    // Durations are located in the raw message, not the rewritten one
    spell_millisecond_duration(raw, &result)
}

/// Apply the abbreviation table in order
pub fn expand_abbreviations(text: &str) -> String {
    let mut result = text.to_string();

    for group in COMPILED_ABBREVIATIONS.iter() {
        if let Some(rule) = group.iter().find(|rule| rule.regex.is_match(&result)) {
            result = rule
                .regex
                .replace_all(&result, NoExpand(rule.replacement))
                .into_owned();
        }
    }

    result
}

/// "-3" -> " negative 3"
pub fn spell_negative_numbers(text: &str) -> String {
    replace_marker_until_stable(text, &NEGATIVE_RE, 1, " negative ")
}

/// "12.5" -> "12 point 5"
pub fn spell_decimal_points(text: &str) -> String {
    replace_marker_until_stable(text, &DECIMAL_RE, 2, " point ")
}

/// "5m" -> "5 meters"
pub fn spell_meter_units(text: &str) -> String {
    replace_marker_until_stable(text, &METER_RE, 1, " meters")
}

/// Replace the first `<digits>ms` token found in `original` with a spoken
/// duration wherever it appears in `rewritten`
///
/// Values of one second or less are left as they are.
pub fn spell_millisecond_duration(original: &str, rewritten: &str) -> String {
    let Some(caps) = MILLISECONDS_RE.captures(original) else {
        return rewritten.to_string();
    };

    let phrase = caps[1].parse::<u64>().ok().and_then(format_duration_ms);
    match phrase {
        Some(phrase) => rewritten.replace(&caps[0], &phrase),
        None => rewritten.to_string(),
    }
}

/// Render a millisecond count as minutes and seconds
///
/// Returns `None` for values that should not be rewritten (1000 ms or less).
pub fn format_duration_ms(ms: u64) -> Option<String> {
    if ms <= 1000 {
        return None;
    }

    if ms < 60_000 {
        let seconds = ms / 1000;
        return Some(format!("{} second{}", seconds, plural(seconds)));
    }

    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    if seconds == 0 {
        Some(format!("{} minute{}", minutes, plural(minutes)))
    } else {
        Some(format!(
            "{} minute{} and {} second{}",
            minutes,
            plural(minutes),
            seconds,
            plural(seconds)
        ))
    }
}

fn plural(count: u64) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

/// Replace capture `group` of the first match, repeating until nothing matches
///
/// Every replacement removes the character that made the pattern match, so
/// the loop always terminates.
fn replace_marker_until_stable(text: &str, re: &Regex, group: usize, replacement: &str) -> String {
    let mut result = text.to_string();

    loop {
        let range = match re.captures(&result).and_then(|caps| caps.get(group)) {
            Some(m) => m.range(),
            None => break,
        };
        result.replace_range(range, replacement);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_error_prefixes() {
        assert_eq!(expand_abbreviations("ERR: gps lost"), "error. gps lost");
        assert_eq!(expand_abbreviations("ERR compass"), "error compass");
    }

    #[test]
    fn test_expand_is_case_insensitive() {
        assert_eq!(expand_abbreviations("PreArm: Check"), "pre arm: Check");
        assert_eq!(expand_abbreviations("posctl"), "Position Control");
    }

    #[test]
    fn test_auto_rtl_shadows_rtl() {
        let normalized = normalize_text_for_speech("auto_rtl failed");
        assert_eq!(normalized, "auto Return To Launch failed");
        assert!(!normalized.contains("auto auto"));
    }

    #[test]
    fn test_bare_rtl_skipped_when_auto_rtl_present() {
        // Only the first matching rule of the group fires
        assert_eq!(
            expand_abbreviations("AUTO_RTL then RTL"),
            "auto Return To Launch then RTL"
        );
        assert_eq!(expand_abbreviations("RTL engaged"), "Return To Launch engaged");
    }

    #[test]
    fn test_expand_mission_terms() {
        assert_eq!(
            expand_abbreviations("CMD WP 3 REJ."),
            "command way point 3 Rejected"
        );
        assert_eq!(
            expand_abbreviations("COMPID mismatch"),
            "component eye dee mismatch"
        );
    }

    #[test]
    fn test_expand_space_delimited_terms() {
        assert_eq!(
            expand_abbreviations("loaded params ok"),
            "loaded parameters ok"
        );
        assert_eq!(expand_abbreviations("bad id here"), "bad eye dee here");
        assert_eq!(
            expand_abbreviations("check EKF variance"),
            "check Eee Kay Eff variance"
        );
        // No surrounding spaces, no match
        assert_eq!(expand_abbreviations("EKF variance"), "EKF variance");
    }

    #[test]
    fn test_replacements_never_contain_their_trigger() {
        for group in ABBREVIATIONS {
            for rule in group.iter() {
                assert!(
                    !rule
                        .replacement
                        .to_lowercase()
                        .contains(&rule.matcher.to_lowercase()),
                    "{} reintroduces its matcher",
                    rule.matcher
                );
            }
        }
    }

    #[test]
    fn test_signed_decimal_meters() {
        let normalized = normalize_text_for_speech("-12.5m");
        assert_eq!(normalized, " negative 12 point 5 meters");

        let negative = normalized.find("negative").unwrap();
        let point = normalized.find("point").unwrap();
        let meters = normalized.find("meters").unwrap();
        assert!(negative < point && point < meters);
        assert_eq!(normalized.matches("negative").count(), 1);
        assert_eq!(normalized.matches("point").count(), 1);
        assert_eq!(normalized.matches("meters").count(), 1);
    }

    #[test]
    fn test_multiple_negatives() {
        assert_eq!(
            spell_negative_numbers("x -1 y -2"),
            "x  negative 1 y  negative 2"
        );
    }

    #[test]
    fn test_decimal_points() {
        assert_eq!(spell_decimal_points("1.5 and 2.25"), "1 point 5 and 2 point 25");
        assert_eq!(spell_decimal_points("v1."), "v1.");
    }

    #[test]
    fn test_meter_suffix_rules() {
        assert_eq!(spell_meter_units("Alt 3m."), "Alt 3 meters.");
        assert_eq!(spell_meter_units("climb 5 m"), "climb 5  meters");
        // Followed by a letter: a word, not a unit
        assert_eq!(spell_meter_units("5 mode"), "5 mode");
        assert_eq!(spell_meter_units("1500ms"), "1500ms");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(999), None);
        assert_eq!(format_duration_ms(1000), None);
        assert_eq!(format_duration_ms(1500).as_deref(), Some("1 second"));
        assert_eq!(format_duration_ms(2500).as_deref(), Some("2 seconds"));
        assert_eq!(format_duration_ms(60_000).as_deref(), Some("1 minute"));
        assert_eq!(
            format_duration_ms(61_000).as_deref(),
            Some("1 minute and 1 second")
        );
        assert_eq!(
            format_duration_ms(125_000).as_deref(),
            Some("2 minutes and 5 seconds")
        );
        assert_eq!(format_duration_ms(180_400).as_deref(), Some("3 minutes"));
    }

    #[test]
    fn test_duration_in_message() {
        assert_eq!(
            normalize_text_for_speech("timeout 1500ms"),
            "timeout 1 second"
        );
        assert_eq!(
            normalize_text_for_speech("timeout 125000ms"),
            "timeout 2 minutes and 5 seconds"
        );
        assert_eq!(normalize_text_for_speech("wait 500ms"), "wait 500ms");
    }

    #[test]
    fn test_duration_uses_first_token_only() {
        assert_eq!(
            normalize_text_for_speech("a 2000ms b 3000ms"),
            "a 2 seconds b 3000ms"
        );
    }

    #[test]
    fn test_unmatched_text_passes_through() {
        assert_eq!(normalize_text_for_speech(""), "");
        assert_eq!(normalize_text_for_speech("Armed"), "Armed");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "AUTO_RTL engaged",
            "RTL",
            "ERR: CMD WP 3 REJ.",
            "-12.5m",
            "timeout 1500ms",
            "PREARM: PITOT check",
        ] {
            let once = normalize_text_for_speech(input);
            assert_eq!(normalize_text_for_speech(&once), once, "input: {}", input);
        }
    }
}
