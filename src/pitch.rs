use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::numeric::to_locale_decimal;

/// Fixed phrases framing the dynamic part of a generated sales pitch.
pub const PITCH_START_PHRASE: &str =
    "Ich rufe Sie an, weil wir bereits sehr erfolgreich ein ähnliches Projekt umgesetzt haben";
pub const PITCH_END_PHRASE: &str = "Für dieses";

static EXCERPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "(?s){}(.*?){}",
        regex::escape(PITCH_START_PHRASE),
        regex::escape(PITCH_END_PHRASE)
    ))
    .unwrap()
});

static LEAD_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s+Leads\b").unwrap());

/// The pitch text between the fixed start and end phrases, or `""` when
/// either phrase is missing.
pub fn extract_pitch_excerpt(pitch: &str) -> String {
    if !pitch.contains(PITCH_START_PHRASE) || !pitch.contains(PITCH_END_PHRASE) {
        return String::new();
    }
    EXCERPT_RE
        .captures(pitch)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

/// First "<n> Leads" figure in the pitch, normalized for the target
/// spreadsheet locale. `""` when no such figure appears.
pub fn extract_lead_count(pitch: &str) -> String {
    LEAD_COUNT_RE
        .captures(pitch)
        .map(|caps| to_locale_decimal(&caps[1]))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch_with(dynamic: &str) -> String {
        format!(
            "Guten Tag! {} {} {} Projekt bieten wir Ihnen einen Rabatt an.",
            PITCH_START_PHRASE, dynamic, PITCH_END_PHRASE
        )
    }

    #[test]
    fn test_excerpt_between_phrases() {
        let pitch = pitch_with("und dabei 12 Leads pro Woche generiert haben.");
        assert_eq!(
            extract_pitch_excerpt(&pitch),
            "und dabei 12 Leads pro Woche generiert haben."
        );
    }

    #[test]
    fn test_excerpt_missing_phrase_yields_empty() {
        assert_eq!(extract_pitch_excerpt("Kein Standardtext."), "");
        assert_eq!(
            extract_pitch_excerpt(&format!("{} nur Anfang", PITCH_START_PHRASE)),
            ""
        );
    }

    #[test]
    fn test_excerpt_is_non_greedy() {
        let pitch = format!(
            "{} erster Teil {} zweiter Teil {}",
            PITCH_START_PHRASE, PITCH_END_PHRASE, PITCH_END_PHRASE
        );
        assert_eq!(extract_pitch_excerpt(&pitch), "erster Teil");
    }

    #[test]
    fn test_lead_count_integer_and_decimal() {
        assert_eq!(extract_lead_count("im Schnitt 8 Leads pro Tag"), "8");
        assert_eq!(extract_lead_count("im Schnitt 8.3 Leads pro Tag"), "8,3");
        assert_eq!(extract_lead_count("im Schnitt 8,3 leads pro Tag"), "8,3");
        assert_eq!(extract_lead_count("keine Zahlen hier"), "");
    }
}
