use log::debug;
use serde_json::Value;

use crate::normalize::cell_text;

/// Country prefixes eligible for outreach: Germany, Switzerland, Austria.
pub const DACH_PREFIXES: [&str; 3] = ["+49", "+41", "+43"];

/// Normalize a phone-ish string to `+` followed by digits.
///
/// Tolerates spreadsheet text-protection apostrophes, scientific notation and
/// trailing-`.0` float artifacts from spreadsheet round trips, and any mix of
/// separators. A leading `00` becomes `+`; a single leading `0` is assumed to
/// be a German local number. Returns `None` when the input is blank or has no
/// digits left after cleaning; everything else is minimally normalized even
/// if implausible, since DACH classification is the real admissibility gate.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix('\'') {
        s = rest.trim();
    }
    if s.is_empty() {
        return None;
    }

    let mut text = s.to_string();
    let upper = text.to_uppercase();
    if upper.contains("E+") || upper.contains("E-") {
        if let Ok(f) = text.parse::<f64>() {
            text = format!("{}", f.trunc() as i64);
        }
    }
    if let Some(stripped) = text.strip_suffix(".0") {
        text = stripped.to_string();
    }

    // Keep digits and at most one leading '+'.
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_digit() {
            cleaned.push(c);
        } else if c == '+' && cleaned.is_empty() {
            cleaned.push('+');
        }
    }

    let normalized = if let Some(rest) = cleaned.strip_prefix("00") {
        format!("+{}", rest)
    } else if cleaned.starts_with('0') {
        // Single leading zero: assume a German local number.
        format!("+49{}", &cleaned[1..])
    } else if !cleaned.is_empty() && !cleaned.starts_with('+') {
        format!("+{}", cleaned)
    } else {
        cleaned
    };

    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        debug!("Phone value '{}' has no digits after cleaning, skipping", raw);
        return None;
    }
    Some(normalized)
}

pub fn is_dach(number: &str) -> bool {
    DACH_PREFIXES.iter().any(|prefix| number.starts_with(prefix))
}

/// Fax detection is a substring test on the free-text type label, not an
/// enum: upstream labels vary ("Fax", "Telefax Zentrale", ...).
pub fn is_fax(type_label: &str) -> bool {
    let t = type_label.trim().to_lowercase();
    t.contains("fax") || t.contains("telefax")
}

/// Parse a list-like cell into normalized numbers. The cell can be a JSON
/// list, a Python-repr list (single quotes), or a `;`/`,`-separated string.
/// Entries that do not normalize are dropped.
pub fn parse_number_list(raw: &str) -> Vec<String> {
    let s = raw.trim();
    if s.is_empty() || s == "[]" {
        return Vec::new();
    }

    if s.starts_with('[') && s.ends_with(']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
            return items
                .iter()
                .filter_map(|item| normalize_phone(&cell_text(item)))
                .collect();
        }
        // Python-repr lists are not valid JSON; split the body by hand.
        let inner = &s[1..s.len() - 1];
        return inner
            .split(',')
            .map(|part| part.trim().trim_matches(|c| c == '\'' || c == '"'))
            .filter(|part| !part.is_empty())
            .filter_map(normalize_phone)
            .collect();
    }

    s.split([';', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(normalize_phone)
        .collect()
}
