use once_cell::sync::Lazy;
use regex::Regex;

static PLAIN_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static COMMA_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+,\d+$").unwrap());
static DOT_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+$").unwrap());

/// Rewrite a numeric-ish cell into the target spreadsheet locale: comma as
/// decimal separator, no thousands separator, no trailing zero fraction.
///
/// Mixed forms like `1.234,5` and `1,234.5` are disambiguated by taking
/// whichever separator occurs last as the decimal point. Unparsable input is
/// returned unchanged so the column round-trips instead of erroring.
pub fn to_locale_decimal(raw: &str) -> String {
    let original = raw.trim();
    if original.is_empty() {
        return String::new();
    }
    let s: String = original
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{00A0}')
        .collect();

    if PLAIN_INT.is_match(&s) {
        return s;
    }
    if COMMA_DECIMAL.is_match(&s) {
        return trim_fraction(&s, ',');
    }
    if DOT_DECIMAL.is_match(&s) {
        return trim_fraction(&s, '.');
    }

    // Mixed or exotic forms: the last separator is the decimal point.
    let candidate = if s.contains(',') && s.contains('.') {
        let last_comma = s.rfind(',').unwrap_or(0);
        let last_dot = s.rfind('.').unwrap_or(0);
        if last_comma > last_dot {
            s.replace('.', "").replace(',', ".")
        } else {
            s.replace(',', "")
        }
    } else {
        s.replace(',', ".")
    };

    match candidate.parse::<f64>() {
        Ok(num) if num.is_finite() => {
            let rendered = format!("{}", num);
            if rendered.contains('e') || rendered.contains('E') {
                return original.to_string();
            }
            rendered.replace('.', ",")
        }
        _ => original.to_string(),
    }
}

fn trim_fraction(s: &str, sep: char) -> String {
    let (int_part, fraction) = s.split_once(sep).unwrap_or((s, ""));
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        int_part.to_string()
    } else {
        format!("{},{}", int_part, fraction)
    }
}
