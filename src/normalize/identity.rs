use crate::models::records::Record;

pub fn normalize_company(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Lower-case a URL and strip protocol, `www.` and trailing slashes. The
/// remainder (path, query) is kept verbatim so distinct entry pages stay
/// distinct identities.
pub fn normalize_entry_url(url: &str) -> String {
    let mut s = url.trim().to_lowercase();
    for prefix in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }
    s.trim_end_matches('/').to_string()
}

/// Identity key used to group records that represent the same company:
/// normalized company name and normalized entry URL, `CanonicalEntryURL`
/// falling back to `GivenURL`.
pub fn dedupe_key(record: &Record) -> String {
    let company = normalize_company(record.get("CompanyName"));
    let url = if record.is_blank("CanonicalEntryURL") {
        record.get("GivenURL")
    } else {
        record.get("CanonicalEntryURL")
    };
    format!("{}||{}", company, normalize_entry_url(url))
}
