use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::models::records::Record;
use crate::normalize::cell_text;
use crate::normalize::phone::normalize_phone;

/// Everything known about one canonical number, merged across the record's
/// metadata sources. Empty string means "not supplied".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberMetadata {
    pub type_label: String,
    pub source_url: String,
    pub person_name: String,
    pub person_role: String,
    pub person_department: String,
}

pub type NumberMetadataMap = HashMap<String, NumberMetadata>;

/// Merge the record's metadata sources into one number -> metadata map.
///
/// Sources are visited in fixed order: `LLMExtractedNumbers`, then
/// `PersonContacts`, then the single `BestPersonContact*` fields. Each field
/// keeps the first non-blank value it sees; later sources only fill gaps.
/// Malformed blobs degrade to "no metadata", never to a failed run.
pub fn build_metadata(record: &Record) -> NumberMetadataMap {
    let mut lookup = NumberMetadataMap::new();

    for entry in parse_dict_list(record.get("LLMExtractedNumbers")) {
        let Some(number) = normalize_phone(&entry_text(&entry, &["number"])) else {
            continue;
        };
        let meta = lookup.entry(number).or_default();
        fill(&mut meta.type_label, entry_text(&entry, &["type"]));
        fill(&mut meta.source_url, entry_text(&entry, &["source_url"]));
        fill(
            &mut meta.person_name,
            entry_text(&entry, &["associated_person_name"]),
        );
        fill(
            &mut meta.person_role,
            entry_text(&entry, &["associated_person_role"]),
        );
        fill(
            &mut meta.person_department,
            entry_text(&entry, &["associated_person_department"]),
        );
    }

    // PersonContacts key names vary by upstream; try the common spellings.
    for entry in parse_dict_list(record.get("PersonContacts")) {
        let raw_number = entry_text(&entry, &["number", "phone", "phone_number"]);
        let Some(number) = normalize_phone(&raw_number) else {
            continue;
        };
        let meta = lookup.entry(number).or_default();
        fill(&mut meta.person_name, entry_text(&entry, &["name", "full_name"]));
        fill(&mut meta.person_role, entry_text(&entry, &["role", "title"]));
        fill(&mut meta.person_department, entry_text(&entry, &["department"]));
    }

    if let Some(number) = normalize_phone(record.get("BestPersonContactNumber")) {
        let meta = lookup.entry(number).or_default();
        fill(&mut meta.person_name, record.get("BestPersonContactName").to_string());
        fill(&mut meta.person_role, record.get("BestPersonContactRole").to_string());
        fill(
            &mut meta.person_department,
            record.get("BestPersonContactDepartment").to_string(),
        );
    }

    lookup
}

/// Parse a JSON-stringified list of objects; anything else yields an empty
/// list. Non-object list members are skipped.
fn parse_dict_list(raw: &str) -> Vec<Map<String, Value>> {
    let s = raw.trim();
    if s.is_empty() || s == "[]" || !(s.starts_with('[') && s.ends_with(']')) {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn entry_text(entry: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        if let Some(value) = entry.get(*key) {
            let text = cell_text(value);
            if !text.trim().is_empty() {
                return text;
            }
        }
    }
    String::new()
}

fn fill(slot: &mut String, value: String) {
    let trimmed = value.trim();
    if slot.is_empty() && !trimmed.is_empty() {
        *slot = trimmed.to_string();
    }
}
