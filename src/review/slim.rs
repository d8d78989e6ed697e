use std::collections::HashSet;

use crate::models::records::{Record, RecordSet};
use crate::normalize::phone::{is_dach, is_fax, normalize_phone, parse_number_list};
use crate::selection::engine::additional_numbers;
use crate::selection::metadata::build_metadata;

/// Column order of the hand-off sheet. Callers feed this the suggested or
/// final output of the review workflow.
pub const SLIM_COLUMNS: [&str; 29] = [
    "Company",
    "# Employees",
    "Industry",
    "Website",
    "Company Linkedin Url",
    "Company Street",
    "Company City",
    "Company State",
    "Company Country",
    "Company Postal Code",
    "Company Address",
    "model_score",
    "reasoning",
    "first_call_person_first_name",
    "first_call_person_last_name",
    "first_call_number",
    "first_call_type",
    "backup_number",
    "backup_number_type",
    "additional_number_1",
    "additional_number_1_type",
    "additional_number_1_first_name",
    "additional_number_1_last_name",
    "additional_number_2",
    "additional_number_2_type",
    "additional_number_2_first_name",
    "additional_number_2_last_name",
    "sales_pitch_excerpt",
    "sales_pitch_lead_count",
];

const PASSTHROUGH_COLUMNS: [&str; 12] = [
    "# Employees",
    "Industry",
    "Website",
    "Company Linkedin Url",
    "Company Street",
    "Company City",
    "Company State",
    "Company Country",
    "Company Postal Code",
    "Company Address",
    "model_score",
    "reasoning",
];

/// Split a full name into (first, last), best effort: "Last, First" comes
/// from imported lists, "First Middle Last" from extracted text.
pub fn split_name(full: &str) -> (String, String) {
    let s = full.trim();
    if s.is_empty() {
        return (String::new(), String::new());
    }
    if s.contains(',') {
        let parts: Vec<&str> = s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.len() >= 2 {
            return (parts[1..].join(" "), parts[0].to_string());
        }
    }
    let parts: Vec<&str> = s.split_whitespace().collect();
    match parts.len() {
        0 => (String::new(), String::new()),
        1 => (parts[0].to_string(), String::new()),
        n => (parts[0].to_string(), parts[n - 1].to_string()),
    }
}

/// Derive the slim hand-off sheet: identity passthrough, first-call person
/// split, a refined backup (main line when it differs from first-call, else
/// the next eligible top number, else the recorded conditional backup) and
/// up to two additional numbers for outreach diversity.
pub fn export_slim(records: &RecordSet) -> RecordSet {
    let mut out = RecordSet::new(SLIM_COLUMNS.iter().map(|c| c.to_string()).collect());

    for record in &records.records {
        let metadata = build_metadata(record);
        let suspected: HashSet<String> = parse_number_list(record.get("SuspectedOtherOrgNumbers"))
            .into_iter()
            .collect();

        let company = if record.is_blank("Company") {
            record.get("CompanyName")
        } else {
            record.get("Company")
        };

        let fc_number = normalize_phone(record.get("first_call_number")).unwrap_or_default();
        let (fc_first, fc_last) = split_name(record.get("first_call_person_name"));

        let ml_number = normalize_phone(record.get("main_line_backup_number")).unwrap_or_default();
        let conditional_backup =
            normalize_phone(record.get("backup_number_if_mainline_top1")).unwrap_or_default();

        let eligible_top = |number_col: &str, type_col: &str| -> Option<(String, String)> {
            let number = normalize_phone(record.get(number_col))?;
            let type_label = record.get(type_col).to_string();
            if !is_dach(&number) || is_fax(&type_label) || suspected.contains(&number) {
                return None;
            }
            Some((number, type_label))
        };

        // Backup: a main line that differs from first-call is the natural
        // second number. When they are equal, fall through to the next
        // eligible top slot, then to the recorded conditional backup.
        let (backup_number, backup_type) = if !ml_number.is_empty() && ml_number != fc_number {
            (ml_number.clone(), record.get("main_line_backup_type").to_string())
        } else {
            [
                ("Top_Number_1", "Top_Type_1"),
                ("Top_Number_2", "Top_Type_2"),
                ("Top_Number_3", "Top_Type_3"),
            ]
            .iter()
            .find_map(|(number_col, type_col)| {
                eligible_top(number_col, type_col)
                    .filter(|(number, _)| !number.is_empty() && *number != fc_number)
            })
            .unwrap_or_else(|| {
                if !conditional_backup.is_empty() && conditional_backup != fc_number {
                    (
                        conditional_backup.clone(),
                        record.get("backup_number_type").to_string(),
                    )
                } else {
                    (String::new(), String::new())
                }
            })
        };

        let used: HashSet<String> = [fc_number.clone(), ml_number, backup_number.clone()]
            .into_iter()
            .filter(|n| !n.is_empty())
            .collect();
        let additional = additional_numbers(record, &metadata, &used);

        let mut row = Record::new();
        row.set("Company", company);
        for column in PASSTHROUGH_COLUMNS {
            row.set(column, record.get(column));
        }
        row.set("first_call_person_first_name", fc_first);
        row.set("first_call_person_last_name", fc_last);
        row.set("first_call_number", fc_number);
        row.set("first_call_type", record.get("first_call_type"));
        row.set("backup_number", backup_number);
        row.set("backup_number_type", backup_type);

        for (slot, selected) in [("1", additional.first()), ("2", additional.get(1))] {
            let (number, type_label, first, last) = match selected {
                Some(s) => {
                    let (first, last) = split_name(&s.person_name);
                    (s.number.clone(), s.type_label.clone(), first, last)
                }
                None => Default::default(),
            };
            row.set(format!("additional_number_{}", slot), number);
            row.set(format!("additional_number_{}_type", slot), type_label);
            row.set(format!("additional_number_{}_first_name", slot), first);
            row.set(format!("additional_number_{}_last_name", slot), last);
        }

        row.set("sales_pitch_excerpt", record.get("sales_pitch_excerpt"));
        row.set("sales_pitch_lead_count", record.get("sales_pitch_lead_count"));
        out.records.push(row);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name_variants() {
        assert_eq!(split_name("Muster, Max"), ("Max".to_string(), "Muster".to_string()));
        assert_eq!(split_name("Max Muster"), ("Max".to_string(), "Muster".to_string()));
        assert_eq!(
            split_name("Max von Muster"),
            ("Max".to_string(), "Muster".to_string())
        );
        assert_eq!(split_name("Max"), ("Max".to_string(), String::new()));
        assert_eq!(split_name("  "), (String::new(), String::new()));
    }

    fn enriched_record(extra: &[(&str, &str)]) -> RecordSet {
        let mut record = Record::from_pairs([
            ("Company", "Acme GmbH"),
            ("Website", "https://acme.de"),
        ]);
        for (column, value) in extra {
            record.set(*column, *value);
        }
        let mut set = RecordSet::new(vec!["Company".to_string(), "Website".to_string()]);
        set.records.push(record);
        set
    }

    #[test]
    fn test_main_line_differing_from_first_call_becomes_backup() {
        let set = enriched_record(&[
            ("first_call_number", "+4930111111"),
            ("main_line_backup_number", "+4930222222"),
            ("main_line_backup_type", "Main Line"),
        ]);
        let slim = export_slim(&set);
        let row = &slim.records[0];
        assert_eq!(row.get("backup_number"), "+4930222222");
        assert_eq!(row.get("backup_number_type"), "Main Line");
    }

    #[test]
    fn test_equal_main_line_falls_through_to_next_top() {
        let set = enriched_record(&[
            ("first_call_number", "+4930111111"),
            ("main_line_backup_number", "+4930111111"),
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Number_2", "+49 30 222222"),
            ("Top_Type_2", "Vertrieb"),
        ]);
        let slim = export_slim(&set);
        let row = &slim.records[0];
        assert_eq!(row.get("backup_number"), "+4930222222");
        assert_eq!(row.get("backup_number_type"), "Vertrieb");
    }

    #[test]
    fn test_recorded_conditional_backup_is_last_resort() {
        let set = enriched_record(&[
            ("first_call_number", "+4930111111"),
            ("backup_number_if_mainline_top1", "+4930333333"),
            ("backup_number_type", "Zentrale"),
        ]);
        let slim = export_slim(&set);
        let row = &slim.records[0];
        assert_eq!(row.get("backup_number"), "+4930333333");
        assert_eq!(row.get("backup_number_type"), "Zentrale");
    }

    #[test]
    fn test_additional_numbers_exclude_used_and_carry_person_split() {
        let set = enriched_record(&[
            ("first_call_number", "+4930111111"),
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Number_2", "+49 30 222222"),
            ("Top_Type_2", "Direct"),
            ("Top_Number_3", "+49 30 333333"),
            (
                "LLMExtractedNumbers",
                r#"[{"number": "+4930222222", "associated_person_name": "Muster, Max"}]"#,
            ),
        ]);
        let slim = export_slim(&set);
        let row = &slim.records[0];
        // Top_1 is the first-call and doubles as the fall-through backup
        // candidate... it equals first_call, so Top_2 becomes the backup and
        // Top_3 the only additional number.
        assert_eq!(row.get("backup_number"), "+4930222222");
        assert_eq!(row.get("additional_number_1"), "+4930333333");
        assert_eq!(row.get("additional_number_2"), "");
    }

    #[test]
    fn test_company_falls_back_to_company_name() {
        let mut set = enriched_record(&[("first_call_number", "+4930111111")]);
        set.records[0].set("Company", "");
        set.records[0].set("CompanyName", "Beta AG");
        let slim = export_slim(&set);
        assert_eq!(slim.records[0].get("Company"), "Beta AG");
        assert_eq!(slim.columns.len(), SLIM_COLUMNS.len());
    }

    #[test]
    fn test_person_split_on_additional_number() {
        let set = enriched_record(&[
            ("first_call_number", "+4930999999"),
            ("Top_Number_1", "+49 30 222222"),
            ("Top_Type_1", "Direct"),
            (
                "LLMExtractedNumbers",
                r#"[{"number": "+4930222222", "associated_person_name": "Muster, Max"}]"#,
            ),
        ]);
        let slim = export_slim(&set);
        let row = &slim.records[0];
        // Top_1 differs from first-call, so it is consumed as the backup;
        // nothing is left over for the additional slots.
        assert_eq!(row.get("backup_number"), "+4930222222");
        assert_eq!(row.get("additional_number_1"), "");
    }
}
