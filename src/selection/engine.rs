use std::collections::HashSet;

use log::debug;

use crate::models::records::Record;
use crate::normalize::phone::{is_dach, is_fax, normalize_phone, parse_number_list};
use crate::selection::metadata::NumberMetadataMap;

/// Which column family a selected number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    Top1,
    Top2,
    Top3,
    MainOffice,
    OtherRelevant,
    CompanyPhone,
    PhoneNumber,
}

impl SlotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotSource::Top1 => "Top_1",
            SlotSource::Top2 => "Top_2",
            SlotSource::Top3 => "Top_3",
            SlotSource::MainOffice => "MainOffice",
            SlotSource::OtherRelevant => "OtherRelevant",
            SlotSource::CompanyPhone => "CompanyPhone",
            SlotSource::PhoneNumber => "PhoneNumber",
        }
    }
}

/// Type label attached to the relaxed input-column fallbacks.
pub const INPUT_BACKUP_TYPE: &str = "Input Backup";

const TOP_SLOTS: [(SlotSource, &str, &str, &str); 3] = [
    (SlotSource::Top1, "Top_Number_1", "Top_Type_1", "Top_SourceURL_1"),
    (SlotSource::Top2, "Top_Number_2", "Top_Type_2", "Top_SourceURL_2"),
    (SlotSource::Top3, "Top_Number_3", "Top_Type_3", "Top_SourceURL_3"),
];

const INPUT_FALLBACK_SLOTS: [(SlotSource, &str); 2] = [
    (SlotSource::CompanyPhone, "Company Phone"),
    (SlotSource::PhoneNumber, "PhoneNumber"),
];

#[derive(Debug, Clone)]
pub struct SelectedNumber {
    pub number: String,
    pub source: SlotSource,
    pub type_label: String,
    pub source_url: String,
    pub person_name: String,
    pub person_role: String,
    pub person_department: String,
}

/// The three phone-number roles resolved for one record. `None` everywhere is
/// a legitimate outcome ("no usable phone"), not an error.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub first_call: Option<SelectedNumber>,
    pub main_line: Option<SelectedNumber>,
    pub backup: Option<SelectedNumber>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DachRule {
    Required,
    Relaxed,
}

#[derive(Debug, Clone)]
struct Candidate {
    number: String,
    source: SlotSource,
    type_label: String,
    source_url: String,
}

impl Candidate {
    fn into_selected(self, metadata: &NumberMetadataMap) -> SelectedNumber {
        let info = metadata.get(&self.number);
        SelectedNumber {
            person_name: info.map(|m| m.person_name.clone()).unwrap_or_default(),
            person_role: info.map(|m| m.person_role.clone()).unwrap_or_default(),
            person_department: info
                .map(|m| m.person_department.clone())
                .unwrap_or_default(),
            number: self.number,
            source: self.source,
            type_label: self.type_label,
            source_url: self.source_url,
        }
    }
}

fn eligible(number: &str, type_label: &str, suspected: &HashSet<String>, rule: DachRule) -> bool {
    if number.is_empty() || is_fax(type_label) || suspected.contains(number) {
        return false;
    }
    rule == DachRule::Relaxed || is_dach(number)
}

fn suspected_numbers(record: &Record) -> HashSet<String> {
    parse_number_list(record.get("SuspectedOtherOrgNumbers"))
        .into_iter()
        .collect()
}

fn main_office_candidate(record: &Record) -> Option<Candidate> {
    let number = normalize_phone(record.get("MainOffice_Number"))?;
    Some(Candidate {
        number,
        source: SlotSource::MainOffice,
        type_label: record.get("MainOffice_Type").to_string(),
        source_url: record.get("MainOffice_SourceURL").to_string(),
    })
}

/// The full first-call fallback chain as data: candidates in priority order,
/// each tagged with its DACH rule. Keeping the order in one flat list makes
/// the priority auditable and lets a single reducer pick the winner.
fn candidate_chain(record: &Record, metadata: &NumberMetadataMap) -> Vec<(Candidate, DachRule)> {
    let mut chain = Vec::new();

    for (source, number_col, type_col, url_col) in TOP_SLOTS {
        if let Some(number) = normalize_phone(record.get(number_col)) {
            chain.push((
                Candidate {
                    number,
                    source,
                    type_label: record.get(type_col).to_string(),
                    source_url: record.get(url_col).to_string(),
                },
                DachRule::Required,
            ));
        }
    }

    if let Some(candidate) = main_office_candidate(record) {
        chain.push((candidate, DachRule::Required));
    }

    // OtherRelevantNumbers: person-attached candidates ahead of anonymous
    // ones, original order otherwise. Type and source URL come from the
    // metadata map when it has them.
    let mut others = parse_number_list(record.get("OtherRelevantNumbers"));
    others.sort_by_key(|number| {
        metadata
            .get(number)
            .map_or(true, |m| m.person_name.trim().is_empty())
    });
    for number in others {
        let info = metadata.get(&number);
        let type_label = info
            .map(|m| m.type_label.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or("Other Relevant")
            .to_string();
        let source_url = info.map(|m| m.source_url.clone()).unwrap_or_default();
        chain.push((
            Candidate {
                number,
                source: SlotSource::OtherRelevant,
                type_label,
                source_url,
            },
            DachRule::Required,
        ));
    }

    // Input columns: a DACH pass first, then a relaxed pass that accepts any
    // normalizable number. PhoneNumber is only reached when Company Phone
    // yields nothing at all.
    for (source, column) in INPUT_FALLBACK_SLOTS {
        if let Some(number) = normalize_phone(record.get(column)) {
            for rule in [DachRule::Required, DachRule::Relaxed] {
                chain.push((
                    Candidate {
                        number: number.clone(),
                        source,
                        type_label: INPUT_BACKUP_TYPE.to_string(),
                        source_url: String::new(),
                    },
                    rule,
                ));
            }
        }
    }

    chain
}

/// Resolve first-call, main-line and the conditional backup for one record.
///
/// First-call walks the candidate chain and takes the first eligible entry.
/// Main-line is restricted to `MainOffice_Number` (DACH required); when the
/// chain already consumed that slot, the two are equal by construction. The
/// backup is only populated when first-call came from `Top_Number_1` and
/// happens to equal the main-line number, in which case the next distinct
/// eligible top number is recorded.
pub fn resolve_numbers(record: &Record, metadata: &NumberMetadataMap) -> Resolution {
    let suspected = suspected_numbers(record);

    let main_line = main_office_candidate(record)
        .filter(|c| eligible(&c.number, &c.type_label, &suspected, DachRule::Required))
        .map(|c| c.into_selected(metadata));

    let first_call = candidate_chain(record, metadata)
        .into_iter()
        .find(|(candidate, rule)| {
            eligible(&candidate.number, &candidate.type_label, &suspected, *rule)
        })
        .map(|(candidate, _)| candidate.into_selected(metadata));

    if let Some(fc) = &first_call {
        if !is_dach(&fc.number) {
            debug!(
                "Accepted non-DACH fallback {} from the {} slot",
                fc.number,
                fc.source.as_str()
            );
        }
    }

    let backup = match (&first_call, &main_line) {
        (Some(fc), Some(ml)) if fc.source == SlotSource::Top1 && fc.number == ml.number => {
            TOP_SLOTS[1..].iter().find_map(|(source, number_col, type_col, url_col)| {
                let number = normalize_phone(record.get(number_col))?;
                let type_label = record.get(type_col).to_string();
                if number != fc.number
                    && eligible(&number, &type_label, &suspected, DachRule::Required)
                {
                    Some(
                        Candidate {
                            number,
                            source: *source,
                            type_label,
                            source_url: record.get(url_col).to_string(),
                        }
                        .into_selected(metadata),
                    )
                } else {
                    None
                }
            })
        }
        _ => None,
    };

    Resolution {
        first_call,
        main_line,
        backup,
    }
}

/// Up to two further outreach numbers from the top slots: eligible, not in
/// `used`, pairwise distinct. Only the slim export asks for these.
pub fn additional_numbers(
    record: &Record,
    metadata: &NumberMetadataMap,
    used: &HashSet<String>,
) -> Vec<SelectedNumber> {
    let suspected = suspected_numbers(record);
    let mut picked: Vec<SelectedNumber> = Vec::new();

    for (source, number_col, type_col, url_col) in TOP_SLOTS {
        if picked.len() == 2 {
            break;
        }
        let Some(number) = normalize_phone(record.get(number_col)) else {
            continue;
        };
        let type_label = record.get(type_col).trim().to_string();
        if !eligible(&number, &type_label, &suspected, DachRule::Required)
            || used.contains(&number)
            || picked.iter().any(|p| p.number == number)
        {
            continue;
        }
        picked.push(
            Candidate {
                number,
                source,
                type_label,
                source_url: record.get(url_col).to_string(),
            }
            .into_selected(metadata),
        );
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::metadata::build_metadata;

    fn resolve(record: &Record) -> Resolution {
        let metadata = build_metadata(record);
        resolve_numbers(record, &metadata)
    }

    #[test]
    fn test_top_1_wins_regardless_of_other_slots() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Type_1", "Sales"),
            ("Top_Number_2", "+49 30 222222"),
            ("MainOffice_Number", "+49 30 333333"),
            ("Company Phone", "+1 212 555 1234"),
        ]);
        let resolution = resolve(&record);
        let fc = resolution.first_call.unwrap();
        assert_eq!(fc.number, "+4930111111");
        assert_eq!(fc.source, SlotSource::Top1);
        assert_eq!(fc.type_label, "Sales");
    }

    #[test]
    fn test_fax_and_excluded_top_numbers_are_skipped() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Type_1", "Telefax"),
            ("Top_Number_2", "+49 30 222222"),
            ("Top_Number_3", "+49 30 333333"),
            ("SuspectedOtherOrgNumbers", "[\"+4930222222\"]"),
        ]);
        let fc = resolve(&record).first_call.unwrap();
        assert_eq!(fc.number, "+4930333333");
        assert_eq!(fc.source, SlotSource::Top3);
    }

    #[test]
    fn test_main_office_serves_as_first_call_when_tops_fail() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+1 212 555 1234"),
            ("MainOffice_Number", "+49 30 444444"),
            ("MainOffice_Type", "Main Line"),
        ]);
        let resolution = resolve(&record);
        let fc = resolution.first_call.unwrap();
        let ml = resolution.main_line.unwrap();
        assert_eq!(fc.number, "+4930444444");
        assert_eq!(fc.source, SlotSource::MainOffice);
        assert_eq!(ml.number, fc.number);
    }

    #[test]
    fn test_other_relevant_prefers_person_attached_numbers() {
        let record = Record::from_pairs([
            ("OtherRelevantNumbers", "[\"+4930555555\", \"+4930666666\"]"),
            (
                "LLMExtractedNumbers",
                r#"[{"number": "+4930666666", "type": "Direct", "associated_person_name": "Max Muster"}]"#,
            ),
        ]);
        let fc = resolve(&record).first_call.unwrap();
        assert_eq!(fc.number, "+4930666666");
        assert_eq!(fc.source, SlotSource::OtherRelevant);
        assert_eq!(fc.type_label, "Direct");
        assert_eq!(fc.person_name, "Max Muster");
    }

    #[test]
    fn test_anonymous_other_relevant_keeps_default_label() {
        let record = Record::from_pairs([("OtherRelevantNumbers", "+49 30 555555")]);
        let fc = resolve(&record).first_call.unwrap();
        assert_eq!(fc.type_label, "Other Relevant");
    }

    #[test]
    fn test_company_phone_dach_beats_relaxed() {
        let record = Record::from_pairs([("Company Phone", "030 777777")]);
        let fc = resolve(&record).first_call.unwrap();
        assert_eq!(fc.number, "+4930777777");
        assert_eq!(fc.source, SlotSource::CompanyPhone);
        assert_eq!(fc.type_label, INPUT_BACKUP_TYPE);
    }

    #[test]
    fn test_relaxed_company_phone_accepted_when_no_dach_exists() {
        let record = Record::from_pairs([
            ("Company Phone", "+1 212 555 1234"),
            ("PhoneNumber", "+44 20 1234 5678"),
        ]);
        let fc = resolve(&record).first_call.unwrap();
        // Company Phone is exhausted (including its relaxed pass) before
        // PhoneNumber is considered at all.
        assert_eq!(fc.number, "+12125551234");
        assert_eq!(fc.source, SlotSource::CompanyPhone);
        assert_eq!(fc.type_label, INPUT_BACKUP_TYPE);
    }

    #[test]
    fn test_phone_number_used_only_when_company_phone_empty() {
        let record = Record::from_pairs([("PhoneNumber", "+1 212 555 9999")]);
        let fc = resolve(&record).first_call.unwrap();
        assert_eq!(fc.number, "+12125559999");
        assert_eq!(fc.source, SlotSource::PhoneNumber);
    }

    #[test]
    fn test_no_eligible_candidate_is_not_found() {
        let record = Record::from_pairs([
            ("Top_Number_1", "fax only"),
            ("SuspectedOtherOrgNumbers", ""),
        ]);
        let resolution = resolve(&record);
        assert!(resolution.first_call.is_none());
        assert!(resolution.main_line.is_none());
        assert!(resolution.backup.is_none());
    }

    #[test]
    fn test_backup_populated_when_top1_equals_main_line() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Number_2", "+49 30 222222"),
            ("Top_Type_2", "Sales"),
            ("MainOffice_Number", "+4930111111"),
        ]);
        let resolution = resolve(&record);
        let backup = resolution.backup.unwrap();
        assert_eq!(backup.number, "+4930222222");
        assert_eq!(backup.source, SlotSource::Top2);
    }

    #[test]
    fn test_backup_empty_when_top1_differs_from_main_line() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Number_2", "+49 30 222222"),
            ("MainOffice_Number", "+49 30 999999"),
        ]);
        assert!(resolve(&record).backup.is_none());
    }

    #[test]
    fn test_backup_skips_fax_and_duplicate_tops() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Number_2", "+49 30 111111"),
            ("Top_Number_3", "+49 30 333333"),
            ("Top_Type_3", "Zentrale"),
            ("MainOffice_Number", "+49 30 111111"),
        ]);
        let backup = resolve(&record).backup.unwrap();
        assert_eq!(backup.number, "+4930333333");
    }

    #[test]
    fn test_additional_numbers_skip_used_and_duplicates() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+49 30 111111"),
            ("Top_Number_2", "+49 30 222222"),
            ("Top_Number_3", "+49 30 222222"),
        ]);
        let metadata = build_metadata(&record);
        let used: HashSet<String> = ["+4930111111".to_string()].into_iter().collect();
        let picked = additional_numbers(&record, &metadata, &used);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].number, "+4930222222");
    }

    #[test]
    fn test_person_fields_attached_to_top_selection() {
        let record = Record::from_pairs([
            ("Top_Number_1", "+49 30 111111"),
            (
                "LLMExtractedNumbers",
                r#"[{"number": "+4930111111", "associated_person_name": "Erika Beispiel", "associated_person_role": "CTO", "associated_person_department": "IT"}]"#,
            ),
        ]);
        let fc = resolve(&record).first_call.unwrap();
        assert_eq!(fc.person_name, "Erika Beispiel");
        assert_eq!(fc.person_role, "CTO");
        assert_eq!(fc.person_department, "IT");
    }
}
