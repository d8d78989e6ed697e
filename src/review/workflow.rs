use log::info;

use crate::models::records::RecordSet;
use crate::models::stats::{ApplySummary, ReviewSummary};
use crate::normalize::numeric::to_locale_decimal;
use crate::pitch::{extract_lead_count, extract_pitch_excerpt};
use crate::review::dedupe::{annotate_groups, resolve_keep_mask};
use crate::selection::engine::{resolve_numbers, SelectedNumber};
use crate::selection::metadata::build_metadata;
use crate::utils::progress::ProgressConfig;

/// Working-state columns. They drive the review round trip and are stripped
/// from the final and dropped outputs.
pub const HELPER_COLUMNS: [&str; 8] = [
    "dedupe_key",
    "dedupe_group_size",
    "review_needed",
    "_dedupe_score",
    "recommended_keep",
    "review_keep",
    "review_drop",
    "review_notes",
];

/// Human-editable override columns; created blank, never overwritten.
const REVIEW_COLUMNS: [&str; 3] = ["review_keep", "review_drop", "review_notes"];

const OPERATIONAL_COLUMNS: [&str; 14] = [
    "first_call_number",
    "first_call_type",
    "first_call_source_url",
    "first_call_person_name",
    "first_call_person_role",
    "first_call_person_department",
    "main_line_backup_number",
    "main_line_backup_type",
    "main_line_backup_source_url",
    "backup_number_if_mainline_top1",
    "backup_number_type",
    "backup_number_source_url",
    "sales_pitch_excerpt",
    "sales_pitch_lead_count",
];

/// Columns rewritten to the target spreadsheet locale so dot decimals
/// survive re-import.
const DECIMAL_COLUMNS: [&str; 6] = [
    "Avg Leads Per Day",
    "lead_count",
    "model_score",
    "cost_usd",
    "token_cost_usd",
    "sales_pitch_lead_count",
];

pub struct GenerateReviewOutcome {
    pub review: RecordSet,
    pub suggested: RecordSet,
    pub dropped: RecordSet,
    pub summary: ReviewSummary,
}

pub struct ApplyReviewOutcome {
    pub final_records: RecordSet,
    pub dropped: RecordSet,
    pub summary: ApplySummary,
}

/// Recompute every derived column on the set: dedupe annotation, review
/// columns, selection outputs, pitch derivation and the locale pass. Running
/// this on already-enriched input yields identical columns; nothing is
/// trusted from a previous run.
pub fn enrich(records: &mut RecordSet) {
    annotate_groups(records);
    for column in REVIEW_COLUMNS {
        records.ensure_column(column);
    }
    add_operational_columns(records);
}

fn add_operational_columns(records: &mut RecordSet) {
    for column in OPERATIONAL_COLUMNS {
        records.ensure_column(column);
    }

    let progress = ProgressConfig::from_env().create_bar(
        records.len() as u64,
        "  📞 [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} Resolving contact numbers...",
    );

    for record in records.records.iter_mut() {
        let metadata = build_metadata(record);
        let resolution = resolve_numbers(record, &metadata);

        let (fc_number, fc_type, fc_url) = number_parts(&resolution.first_call);
        let (ml_number, ml_type, ml_url) = number_parts(&resolution.main_line);
        let (bk_number, bk_type, bk_url) = number_parts(&resolution.backup);
        let (person_name, person_role, person_department) = resolution
            .first_call
            .as_ref()
            .map(|s| {
                (
                    s.person_name.clone(),
                    s.person_role.clone(),
                    s.person_department.clone(),
                )
            })
            .unwrap_or_default();

        record.set("first_call_number", fc_number);
        record.set("first_call_type", fc_type);
        record.set("first_call_source_url", fc_url);
        record.set("first_call_person_name", person_name);
        record.set("first_call_person_role", person_role);
        record.set("first_call_person_department", person_department);
        record.set("main_line_backup_number", ml_number);
        record.set("main_line_backup_type", ml_type);
        record.set("main_line_backup_source_url", ml_url);
        record.set("backup_number_if_mainline_top1", bk_number);
        record.set("backup_number_type", bk_type);
        record.set("backup_number_source_url", bk_url);

        let pitch = record.get("sales_pitch").to_string();
        record.set("sales_pitch_excerpt", extract_pitch_excerpt(&pitch));
        record.set("sales_pitch_lead_count", extract_lead_count(&pitch));

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    for column in DECIMAL_COLUMNS {
        if !records.has_column(column) {
            continue;
        }
        for record in records.records.iter_mut() {
            let rewritten = to_locale_decimal(record.get(column));
            record.set(column, rewritten);
        }
    }
}

fn number_parts(selected: &Option<SelectedNumber>) -> (String, String, String) {
    match selected {
        Some(s) => (s.number.clone(), s.type_label.clone(), s.source_url.clone()),
        None => Default::default(),
    }
}

/// Rows with neither a first-call nor a main-line number cannot be worked by
/// the ops team; split them off instead of erroring.
fn split_no_usable_phone(records: RecordSet) -> (RecordSet, RecordSet) {
    let mask: Vec<bool> = records
        .records
        .iter()
        .map(|record| {
            let metadata = build_metadata(record);
            let resolution = resolve_numbers(record, &metadata);
            resolution.first_call.is_some() || resolution.main_line.is_some()
        })
        .collect();
    records.partition(&mask)
}

fn strip_helper_columns(records: &mut RecordSet) {
    records.drop_columns(&HELPER_COLUMNS);
}

fn distinct_group_count(records: &RecordSet) -> usize {
    let mut keys: Vec<&str> = records
        .records
        .iter()
        .map(|r| r.get("dedupe_key"))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

/// Phase 1: enrich the whole set into the review artifact and derive the
/// suggested export by applying the default resolution immediately.
pub fn generate_review(mut records: RecordSet) -> GenerateReviewOutcome {
    enrich(&mut records);

    let input_rows = records.len();
    let dedupe_groups = distinct_group_count(&records);
    let rows_with_review_needed = records
        .records
        .iter()
        .filter(|r| r.get("review_needed") == "true")
        .count();

    let keep = resolve_keep_mask(&records);
    let (kept, _) = records.clone().partition(&keep);
    let (mut suggested, mut dropped) = split_no_usable_phone(kept);
    strip_helper_columns(&mut suggested);
    strip_helper_columns(&mut dropped);

    let summary = ReviewSummary {
        input_rows,
        dedupe_groups,
        rows_with_review_needed,
        suggested_rows_kept: suggested.len(),
        suggested_rows_dropped_no_usable_phone: dropped.len(),
        suggested_rows_dropped_no_dach: dropped.len(),
    };
    info!(
        "Review generated: {} rows, {} groups, {} need review, {} suggested ({} without usable phone)",
        summary.input_rows,
        summary.dedupe_groups,
        summary.rows_with_review_needed,
        summary.suggested_rows_kept,
        summary.suggested_rows_dropped_no_usable_phone
    );

    GenerateReviewOutcome {
        review: records,
        suggested,
        dropped,
        summary,
    }
}

/// Phase 2: resolve the hand-edited review artifact into the final export.
/// All derivation is recomputed first; the human may have edited source
/// columns, not just the override fields.
pub fn apply_review(mut records: RecordSet) -> ApplyReviewOutcome {
    enrich(&mut records);

    let review_rows = records.len();
    let keep = resolve_keep_mask(&records);
    let (kept, _) = records.partition(&keep);
    let kept_after_dedupe = kept.len();
    let (mut final_records, mut dropped) = split_no_usable_phone(kept);
    strip_helper_columns(&mut final_records);
    strip_helper_columns(&mut dropped);

    let summary = ApplySummary {
        review_rows,
        kept_after_dedupe,
        dropped_no_usable_phone: dropped.len(),
        dropped_no_dach: dropped.len(),
        final_rows: final_records.len(),
    };
    info!(
        "Review applied: {} rows in, {} kept after dedupe, {} final ({} without usable phone)",
        summary.review_rows,
        summary.kept_after_dedupe,
        summary.final_rows,
        summary.dropped_no_usable_phone
    );

    ApplyReviewOutcome {
        final_records,
        dropped,
        summary,
    }
}
