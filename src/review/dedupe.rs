use std::collections::HashMap;

use log::debug;

use crate::models::records::{Record, RecordSet};
use crate::normalize::identity::dedupe_key;
use crate::selection::engine::resolve_numbers;
use crate::selection::metadata::build_metadata;

/// Tokens a human can put into `review_keep` / `review_drop` cells. Closed
/// set, case-insensitive; anything else (including blank) is falsy.
pub const TRUTHY_TOKENS: [&str; 7] = ["1", "true", "yes", "y", "x", "keep", "k"];

pub fn truthy_cell(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    TRUTHY_TOKENS.contains(&v.as_str())
}

/// Duplicate-candidate score. Phone reachability dominates; pitch text is a
/// pure tie-breaker and never filters a row.
pub fn score_record(record: &Record) -> i64 {
    let metadata = build_metadata(record);
    let resolution = resolve_numbers(record, &metadata);
    let mut score = 0;
    if resolution.first_call.is_some() {
        score += 100;
    }
    if resolution.main_line.is_some() {
        score += 50;
    }
    if !record.is_blank("sales_pitch") {
        score += 10;
    }
    score
}

/// Dedupe-group membership in first-encounter order, keyed by the records'
/// identity keys.
fn group_indices(keys: &[String]) -> HashMap<String, Vec<usize>> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, key) in keys.iter().enumerate() {
        groups.entry(key.clone()).or_default().push(index);
    }
    groups
}

/// Recompute `dedupe_key`, `dedupe_group_size`, `review_needed`,
/// `_dedupe_score` and `recommended_keep` for every record. Always derives
/// from the current cell values; stale derived columns from a previous run
/// are overwritten wholesale, which is what makes re-running idempotent.
pub fn annotate_groups(records: &mut RecordSet) {
    for column in [
        "dedupe_key",
        "dedupe_group_size",
        "review_needed",
        "_dedupe_score",
        "recommended_keep",
    ] {
        records.ensure_column(column);
    }

    let keys: Vec<String> = records.records.iter().map(dedupe_key).collect();
    let scores: Vec<i64> = records.records.iter().map(score_record).collect();
    let groups = group_indices(&keys);
    debug!(
        "Annotated {} records into {} dedupe groups",
        records.len(),
        groups.len()
    );

    let mut recommended = vec![false; records.len()];
    for indices in groups.values() {
        // Highest score wins; strictly-greater keeps the first occurrence on
        // ties.
        let mut best = indices[0];
        for &index in &indices[1..] {
            if scores[index] > scores[best] {
                best = index;
            }
        }
        recommended[best] = true;
    }

    for (index, record) in records.records.iter_mut().enumerate() {
        let group_size = groups.get(&keys[index]).map_or(1, Vec::len);
        record.set("dedupe_key", keys[index].clone());
        record.set("dedupe_group_size", group_size.to_string());
        record.set("review_needed", (group_size > 1).to_string());
        record.set("_dedupe_score", scores[index].to_string());
        record.set("recommended_keep", recommended[index].to_string());
    }
}

/// Resolve the final keep mask from the review columns, per dedupe group:
/// any truthy `review_keep` in a group overrides the recommendation and
/// keeps exactly the manually marked rows; otherwise the `recommended_keep`
/// row survives. A truthy `review_drop` always forces its row out, even when
/// the same row was selected by either path.
pub fn resolve_keep_mask(records: &RecordSet) -> Vec<bool> {
    let keys: Vec<String> = records
        .records
        .iter()
        .map(|r| r.get("dedupe_key").to_string())
        .collect();
    let groups = group_indices(&keys);

    let mut keep = vec![false; records.len()];
    for indices in groups.values() {
        let any_manual_keep = indices
            .iter()
            .any(|&i| truthy_cell(records.records[i].get("review_keep")));
        for &i in indices {
            let record = &records.records[i];
            keep[i] = if any_manual_keep {
                truthy_cell(record.get("review_keep"))
            } else {
                truthy_cell(record.get("recommended_keep"))
            };
            if truthy_cell(record.get("review_drop")) {
                keep[i] = false;
            }
        }
    }
    keep
}
