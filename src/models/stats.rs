use serde::Serialize;

/// Counts reported by the generate-review phase. The `*_no_dach` field keeps
/// the key older report consumers read; it carries the same count as the
/// no-usable-phone field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewSummary {
    pub input_rows: usize,
    pub dedupe_groups: usize,
    pub rows_with_review_needed: usize,
    pub suggested_rows_kept: usize,
    pub suggested_rows_dropped_no_usable_phone: usize,
    pub suggested_rows_dropped_no_dach: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplySummary {
    pub review_rows: usize,
    pub kept_after_dedupe: usize,
    pub dropped_no_usable_phone: usize,
    pub dropped_no_dach: usize,
    pub final_rows: usize,
}
