use crate::types::{NormalizedRecord, Status, SummaryStats};
use serde::Serialize;

/// Days-left window counted as "ending soon" in the statistics. Unlike the
/// horizon filter this one excludes tenders that are already over.
pub const EXPIRING_SOON_DAYS: i64 = 90;

pub fn summarize(subset: &[&NormalizedRecord]) -> SummaryStats {
    let mut stats = SummaryStats {
        total: subset.len(),
        ..SummaryStats::default()
    };
    for r in subset {
        match r.status {
            Status::Active => stats.active_count += 1,
            Status::Finished => stats.finished_count += 1,
        }
        if (0..=EXPIRING_SOON_DAYS).contains(&r.days_left) {
            stats.expiring_within_90_count += 1;
        }
    }
    stats
}

/// Everything written by the JSON export.
#[derive(Debug, Serialize)]
pub struct FilteredReport<'a> {
    pub today: String,
    pub summary: SummaryStats,
    pub warnings: &'a [String],
    pub records: Vec<&'a NormalizedRecord>,
}

pub fn generate_report<'a>(
    today: chrono::NaiveDate,
    subset: Vec<&'a NormalizedRecord>,
    warnings: &'a [String],
) -> FilteredReport<'a> {
    FilteredReport {
        today: today.format("%Y-%m-%d").to_string(),
        summary: summarize(&subset),
        warnings,
        records: subset,
    }
}
