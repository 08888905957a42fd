use anyhow::{Context, Result};

use crate::categorize::categorize;
use crate::filter::{filter, Selection};
use crate::loader::Dataset;
use crate::types::{ExportRow, NormalizedRecord, Status, SummaryStats, TimelineRow};
use crate::util::format_int;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table};

/// Days shown before and after today on the timeline.
const WINDOW_BEFORE: i64 = 30;
const WINDOW_AFTER: i64 = 365;
const BAR_WIDTH: usize = 40;

pub const NO_VALID_DATA: &str = "No valid data found.";
pub const NO_MATCHES: &str = "No records match the current filters.";

/// What the result screen shows for a table and a selection.
#[derive(Debug, PartialEq)]
pub enum View<'a> {
    /// The table itself is empty, whatever the selection.
    NoValidData,
    NoMatches,
    Records(Vec<&'a NormalizedRecord>),
}

impl View<'_> {
    /// The message printed instead of results, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            View::NoValidData => Some(NO_VALID_DATA),
            View::NoMatches => Some(NO_MATCHES),
            View::Records(_) => None,
        }
    }
}

pub fn view<'a>(data: &'a Dataset, selection: &Selection) -> View<'a> {
    if data.is_empty() {
        return View::NoValidData;
    }
    let subset = filter(&data.records, selection);
    if subset.is_empty() {
        View::NoMatches
    } else {
        View::Records(subset)
    }
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for r in rows {
        wtr.serialize(r)
            .with_context(|| format!("writing row to {}", path.display()))?;
    }
    wtr.flush().with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value).context("serializing JSON report")?;
    std::fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn export_rows(subset: &[&NormalizedRecord]) -> Vec<ExportRow> {
    subset.iter().map(|r| ExportRow::from(*r)).collect()
}

fn column(today: NaiveDate, date: NaiveDate) -> usize {
    let span = (WINDOW_BEFORE + WINDOW_AFTER) as f64;
    let offset = (date - (today - Duration::days(WINDOW_BEFORE))).num_days();
    let clamped = offset.clamp(0, WINDOW_BEFORE + WINDOW_AFTER) as f64;
    ((clamped / span) * (BAR_WIDTH - 1) as f64).round() as usize
}

/// Text bar for one tender on the `[today - 30d, today + 365d]` window.
/// `#` marks an active tender, `=` a finished one and `|` is today.
pub fn timeline_bar(today: NaiveDate, start: NaiveDate, finish: NaiveDate, status: Status) -> String {
    let window_start = today - Duration::days(WINDOW_BEFORE);
    let window_end = today + Duration::days(WINDOW_AFTER);
    let fill = match status {
        Status::Active => '#',
        Status::Finished => '=',
    };
    let mut cells = vec![' '; BAR_WIDTH];
    if finish >= window_start && start <= window_end {
        let (from, to) = (column(today, start), column(today, finish));
        for cell in &mut cells[from..=to.max(from)] {
            *cell = fill;
        }
    }
    cells[column(today, today)] = '|';
    cells.into_iter().collect()
}

pub fn timeline_rows(today: NaiveDate, subset: &[&NormalizedRecord]) -> Vec<TimelineRow> {
    subset
        .iter()
        .map(|r| TimelineRow {
            title: r.title.clone(),
            buyer: r.buyer.clone(),
            start: r.start.format("%Y-%m-%d").to_string(),
            finish: r.finish.format("%Y-%m-%d").to_string(),
            days_left: r.days_left,
            bar: timeline_bar(today, r.start, r.finish, r.status),
        })
        .collect()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: tabled::Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("({} more not shown)\n", format_int(rows.len() - max_rows));
    }
}

pub fn print_statistics(stats: &SummaryStats) {
    println!("Statistics");
    println!("  Total tenders:          {}", format_int(stats.total));
    println!("  Active:                 {}", format_int(stats.active_count));
    println!("  Ending within 3 months: {}", format_int(stats.expiring_within_90_count));
    println!("  Finished:               {}", format_int(stats.finished_count));
    println!();
}

pub fn print_warnings(warnings: &[String]) {
    for w in warnings {
        println!("Warning: {}", w);
    }
    if !warnings.is_empty() {
        println!();
    }
}

/// Detail block for one tender: parties, dates, link and each lot with its
/// own categories.
pub fn render_details(r: &NormalizedRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("== {}\n", r.title));
    out.push_str(&format!("   Buyer:       {}\n", r.buyer));
    out.push_str(&format!("   Awardees:    {}\n", r.awardee_label));
    out.push_str(&format!("   Departments: {}\n", r.department_label()));
    if let Some(url) = &r.url {
        out.push_str(&format!("   Notice:      {}\n", url));
    }
    out.push_str(&format!("   Start:       {}\n", r.start.format("%Y-%m-%d")));
    out.push_str(&format!("   Finish:      {}\n", r.finish.format("%Y-%m-%d")));
    out.push_str(&format!("   Status:      {}\n", r.status));
    out.push_str("   Lots and categories:\n");
    for lot in &r.lots {
        out.push_str(&format!("   - {}\n", lot));
        let cats = categorize(lot);
        if !cats.is_empty() {
            let labels: Vec<&str> = cats.iter().map(|c| c.label()).collect();
            out.push_str(&format!("     Categories: {}\n", labels.join(", ")));
        }
    }
    out
}

pub fn print_details(subset: &[&NormalizedRecord], max_rows: usize) {
    println!("Tender details\n");
    for r in subset.iter().take(max_rows) {
        println!("{}", render_details(r));
    }
}
