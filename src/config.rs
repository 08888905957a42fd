use chrono::{Local, NaiveDate};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::filter::{Horizon, Selection};
use crate::types::{Category, Status};

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Timeline and statistics for public procurement notices.
#[derive(Debug, Clone, Parser)]
#[command(name = "tender-timeline", version, about)]
pub struct Cli {
    /// JSON array of tender notices
    #[arg(short, long, value_name = "FILE", default_value = "data.json", env = "TENDER_DATA")]
    pub data: PathBuf,

    /// Reference date for days left (defaults to the local date)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_day)]
    pub today: Option<NaiveDate>,

    #[arg(long = "buyer", value_name = "NAME")]
    pub buyers: Vec<String>,

    #[arg(long = "awardee", value_name = "NAME")]
    pub awardees: Vec<String>,

    #[arg(long = "department", value_name = "CODE")]
    pub departments: Vec<String>,

    /// Category label or slug, e.g. `fruits-et-legumes`
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<Category>,

    /// active or finished; only active tenders are shown when omitted
    #[arg(long = "status", value_name = "STATUS", conflicts_with = "all_statuses")]
    pub statuses: Vec<Status>,

    /// Show tenders of every status
    #[arg(long)]
    pub all_statuses: bool,

    /// all, 90d, 180d, 365d, 547d or 730d
    #[arg(long, default_value = "all")]
    pub horizon: Horizon,

    /// Number of tenders printed in the timeline and detail views
    #[arg(long, default_value_t = 50)]
    pub max_rows: usize,

    #[arg(long)]
    pub no_details: bool,

    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Menu-driven session instead of a single report
    #[arg(short, long)]
    pub interactive: bool,
}

impl Cli {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn selection(&self) -> Selection {
        let statuses = if self.all_statuses {
            Selection::unrestricted().statuses
        } else if self.statuses.is_empty() {
            Selection::default().statuses
        } else {
            self.statuses.iter().copied().collect()
        };
        Selection {
            buyers: self.buyers.iter().cloned().collect(),
            awardees: self.awardees.iter().cloned().collect(),
            departments: self.departments.iter().cloned().collect(),
            horizon: self.horizon,
            statuses,
            categories: self.categories.iter().copied().collect(),
        }
    }
}
