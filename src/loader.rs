use crate::error::{DatasetError, LoadError, SkipReason};
use crate::normalize::normalize;
use crate::types::{peek_id, NormalizedRecord, RawRecord};
use chrono::NaiveDate;
use log::{debug, info};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub total_entries: usize,
    pub valid_records: usize,
    pub skipped: usize,
}

/// The normalized table plus one warning per entry that was left out.
/// Built once per load and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<NormalizedRecord>,
    pub warnings: Vec<String>,
    pub today: NaiveDate,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn report(&self) -> LoadReport {
        LoadReport {
            total_entries: self.records.len() + self.warnings.len(),
            valid_records: self.records.len(),
            skipped: self.warnings.len(),
        }
    }

    /// An empty table is its own terminal condition, distinct from a
    /// selection that happens to match nothing.
    pub fn ensure_usable(self) -> Result<Self, DatasetError> {
        if self.is_empty() {
            Err(DatasetError::NoValidData)
        } else {
            Ok(self)
        }
    }
}

fn skip_warning(id: &str, reason: &SkipReason) -> String {
    format!("Error with entry: {id} - {reason}")
}

/// Read the input file as a JSON array without decoding its elements.
pub fn load_json_array(path: &Path) -> Result<Vec<Value>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: Value = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match root {
        Value::Array(items) => Ok(items),
        _ => Err(LoadError::NotAnArray(path.to_path_buf())),
    }
}

struct Builder {
    today: NaiveDate,
    records: Vec<NormalizedRecord>,
    warnings: Vec<String>,
}

impl Builder {
    fn new(today: NaiveDate, capacity: usize) -> Self {
        Builder {
            today,
            records: Vec::with_capacity(capacity),
            warnings: Vec::new(),
        }
    }

    fn skip(&mut self, id: &str, reason: &SkipReason) {
        debug!("skipping entry {id}: {reason}");
        self.warnings.push(skip_warning(id, reason));
    }

    fn push(&mut self, raw: &RawRecord) {
        match normalize(raw, self.today) {
            Ok(rec) => self.records.push(rec),
            Err(reason) => self.skip(&raw.record_id(), &reason),
        }
    }

    fn finish(self) -> Dataset {
        let dataset = Dataset {
            records: self.records,
            warnings: self.warnings,
            today: self.today,
        };
        let report = dataset.report();
        info!(
            "Built table: {} of {} entries usable, {} skipped (today = {})",
            report.valid_records, report.total_entries, report.skipped, dataset.today
        );
        dataset
    }
}

/// Normalize every raw record in input order. Failures become warnings and
/// never stop the batch.
pub fn build(raws: &[RawRecord], today: NaiveDate) -> Dataset {
    let mut builder = Builder::new(today, raws.len());
    for raw in raws {
        builder.push(raw);
    }
    builder.finish()
}

/// Decode and normalize straight from JSON values, so entries that fail to
/// decode are reported in the same order as the rest.
pub fn build_from_json(values: &[Value], today: NaiveDate) -> Dataset {
    let mut builder = Builder::new(today, values.len());
    for value in values {
        match RawRecord::from_json(value) {
            Ok(raw) => builder.push(&raw),
            Err(reason) => builder.skip(&peek_id(value), &reason),
        }
    }
    builder.finish()
}

/// Read `path` and build the table relative to `today`.
pub fn load_dataset(path: &Path, today: NaiveDate) -> Result<Dataset, LoadError> {
    let values = load_json_array(path)?;
    info!("Read {} entries from {}", values.len(), path.display());
    Ok(build_from_json(&values, today))
}
