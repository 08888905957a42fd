use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::types::{Category, NormalizedRecord, Status};

/// Upper bound on days left. There is no lower bound: long-finished tenders
/// pass every horizon unless the status filter removes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Horizon {
    #[default]
    All,
    Days90,
    Days180,
    Days365,
    Days547,
    Days730,
}

impl Horizon {
    pub const ALL: [Horizon; 6] = [
        Horizon::All,
        Horizon::Days90,
        Horizon::Days180,
        Horizon::Days365,
        Horizon::Days547,
        Horizon::Days730,
    ];

    pub fn threshold(self) -> Option<i64> {
        match self {
            Horizon::All => None,
            Horizon::Days90 => Some(90),
            Horizon::Days180 => Some(180),
            Horizon::Days365 => Some(365),
            Horizon::Days547 => Some(547),
            Horizon::Days730 => Some(730),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Horizon::All => "all tenders",
            Horizon::Days90 => "ends within 3 months",
            Horizon::Days180 => "ends within 6 months",
            Horizon::Days365 => "ends within 1 year",
            Horizon::Days547 => "ends within 18 months",
            Horizon::Days730 => "ends within 2 years",
        }
    }

    pub fn matches(self, days_left: i64) -> bool {
        self.threshold().map_or(true, |max| days_left <= max)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold() {
            Some(days) => write!(f, "{days}d"),
            None => f.write_str("all"),
        }
    }
}

impl FromStr for Horizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Horizon::ALL
            .into_iter()
            .find(|h| h.to_string() == wanted)
            .ok_or_else(|| {
                format!("unknown horizon '{wanted}' (expected all, 90d, 180d, 365d, 547d or 730d)")
            })
    }
}

/// Active filter values. An empty set means "no restriction" for that
/// dimension; dimensions combine with AND, values within one with OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub buyers: BTreeSet<String>,
    pub awardees: BTreeSet<String>,
    pub departments: BTreeSet<String>,
    pub horizon: Horizon,
    pub statuses: BTreeSet<Status>,
    pub categories: BTreeSet<Category>,
}

impl Default for Selection {
    /// The initial state shows active tenders only.
    fn default() -> Self {
        Selection {
            buyers: BTreeSet::new(),
            awardees: BTreeSet::new(),
            departments: BTreeSet::new(),
            horizon: Horizon::All,
            statuses: BTreeSet::from([Status::Active]),
            categories: BTreeSet::new(),
        }
    }
}

fn any_in<'a, T, I>(selected: &BTreeSet<T>, mut values: I) -> bool
where
    T: Ord + 'a,
    I: Iterator<Item = &'a T>,
{
    selected.is_empty() || values.any(|v| selected.contains(v))
}

impl Selection {
    /// No restriction at all, not even on status.
    pub fn unrestricted() -> Self {
        Selection {
            statuses: BTreeSet::new(),
            ..Selection::default()
        }
    }

    pub fn matches(&self, r: &NormalizedRecord) -> bool {
        (self.buyers.is_empty() || self.buyers.contains(&r.buyer))
            && (self.awardees.is_empty() || r.awardee_names().any(|a| self.awardees.contains(a)))
            && any_in(&self.departments, r.departments.iter())
            && self.horizon.matches(r.days_left)
            && (self.statuses.is_empty() || self.statuses.contains(&r.status))
            && any_in(&self.categories, r.categories.iter())
    }
}

/// Records passing every active dimension, in table order.
pub fn filter<'a>(table: &'a [NormalizedRecord], selection: &Selection) -> Vec<&'a NormalizedRecord> {
    table.iter().filter(|r| selection.matches(r)).collect()
}

/// Choices offered by each multi-select, taken from the loaded table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub buyers: BTreeSet<String>,
    pub awardees: BTreeSet<String>,
    pub departments: BTreeSet<String>,
    pub categories: BTreeSet<Category>,
}

impl FilterOptions {
    pub fn from_table(table: &[NormalizedRecord]) -> Self {
        let mut opts = FilterOptions::default();
        for r in table {
            opts.buyers.insert(r.buyer.clone());
            opts.awardees.extend(r.awardee_names().map(str::to_string));
            opts.departments.extend(r.departments.iter().cloned());
            opts.categories.extend(r.categories.iter().copied());
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(
        buyer: &str,
        awardees: &[&str],
        departments: &[&str],
        days_left: i64,
        categories: &[Category],
    ) -> NormalizedRecord {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let status = Status::from_days_left(days_left);
        NormalizedRecord {
            id: Some(format!("{buyer}-{days_left}")),
            title: format!("[{}] {buyer}", status.label()),
            start: today - chrono::Duration::days(100),
            finish: today + chrono::Duration::days(days_left),
            buyer: buyer.to_string(),
            departments: departments.iter().map(|s| s.to_string()).collect(),
            awardee_label: awardees.join(", "),
            awardees: awardees.iter().map(|s| s.to_string()).collect(),
            days_left,
            status,
            lots: Vec::new(),
            categories: categories.iter().copied().collect(),
            url: None,
        }
    }

    fn table() -> Vec<NormalizedRecord> {
        vec![
            rec("Ville X", &["Co A"], &["75"], 30, &[Category::Volaille, Category::Bio]),
            rec("Ville X", &["Co B", "Co C"], &["92", "93"], 200, &[Category::Poisson]),
            rec("Région Y", &["Co A, Co D"], &["69"], -10, &[]),
            rec("Région Y", &["Co E"], &["75"], -9999, &[Category::Bio]),
            rec("CHU Z", &["Co F"], &["13"], 600, &[Category::Desserts]),
        ]
    }

    fn days_left_of(rows: &[&NormalizedRecord]) -> Vec<i64> {
        rows.iter().map(|r| r.days_left).collect()
    }

    #[test]
    fn default_selection_keeps_exactly_the_active_records() {
        let t = table();
        let got = filter(&t, &Selection::default());
        assert_eq!(days_left_of(&got), vec![30, 200, 600]);
        assert!(got.iter().all(|r| r.status == Status::Active));
    }

    #[test]
    fn unrestricted_selection_keeps_everything_in_order() {
        let t = table();
        assert_eq!(days_left_of(&filter(&t, &Selection::unrestricted())), vec![30, 200, -10, -9999, 600]);
    }

    #[test]
    fn status_clause_excludes_finished_records_inside_horizon() {
        let t = table();
        let sel = Selection { horizon: Horizon::Days90, ..Selection::default() };
        assert_eq!(days_left_of(&filter(&t, &sel)), vec![30]);
    }

    #[test]
    fn horizon_has_no_lower_bound() {
        let t = table();
        let sel = Selection { horizon: Horizon::Days90, ..Selection::unrestricted() };
        assert_eq!(days_left_of(&filter(&t, &sel)), vec![30, -10, -9999]);

        let sel = Selection { horizon: Horizon::Days547, ..Selection::unrestricted() };
        assert_eq!(days_left_of(&filter(&t, &sel)), vec![30, 200, -10, -9999]);
        let sel = Selection { horizon: Horizon::Days730, ..Selection::unrestricted() };
        assert_eq!(filter(&t, &sel).len(), 5);
    }

    #[test]
    fn awardees_match_on_any_split_name() {
        let t = table();
        let sel = Selection {
            awardees: BTreeSet::from(["Co A".to_string()]),
            ..Selection::unrestricted()
        };
        assert_eq!(days_left_of(&filter(&t, &sel)), vec![30, -10]);

        let sel = Selection {
            awardees: BTreeSet::from(["Co D".to_string(), "Co C".to_string()]),
            ..Selection::unrestricted()
        };
        assert_eq!(days_left_of(&filter(&t, &sel)), vec![200, -10]);
    }

    #[test]
    fn dimensions_combine_with_and_values_with_or() {
        let t = table();
        let sel = Selection {
            buyers: BTreeSet::from(["Ville X".to_string(), "Région Y".to_string()]),
            departments: BTreeSet::from(["75".to_string(), "93".to_string()]),
            categories: BTreeSet::from([Category::Bio]),
            ..Selection::unrestricted()
        };
        assert_eq!(days_left_of(&filter(&t, &sel)), vec![30, -9999]);

        let sel = Selection {
            statuses: BTreeSet::from([Status::Finished]),
            buyers: BTreeSet::from(["Région Y".to_string()]),
            ..Selection::default()
        };
        assert_eq!(days_left_of(&filter(&t, &sel)), vec![-10, -9999]);
    }

    #[test]
    fn selection_matching_nothing_yields_empty_subset() {
        let t = table();
        let sel = Selection {
            buyers: BTreeSet::from(["Inconnu".to_string()]),
            ..Selection::default()
        };
        assert!(filter(&t, &sel).is_empty());
    }

    #[test]
    fn options_are_sorted_and_deduplicated() {
        let opts = FilterOptions::from_table(&table());
        assert_eq!(
            opts.buyers.into_iter().collect::<Vec<_>>(),
            vec!["CHU Z", "Région Y", "Ville X"]
        );
        assert_eq!(
            opts.awardees.into_iter().collect::<Vec<_>>(),
            vec!["Co A", "Co B", "Co C", "Co D", "Co E", "Co F"]
        );
        assert_eq!(opts.departments.len(), 5);
        assert_eq!(
            opts.categories,
            BTreeSet::from([Category::Volaille, Category::Bio, Category::Poisson, Category::Desserts])
        );
    }

    #[test]
    fn horizon_round_trips_through_text() {
        assert_eq!("90d".parse::<Horizon>(), Ok(Horizon::Days90));
        assert_eq!(" ALL ".parse::<Horizon>(), Ok(Horizon::All));
        assert!("3 mois".parse::<Horizon>().is_err());
        assert_eq!(Horizon::Days547.to_string(), "547d");
    }
}
