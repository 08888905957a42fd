use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::error::SkipReason;

pub const UNKNOWN_ID: &str = "unknown id";

/// A JSON string or number. Department codes and notice ids show up as both.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{s}"),
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Fields that hold either one value or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(x) => vec![x],
        }
    }
}

/// One tender notice as found in the input file. Nothing here is trusted yet:
/// presence of required fields is checked by the normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub idweb: Option<Scalar>,
    pub date_debut: Option<String>,
    pub date_fin: Option<String>,
    pub objet: Option<String>,
    pub nomacheteur: Option<String>,
    pub titulaire: Option<OneOrMany<Scalar>>,
    pub code_departement: Option<OneOrMany<Scalar>>,
    #[serde(rename = "LOTS")]
    pub lots: Option<Vec<String>>,
    pub url_avis: Option<String>,
}

impl RawRecord {
    /// Decode one element of the input array.
    pub fn from_json(value: &Value) -> Result<Self, SkipReason> {
        RawRecord::deserialize(value).map_err(|e| SkipReason::Malformed(e.to_string()))
    }

    pub fn record_id(&self) -> String {
        self.idweb
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| UNKNOWN_ID.to_string())
    }
}

/// Best-effort id lookup on an element that failed to decode.
pub fn peek_id(value: &Value) -> String {
    match value.get("idweb") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_ID.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Status {
    Active,
    Finished,
}

impl Status {
    /// A tender is finished once its end date is strictly behind today.
    pub fn from_days_left(days_left: i64) -> Self {
        if days_left < 0 {
            Status::Finished
        } else {
            Status::Active
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Finished => "Finished",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "finished" => Ok(Status::Finished),
            other => Err(format!("unknown status '{other}' (expected active or finished)")),
        }
    }
}

/// Lot categories. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Viande,
    Volaille,
    Charcuterie,
    ProduitsLaitiers,
    FruitsEtLegumes,
    Surgeles,
    Bio,
    Epicerie,
    Poisson,
    Boissons,
    Desserts,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Viande,
        Category::Volaille,
        Category::Charcuterie,
        Category::ProduitsLaitiers,
        Category::FruitsEtLegumes,
        Category::Surgeles,
        Category::Bio,
        Category::Epicerie,
        Category::Poisson,
        Category::Boissons,
        Category::Desserts,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Viande => "Viande",
            Category::Volaille => "Volaille",
            Category::Charcuterie => "Charcuterie",
            Category::ProduitsLaitiers => "Produits Laitiers",
            Category::FruitsEtLegumes => "Fruits et Légumes",
            Category::Surgeles => "Surgelés",
            Category::Bio => "BIO",
            Category::Epicerie => "Épicerie",
            Category::Poisson => "Poisson",
            Category::Boissons => "Boissons",
            Category::Desserts => "Desserts",
        }
    }

    /// ASCII form accepted on the command line, e.g. `fruits-et-legumes`.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Viande => "viande",
            Category::Volaille => "volaille",
            Category::Charcuterie => "charcuterie",
            Category::ProduitsLaitiers => "produits-laitiers",
            Category::FruitsEtLegumes => "fruits-et-legumes",
            Category::Surgeles => "surgeles",
            Category::Bio => "bio",
            Category::Epicerie => "epicerie",
            Category::Poisson => "poisson",
            Category::Boissons => "boissons",
            Category::Desserts => "desserts",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == wanted || c.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown category '{}'", s.trim()))
    }
}

/// A validated tender, ready for filtering and display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub id: Option<String>,
    pub title: String,
    pub start: NaiveDate,
    pub finish: NaiveDate,
    pub buyer: String,
    pub departments: Vec<String>,
    /// Awardees joined with `", "`, kept next to the list for display.
    pub awardee_label: String,
    pub awardees: Vec<String>,
    pub days_left: i64,
    pub status: Status,
    pub lots: Vec<String>,
    pub categories: BTreeSet<Category>,
    pub url: Option<String>,
}

impl NormalizedRecord {
    /// Individual awardee names, split on commas and trimmed.
    pub fn awardee_names(&self) -> impl Iterator<Item = &str> {
        self.awardees
            .iter()
            .flat_map(|a| a.split(','))
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    pub fn department_label(&self) -> String {
        self.departments.join(", ")
    }

    pub fn category_label(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub active_count: usize,
    pub finished_count: usize,
    pub expiring_within_90_count: usize,
}

#[derive(Debug, Clone, Tabled)]
pub struct TimelineRow {
    #[tabled(rename = "Tender")]
    pub title: String,
    #[tabled(rename = "Buyer")]
    pub buyer: String,
    #[tabled(rename = "Start")]
    pub start: String,
    #[tabled(rename = "Finish")]
    pub finish: String,
    #[tabled(rename = "DaysLeft")]
    pub days_left: i64,
    #[tabled(rename = "Timeline")]
    pub bar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Start")]
    pub start: String,
    #[serde(rename = "Finish")]
    pub finish: String,
    #[serde(rename = "DaysLeft")]
    pub days_left: i64,
    #[serde(rename = "Buyer")]
    pub buyer: String,
    #[serde(rename = "Awardees")]
    pub awardees: String,
    #[serde(rename = "Departments")]
    pub departments: String,
    #[serde(rename = "Categories")]
    pub categories: String,
    #[serde(rename = "Lots")]
    pub lots: String,
    #[serde(rename = "Url")]
    pub url: String,
}

impl From<&NormalizedRecord> for ExportRow {
    fn from(r: &NormalizedRecord) -> Self {
        ExportRow {
            id: r.id.clone().unwrap_or_default(),
            title: r.title.clone(),
            status: r.status.label().to_string(),
            start: r.start.format("%Y-%m-%d").to_string(),
            finish: r.finish.format("%Y-%m-%d").to_string(),
            days_left: r.days_left,
            buyer: r.buyer.clone(),
            awardees: r.awardee_label.clone(),
            departments: r.department_label(),
            categories: r.category_label(),
            lots: r.lots.join("; "),
            url: r.url.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_or_list_fields_decode_both_shapes() {
        let one = RawRecord::from_json(&json!({"titulaire": "Co A", "code_departement": 75})).unwrap();
        assert_eq!(
            one.titulaire.unwrap().into_vec(),
            vec![Scalar::Text("Co A".into())]
        );
        let dep = one.code_departement.unwrap().into_vec();
        assert_eq!(dep.len(), 1);
        assert_eq!(dep[0].to_string(), "75");

        let many = RawRecord::from_json(&json!({"titulaire": ["Co A", "Co B"]})).unwrap();
        assert_eq!(many.titulaire.unwrap().into_vec().len(), 2);
    }

    #[test]
    fn non_object_entry_is_malformed() {
        let err = RawRecord::from_json(&json!(42)).unwrap_err();
        assert!(matches!(err, SkipReason::Malformed(_)));
    }

    #[test]
    fn wrong_lot_type_is_malformed_and_id_can_be_peeked() {
        let value = json!({"idweb": "24-001", "LOTS": [1, 2]});
        assert!(RawRecord::from_json(&value).is_err());
        assert_eq!(peek_id(&value), "24-001");
        assert_eq!(peek_id(&json!({"objet": "x"})), UNKNOWN_ID);
    }

    #[test]
    fn category_parses_from_label_or_slug() {
        assert_eq!("fruits-et-legumes".parse::<Category>(), Ok(Category::FruitsEtLegumes));
        assert_eq!("Fruits et Légumes".parse::<Category>(), Ok(Category::FruitsEtLegumes));
        assert_eq!(" bio ".parse::<Category>(), Ok(Category::Bio));
        assert!("légumineuses".parse::<Category>().is_err());
    }

    #[test]
    fn categories_serialize_as_their_labels() {
        for c in Category::ALL {
            assert_eq!(serde_json::to_value(c).unwrap(), c.label());
        }
        let set = std::collections::BTreeSet::from([Category::Bio, Category::FruitsEtLegumes]);
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            "[\"Fruits et Légumes\",\"BIO\"]"
        );
    }

    #[test]
    fn status_follows_sign_of_days_left() {
        assert_eq!(Status::from_days_left(-1), Status::Finished);
        assert_eq!(Status::from_days_left(0), Status::Active);
        assert_eq!("FINISHED".parse::<Status>(), Ok(Status::Finished));
    }
}
