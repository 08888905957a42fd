use chrono::NaiveDate;

use crate::categorize::categorize_lots;
use crate::error::SkipReason;
use crate::types::{NormalizedRecord, RawRecord, Scalar, Status};
use crate::util::{days_until, parse_date_safe, truncate_title};

fn required<'a, T>(field: &'a Option<T>, name: &'static str) -> Result<&'a T, SkipReason> {
    field.as_ref().ok_or(SkipReason::MissingField(name))
}

fn required_date(value: &Option<String>, name: &'static str) -> Result<NaiveDate, SkipReason> {
    let raw = required(value, name)?;
    parse_date_safe(Some(raw)).ok_or_else(|| SkipReason::InvalidDate {
        field: name,
        value: raw.clone(),
    })
}

fn scalars_to_strings(values: Vec<Scalar>) -> Vec<String> {
    values.into_iter().map(|v| v.to_string()).collect()
}

/// Validate one raw tender and derive its status, days left and categories
/// relative to `today`.
pub fn normalize(raw: &RawRecord, today: NaiveDate) -> Result<NormalizedRecord, SkipReason> {
    let start = required_date(&raw.date_debut, "date_debut")?;
    let finish = required_date(&raw.date_fin, "date_fin")?;
    let objet = required(&raw.objet, "objet")?;
    let buyer = required(&raw.nomacheteur, "nomacheteur")?.clone();
    let awardees = scalars_to_strings(required(&raw.titulaire, "titulaire")?.clone().into_vec());
    let departments =
        scalars_to_strings(required(&raw.code_departement, "code_departement")?.clone().into_vec());

    let days_left = days_until(today, finish);
    let status = Status::from_days_left(days_left);
    let lots = raw.lots.clone().unwrap_or_default();
    let categories = categorize_lots(&lots);

    Ok(NormalizedRecord {
        id: raw.idweb.as_ref().map(|id| id.to_string()),
        title: format!("[{}] {}", status.label(), truncate_title(objet)),
        start,
        finish,
        buyer,
        departments,
        awardee_label: awardees.join(", "),
        awardees,
        days_left,
        status,
        lots,
        categories,
        url: raw.url_avis.clone().filter(|u| !u.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use serde_json::{json, Value};
    use std::collections::BTreeSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_json(&value).unwrap()
    }

    fn base(date_fin: &str) -> Value {
        json!({
            "idweb": "24-100",
            "date_debut": "2024-01-01",
            "date_fin": date_fin,
            "objet": "Fourniture de denrées",
            "nomacheteur": "Ville X",
            "titulaire": "Co A",
            "code_departement": "75",
        })
    }

    #[test]
    fn poulet_bio_example_is_finished_with_both_categories() {
        let rec = normalize(
            &raw(json!({
                "date_debut": "2024-01-01",
                "date_fin": "2024-01-10",
                "objet": "Fourniture de poulet bio",
                "nomacheteur": "Ville X",
                "titulaire": "Co A",
                "code_departement": "75",
                "LOTS": ["Poulet bio fermier"],
            })),
            d(2024, 6, 1),
        )
        .unwrap();
        assert_eq!(rec.status, Status::Finished);
        assert!(rec.days_left < 0);
        assert_eq!(rec.categories, BTreeSet::from([Category::Volaille, Category::Bio]));
        assert!(rec.title.starts_with("[Finished] "));
        assert_eq!(rec.title, "[Finished] Fourniture de poulet bio");
        assert_eq!(rec.awardees, vec!["Co A"]);
        assert_eq!(rec.departments, vec!["75"]);
        assert_eq!(rec.id, None);
    }

    #[test]
    fn one_day_either_side_of_today() {
        let today = d(2024, 6, 1);
        let past = normalize(&raw(base("2024-05-31")), today).unwrap();
        assert_eq!((past.status, past.days_left), (Status::Finished, -1));

        let future = normalize(&raw(base("2024-06-02")), today).unwrap();
        assert_eq!((future.status, future.days_left), (Status::Active, 1));
        assert!(future.title.starts_with("[Active] "));

        let same_day = normalize(&raw(base("2024-06-01")), today).unwrap();
        assert_eq!((same_day.status, same_day.days_left), (Status::Active, 0));
    }

    #[test]
    fn time_of_day_on_finish_does_not_shift_days_left() {
        let rec = normalize(&raw(base("2024-06-02T23:59:00+02:00")), d(2024, 6, 1)).unwrap();
        assert_eq!(rec.days_left, 1);
    }

    #[test]
    fn lists_are_kept_and_joined() {
        let mut v = base("2025-01-01");
        v["titulaire"] = json!(["Co A", "Co B"]);
        v["code_departement"] = json!(["75", 92]);
        v["url_avis"] = json!("https://example.org/avis/24-100");
        let rec = normalize(&raw(v), d(2024, 6, 1)).unwrap();
        assert_eq!(rec.awardees, vec!["Co A", "Co B"]);
        assert_eq!(rec.awardee_label, "Co A, Co B");
        assert_eq!(rec.departments, vec!["75", "92"]);
        assert_eq!(rec.url.as_deref(), Some("https://example.org/avis/24-100"));
        assert_eq!(rec.id.as_deref(), Some("24-100"));
        assert!(rec.lots.is_empty());
        assert!(rec.categories.is_empty());
    }

    #[test]
    fn long_object_is_truncated_with_marker() {
        let mut v = base("2025-01-01");
        v["objet"] = json!("x".repeat(120));
        let rec = normalize(&raw(v), d(2024, 6, 1)).unwrap();
        assert_eq!(rec.title, format!("[Active] {}...", "x".repeat(80)));
    }

    #[test]
    fn unparseable_or_missing_dates_are_rejected() {
        let mut v = base("2025-01-01");
        v["date_debut"] = json!("someday");
        assert_eq!(
            normalize(&raw(v), d(2024, 6, 1)),
            Err(SkipReason::InvalidDate {
                field: "date_debut",
                value: "someday".into()
            })
        );

        let mut v = base("2025-01-01");
        v.as_object_mut().unwrap().remove("date_fin");
        assert_eq!(
            normalize(&raw(v), d(2024, 6, 1)),
            Err(SkipReason::MissingField("date_fin"))
        );
    }

    #[test]
    fn each_required_field_is_checked() {
        for field in ["objet", "nomacheteur", "titulaire", "code_departement"] {
            let mut v = base("2025-01-01");
            v.as_object_mut().unwrap().remove(field);
            assert_eq!(
                normalize(&raw(v), d(2024, 6, 1)),
                Err(SkipReason::MissingField(field)),
                "{field}"
            );
        }
    }

    #[test]
    fn blank_url_is_treated_as_absent() {
        let mut v = base("2025-01-01");
        v["url_avis"] = json!("");
        assert_eq!(normalize(&raw(v), d(2024, 6, 1)).unwrap().url, None);
    }
}
