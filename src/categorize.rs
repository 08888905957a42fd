// Keyword taxonomy for lot names.
use crate::types::Category;
use std::collections::BTreeSet;

/// Category → keywords. A lot belongs to every category with a keyword
/// contained in its lower-cased name.
pub static TAXONOMY: &[(Category, &[&str])] = &[
    (Category::Viande, &["viande", "bœuf", "veau", "porc", "agneau", "mouton"]),
    (Category::Volaille, &["volaille", "poulet", "dinde"]),
    (Category::Charcuterie, &["charcuterie"]),
    (Category::ProduitsLaitiers, &["lait", "produits laitiers", "ovoproduits"]),
    (Category::FruitsEtLegumes, &["fruits", "légumes", "aromates"]),
    (Category::Surgeles, &["surgelé"]),
    (Category::Bio, &["bio"]),
    (
        Category::Epicerie,
        &["épicerie", "féculents", "pâtes", "riz", "condiments", "épices"],
    ),
    (Category::Poisson, &["poisson"]),
    (Category::Boissons, &["boisson"]),
    (Category::Desserts, &["dessert", "pâtisserie", "compote"]),
];

pub fn categorize(lot_name: &str) -> BTreeSet<Category> {
    let name = lot_name.to_lowercase();
    TAXONOMY
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
        .map(|(category, _)| *category)
        .collect()
}

/// Union of the categories of every lot.
pub fn categorize_lots<S: AsRef<str>>(lots: &[S]) -> BTreeSet<Category> {
    lots.iter().flat_map(|lot| categorize(lot.as_ref())).collect()
}
