use crate::brand::{Classifier, UNKNOWN_LABEL};
use std::collections::BTreeSet;

/// Ordered substring table from source fragments to brand labels
///
/// Entries are tried in order and the first fragment contained in the
/// (lowercased, trimmed) source string wins, so more specific fragments must
/// precede generic ones such as "android".
#[derive(Debug, Clone)]
pub struct BrandTable {
    entries: Vec<(String, String)>,
    known: BTreeSet<String>,
}

const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    ("iphone", "Apple"),
    ("苹果", "Apple"),
    ("iqoo", "iQOO"),
    ("neo5", "iQOO"),
    ("redmi", "Redmi"),
    ("红米", "Redmi"),
    ("xiaomi", "Xiaomi"),
    ("小米", "Xiaomi"),
    ("honor", "Honor"),
    ("荣耀", "Honor"),
    ("huawei", "Huawei"),
    ("华为", "Huawei"),
    ("nova", "Huawei"),
    ("harmonyos", "Huawei"),
    ("oneplus", "OnePlus"),
    ("一加", "OnePlus"),
    ("realme", "Realme"),
    ("真我", "Realme"),
    ("oppo", "OPPO"),
    ("vivo", "Vivo"),
    ("samsung", "Samsung"),
    ("三星", "Samsung"),
    ("meizu", "Meizu"),
    ("魅族", "Meizu"),
    ("nubia", "Nubia"),
    ("努比亚", "Nubia"),
    ("zte", "ZTE"),
    ("中兴", "ZTE"),
    ("android", "Android"),
];

const DEFAULT_KNOWN: &[&str] = &[
    "Apple", "Huawei", "Honor", "Xiaomi", "Redmi", "OPPO", "Vivo", "iQOO", "Samsung", "Meizu",
    "Realme", "OnePlus", "ZTE", "Nubia",
];

impl BrandTable {
    /// Builds a table from `(fragment, label)` pairs and the set of known labels
    pub fn new<I, K>(entries: I, known: K) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
        K: IntoIterator<Item = String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(fragment, label)| (fragment.trim().to_lowercase(), label))
                .filter(|(fragment, _)| !fragment.is_empty())
                .collect(),
            known: known.into_iter().collect(),
        }
    }

    /// The set of labels considered recognized manufacturers
    pub fn known_brands(&self) -> &BTreeSet<String> {
        &self.known
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BrandTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_ENTRIES
                .iter()
                .map(|(fragment, label)| (fragment.to_string(), label.to_string())),
            DEFAULT_KNOWN.iter().map(|label| label.to_string()),
        )
    }
}

impl Classifier for BrandTable {
    fn classify(&self, raw_source: &str) -> String {
        let source = raw_source.trim().to_lowercase();
        if source.is_empty() {
            return UNKNOWN_LABEL.to_string();
        }

        self.entries
            .iter()
            .find(|(fragment, _)| source.contains(fragment.as_str()))
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    fn is_known(&self, label: &str) -> bool {
        self.known.contains(label)
    }
}
