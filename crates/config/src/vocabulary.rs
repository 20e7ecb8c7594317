//! Reference vocabularies for commodities and districts
//!
//! Two case-insensitive name→code tables loaded once at startup from CSV
//! sources. A missing or unreadable source leaves its table empty and every
//! lookup reports "unknown", so the agent stays usable for non-price
//! intents.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::settings::VocabularySettings;

/// A loaded name→code table with precompiled word-boundary matchers.
#[derive(Debug, Default)]
struct NameTable {
    /// Canonical lower-cased names, with a whole-word matcher each.
    entries: Vec<(String, Regex)>,
    codes: HashMap<String, String>,
}

impl NameTable {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut entries = Vec::with_capacity(pairs.len());
        let mut codes = HashMap::with_capacity(pairs.len());
        for (name, code) in pairs {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let pattern = format!(r"\b{}\b", regex::escape(&name));
            match Regex::new(&pattern) {
                Ok(re) => entries.push((name.clone(), re)),
                Err(err) => {
                    tracing::warn!(entry = %name, %err, "Skipping unmatchable vocabulary entry");
                    continue;
                }
            }
            codes.insert(name, code.trim().to_string());
        }
        Self { entries, codes }
    }

    fn load_csv(path: &str, name_col: &str, code_col: &str) -> Self {
        if !Path::new(path).exists() {
            tracing::warn!(%path, "Vocabulary source not found, table loads empty");
            return Self::default();
        }

        let mut reader = match csv::Reader::from_path(path) {
            Ok(reader) => reader,
            Err(err) => {
                tracing::warn!(%path, %err, "Failed to open vocabulary source, table loads empty");
                return Self::default();
            }
        };

        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(err) => {
                tracing::warn!(%path, %err, "Failed to read vocabulary headers, table loads empty");
                return Self::default();
            }
        };
        let name_idx = headers.iter().position(|h| h == name_col);
        let code_idx = headers.iter().position(|h| h == code_col);
        let (name_idx, code_idx) = match (name_idx, code_idx) {
            (Some(n), Some(c)) => (n, c),
            _ => {
                tracing::warn!(
                    %path,
                    expected = %format!("{name_col}/{code_col}"),
                    "Vocabulary source missing expected columns, table loads empty"
                );
                return Self::default();
            }
        };

        let mut pairs = Vec::new();
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    tracing::debug!(%path, %err, "Skipping malformed vocabulary row");
                    continue;
                }
            };
            if let (Some(name), Some(code)) = (record.get(name_idx), record.get(code_idx)) {
                pairs.push((name.to_string(), code.to_string()));
            }
        }

        tracing::info!(%path, entries = pairs.len(), "Loaded vocabulary table");
        Self::from_pairs(pairs)
    }

    fn contains(&self, name: &str) -> bool {
        self.codes.contains_key(&name.trim().to_lowercase())
    }

    fn code(&self, name: &str) -> Option<&str> {
        self.codes.get(&name.trim().to_lowercase()).map(|s| s.as_str())
    }

    /// Longest vocabulary entry appearing as a whole word in `text`.
    ///
    /// Longest-match-wins keeps short entries from shadowing multi-word
    /// names that contain them.
    fn match_in(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(&haystack))
            .max_by_key(|(name, _)| name.len())
            .map(|(name, _)| name.as_str())
    }
}

/// Process-wide reference vocabulary, immutable after load and safe for
/// concurrent read.
#[derive(Debug, Default)]
pub struct Vocabulary {
    commodities: NameTable,
    districts: NameTable,
}

impl Vocabulary {
    /// Load both tables from the configured CSV sources.
    pub fn load(settings: &VocabularySettings) -> Self {
        Self {
            commodities: NameTable::load_csv(&settings.commodity_file, "Name", "Code"),
            districts: NameTable::load_csv(
                &settings.district_file,
                "District Name",
                "District Code",
            ),
        }
    }

    /// Build directly from (name, code) pairs; used by tests and embedders.
    pub fn from_parts(
        commodities: Vec<(String, String)>,
        districts: Vec<(String, String)>,
    ) -> Self {
        Self {
            commodities: NameTable::from_pairs(commodities),
            districts: NameTable::from_pairs(districts),
        }
    }

    pub fn resolve_commodity_code(&self, name: &str) -> Option<&str> {
        self.commodities.code(name)
    }

    pub fn resolve_area_code(&self, name: &str) -> Option<&str> {
        self.districts.code(name)
    }

    pub fn is_known_commodity(&self, name: &str) -> bool {
        self.commodities.contains(name)
    }

    pub fn is_known_area(&self, name: &str) -> bool {
        self.districts.contains(name)
    }

    /// Longest commodity entry found in free text, if any.
    pub fn match_commodity_in(&self, text: &str) -> Option<&str> {
        self.commodities.match_in(text)
    }

    /// Longest district entry found in free text, if any.
    pub fn match_area_in(&self, text: &str) -> Option<&str> {
        self.districts.match_in(text)
    }

    pub fn is_empty(&self) -> bool {
        self.commodities.codes.is_empty() && self.districts.codes.is_empty()
    }
}

/// External commodity code → display name as the listing site spells it.
static COMMODITY_DISPLAY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("23", "Wheat"),
        ("1", "Rice"),
        ("25", "Maize"),
        ("46", "Potato"),
        ("47", "Onion"),
        ("48", "Tomato"),
        ("29", "Gram"),
        ("30", "Arhar"),
    ])
});

/// External district code → city name used for market filtering.
static DISTRICT_CITY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("7", "agra"),
        ("33", "lucknow"),
        ("26", "kanpur"),
        ("38", "meerut"),
        ("18", "ghaziabad"),
        ("3", "aligarh"),
        ("40", "moradabad"),
        ("58", "saharanpur"),
        ("19", "gorakhpur"),
        ("9", "bareilly"),
        ("37", "mathura"),
        ("24", "jhansi"),
        ("1", "allahabad"),
        ("68", "varanasi"),
        ("16", "firozabad"),
        ("15", "faizabad"),
    ])
});

/// Display name for a supported commodity code.
pub fn commodity_display_name(code: &str) -> Option<&'static str> {
    COMMODITY_DISPLAY.get(code).copied()
}

/// City name for a supported district code.
pub fn district_city_name(code: &str) -> Option<&'static str> {
    DISTRICT_CITY.get(code).copied()
}

/// Keyword variants used to match a city's markets in the market selector.
///
/// Cities have historical aliases and named sub-markets; the selector lists
/// markets under those names rather than the district name.
pub fn city_keywords(city: &str) -> Vec<String> {
    static CITY_KEYWORDS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
        HashMap::from([
            ("agra", vec!["agra", "fatehpur sikri", "mathura"]),
            (
                "lucknow",
                vec!["lucknow", "banthara", "malihabad", "mohanlalganj"],
            ),
            ("kanpur", vec!["kanpur", "kakadeo", "bilhaur", "ghatampur"]),
            ("meerut", vec!["meerut", "mawana", "sardhana", "hastinapur"]),
            ("varanasi", vec!["varanasi", "benares", "kashi"]),
            ("allahabad", vec!["allahabad", "prayagraj"]),
        ])
    });

    let city = city.to_lowercase();
    match CITY_KEYWORDS.get(city.as_str()) {
        Some(variants) => variants.iter().map(|v| v.to_string()).collect(),
        None => vec![city],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn test_vocabulary() -> Vocabulary {
        Vocabulary::from_parts(
            vec![
                ("Wheat".to_string(), "23".to_string()),
                ("Rice".to_string(), "1".to_string()),
                ("Gram".to_string(), "29".to_string()),
            ],
            vec![
                ("Agra".to_string(), "7".to_string()),
                ("Lucknow".to_string(), "33".to_string()),
                ("Kanpur Nagar".to_string(), "26".to_string()),
            ],
        )
    }

    #[test]
    fn test_code_resolution_is_case_insensitive() {
        let vocab = test_vocabulary();
        assert_eq!(vocab.resolve_commodity_code("WHEAT"), Some("23"));
        assert_eq!(vocab.resolve_area_code("agra"), Some("7"));
        assert_eq!(vocab.resolve_commodity_code("saffron"), None);
    }

    #[test]
    fn test_longest_match_wins() {
        let vocab = Vocabulary::from_parts(
            vec![],
            vec![
                ("Up".to_string(), "0".to_string()),
                ("Uttar Pradesh".to_string(), "99".to_string()),
            ],
        );
        assert_eq!(
            vocab.match_area_in("prices up in uttar pradesh today"),
            Some("uttar pradesh")
        );
    }

    #[test]
    fn test_whole_word_matching() {
        let vocab = test_vocabulary();
        // "gram" must not match inside "kilograms"
        assert_eq!(vocab.match_commodity_in("five kilograms please"), None);
        assert_eq!(vocab.match_commodity_in("gram rate please"), Some("gram"));
    }

    #[test]
    fn test_missing_source_loads_empty() {
        let settings = VocabularySettings {
            commodity_file: "/nonexistent/commodities.csv".to_string(),
            district_file: "/nonexistent/districts.csv".to_string(),
        };
        let vocab = Vocabulary::load(&settings);
        assert!(vocab.is_empty());
        assert!(!vocab.is_known_commodity("wheat"));
        assert_eq!(vocab.resolve_area_code("agra"), None);
    }

    #[test]
    fn test_csv_loading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let commodity_path = dir.path().join("commodities.csv");
        let mut file = std::fs::File::create(&commodity_path).expect("create csv");
        writeln!(file, "Name,Code").unwrap();
        writeln!(file, "Wheat,23").unwrap();
        writeln!(file, "Onion,47").unwrap();

        let settings = VocabularySettings {
            commodity_file: commodity_path.to_string_lossy().into_owned(),
            district_file: "/nonexistent/districts.csv".to_string(),
        };
        let vocab = Vocabulary::load(&settings);
        assert!(vocab.is_known_commodity("onion"));
        assert_eq!(vocab.resolve_commodity_code("Wheat"), Some("23"));
        assert!(!vocab.is_known_area("agra"));
    }

    #[test]
    fn test_display_tables() {
        assert_eq!(commodity_display_name("23"), Some("Wheat"));
        assert_eq!(district_city_name("7"), Some("agra"));
        assert_eq!(commodity_display_name("999"), None);
    }

    #[test]
    fn test_city_keywords() {
        assert!(city_keywords("agra").iter().any(|k| k == "fatehpur sikri"));
        assert!(city_keywords("Lucknow").iter().any(|k| k == "banthara"));
        // Cities without alias sets match on their own name.
        assert_eq!(city_keywords("Jhansi"), vec!["jhansi".to_string()]);
    }
}
