use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{
    DEFAULT_ANALYZER_TIMEOUT_MS, DEFAULT_CONFIG_PATH, DEFAULT_DATA_DIR,
    DEFAULT_MAX_RESPONSE_TIME_HOURS, DEFAULT_OUTPUT_DIR,
};
use crate::errors::ConfigError;
use crate::lexicon::{BoosterTable, KeywordGroup, KeywordTable, Lexicon};

const EMBEDDED_CONFIG: &str = include_str!("default_config.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub version: String,
    pub categories: Vec<KeywordGroup>,
    pub intents: Vec<KeywordGroup>,
    #[serde(default)]
    pub sentiment: SentimentSettings,
    #[serde(default)]
    pub settings: Settings,
    pub logging: Option<Logging>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SentimentSettings {
    /// Domain overrides layered over the general lexicon.
    #[serde(default)]
    pub lexicon: HashMap<String, f64>,
    #[serde(default)]
    pub boosters: HashMap<String, f64>,
    pub external_analyzer: Option<ExternalAnalyzer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalAnalyzer {
    pub url: String,
    pub timeout_ms: Option<u64>,
}

impl ExternalAnalyzer {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_ANALYZER_TIMEOUT_MS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_response_time_hours")]
    pub max_response_time_hours: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_max_response_time_hours() -> u64 {
    DEFAULT_MAX_RESPONSE_TIME_HOURS
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_response_time_hours: default_max_response_time_hours(),
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Logging {
    pub file: Option<PathBuf>,
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Embedded => write!(f, "<embedded defaults>"),
        }
    }
}

impl Configuration {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Configuration = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// The configuration compiled into the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_yaml(EMBEDDED_CONFIG)
    }

    /// An explicit path must exist; without one the default path is tried
    /// and the embedded configuration is used when it is absent.
    pub fn load(explicit_path: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        match explicit_path {
            Some(path) => Ok((Self::from_file(path)?, ConfigSource::File(path.to_path_buf()))),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Ok((
                        Self::from_file(default_path)?,
                        ConfigSource::File(default_path.to_path_buf()),
                    ))
                } else {
                    Ok((Self::embedded()?, ConfigSource::Embedded))
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_table("categories", &self.categories)?;
        validate_table("intents", &self.intents)
    }

    pub fn category_table(&self) -> KeywordTable {
        KeywordTable::new(&self.categories)
    }

    pub fn intent_table(&self) -> KeywordTable {
        KeywordTable::new(&self.intents)
    }

    pub fn lexicon(&self) -> Lexicon {
        Lexicon::with_overrides(&self.sentiment.lexicon)
    }

    pub fn boosters(&self) -> BoosterTable {
        BoosterTable::with_overrides(&self.sentiment.boosters)
    }
}

fn validate_table(table: &'static str, groups: &[KeywordGroup]) -> Result<(), ConfigError> {
    if groups.is_empty() {
        return Err(ConfigError::EmptyTable(table));
    }

    let mut seen = HashSet::new();
    for group in groups {
        if !seen.insert(group.label.as_str()) {
            return Err(ConfigError::DuplicateLabel {
                table,
                label: group.label.clone(),
            });
        }
        // An empty keyword would be a substring of every text.
        if group.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::EmptyKeyword {
                table,
                label: group.label.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use std::io::Write;

    use super::{ConfigSource, Configuration};
    use crate::errors::ConfigError;

    #[test]
    fn test_embedded_configuration() {
        let config = Configuration::embedded().unwrap();
        assert_eq!(config.version, "v1");

        let categories: Vec<&str> = config.categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            categories,
            vec![
                "Wedding Venue",
                "Wedding Dress",
                "Photographer",
                "Engagement",
                "Henna Night",
                "Invitation",
                "Catering"
            ]
        );

        let intents: Vec<&str> = config.intents.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(
            intents,
            vec![
                "Venue Search",
                "Product Inquiry",
                "Information Request",
                "Appointment Booking",
                "Complaint",
                "Praise"
            ]
        );

        assert_eq!(config.sentiment.lexicon.get("harika"), Some(&4.0));
        assert_eq!(config.sentiment.lexicon.get("pahalı"), Some(&-2.5));
        assert!(config.sentiment.external_analyzer.is_none());
        assert_eq!(config.settings.max_response_time_hours, 24);
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_merged_lexicon_from_configuration() {
        let config = Configuration::embedded().unwrap();
        let lexicon = config.lexicon();
        assert_eq!(lexicon.weight("kötü"), Some(-3.0));
        assert_eq!(lexicon.weight("hayal kırıklığı"), Some(-3.0));
        assert_eq!(lexicon.weight("great"), Some(3.1));
        assert_eq!(lexicon.max_phrase_words(), 2);
        assert!(config.boosters().contains("çok"));
    }

    #[test]
    fn test_minimal_configuration_uses_defaults() {
        let yaml = r#"
version: v1
categories:
  - label: Venue
    keywords: [mekan]
intents:
  - label: Booking
    keywords: [randevu]
sentiment:
  external_analyzer:
    url: http://localhost:9000/sentiment
"#;
        let config = Configuration::from_yaml(yaml).unwrap();
        assert!(config.sentiment.lexicon.is_empty());
        assert_eq!(config.settings.output_dir.to_str(), Some("outputs"));
        assert_eq!(config.settings.data_dir.to_str(), Some("data"));

        let analyzer = config.sentiment.external_analyzer.unwrap();
        assert_eq!(analyzer.url, "http://localhost:9000/sentiment");
        assert_eq!(analyzer.timeout_ms(), 2_000);
    }

    #[test]
    fn test_empty_category_table_is_rejected() {
        let yaml = r#"
version: v1
categories: []
intents:
  - label: Booking
    keywords: [randevu]
"#;
        let err = Configuration::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTable("categories")));
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let yaml = r#"
version: v1
categories:
  - label: Venue
    keywords: [mekan]
intents:
  - label: Booking
    keywords: [randevu]
  - label: Booking
    keywords: [rezervasyon]
"#;
        let err = Configuration::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateLabel { table: "intents", .. }
        ));
    }

    #[test]
    fn test_blank_keyword_is_rejected() {
        let yaml = r#"
version: v1
categories:
  - label: Venue
    keywords: [mekan, "  "]
intents:
  - label: Booking
    keywords: [randevu]
"#;
        let err = Configuration::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyKeyword { .. }));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "version: v2\ncategories:\n  - label: Venue\n    keywords: [salon]\nintents:\n  - label: Booking\n    keywords: [randevu]\n"
        )
        .unwrap();

        let (config, source) = Configuration::load(Some(file.path())).unwrap();
        assert_eq!(config.version, "v2");
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = Configuration::load(Some(std::path::Path::new("/nonexistent/annotator.yaml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
