/// Label returned by both classifiers when a message carries no text.
pub const AMBIGUOUS_LABEL: &str = "Ambiguous";
/// Catch-all category when no keyword group matches.
pub const OTHER_CATEGORY_LABEL: &str = "Other";
/// Catch-all intent when no keyword group matches.
pub const GENERAL_QUERY_LABEL: &str = "General Query";

pub const CONFIG_PATH_ENV: &str = "ANNOTATOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "./annotator_config.yaml";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_MAX_RESPONSE_TIME_HOURS: u64 = 24;
pub const DEFAULT_ANALYZER_TIMEOUT_MS: u64 = 2_000;
