use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("configuration table `{0}` has no entries")]
    EmptyTable(&'static str),
    #[error("configuration table `{table}` declares label `{label}` more than once")]
    DuplicateLabel { table: &'static str, label: String },
    #[error("configuration table `{table}` has an empty keyword under `{label}`")]
    EmptyKeyword { table: &'static str, label: String },
}
