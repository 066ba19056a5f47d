use common::configuration::ExternalAnalyzer;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Verdict reported by a language-specific analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    Positive,
    Negative,
    Neutral,
}

impl FromStr for Overall {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Overall::Positive),
            "negative" => Ok(Overall::Negative),
            "neutral" => Ok(Overall::Neutral),
            _ => Err(AnalyzerError::UnknownVerdict(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("analyzer responded with status {0}")]
    Status(u16),
    #[error("analyzer returned unknown verdict `{0}`")]
    UnknownVerdict(String),
}

/// Optional best-effort analyzer consulted before the lexicon scorer.
/// A `Neutral` verdict means "no opinion" and defers to the scorer.
pub trait PolarityAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, text: &str) -> Result<Overall, AnalyzerError>;
}

/// Stand-in used when no analyzer is configured; always defers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalyzer;

impl PolarityAnalyzer for NullAnalyzer {
    fn name(&self) -> &str {
        "none"
    }

    fn analyze(&self, _text: &str) -> Result<Overall, AnalyzerError> {
        Ok(Overall::Neutral)
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    overall: String,
}

/// Analyzer served over HTTP: `POST {"text": ..}` answered with
/// `{"overall": "positive" | "negative" | "neutral"}`.
///
/// Uses the blocking client; call it from a blocking context only.
pub struct HttpPolarityAnalyzer {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpPolarityAnalyzer {
    pub fn new(config: &ExternalAnalyzer) -> Result<Self, AnalyzerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms()))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

impl PolarityAnalyzer for HttpPolarityAnalyzer {
    fn name(&self) -> &str {
        &self.url
    }

    fn analyze(&self, text: &str) -> Result<Overall, AnalyzerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&AnalyzeRequest { text })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Status(status.as_u16()));
        }

        let body: AnalyzeResponse = response.json()?;
        debug!(url = %self.url, overall = %body.overall, "external analyzer verdict");
        body.overall.parse()
    }
}
