//! Sentiment engine: an optional language-specific analyzer in front of the
//! lexicon-based valence scorer, reduced to a three-way label.

pub mod analyzer;
pub mod valence;

use common::configuration::Configuration;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tracing::{info, warn};

pub use analyzer::{AnalyzerError, HttpPolarityAnalyzer, NullAnalyzer, Overall, PolarityAnalyzer};
pub use valence::ValenceScorer;

/// Compound scores at or above this are positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Compound scores at or below this are negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

impl Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Overall> for SentimentLabel {
    fn from(overall: Overall) -> Self {
        match overall {
            Overall::Positive => SentimentLabel::Positive,
            Overall::Negative => SentimentLabel::Negative,
            Overall::Neutral => SentimentLabel::Neutral,
        }
    }
}

pub struct SentimentEngine {
    scorer: ValenceScorer,
    analyzer: Box<dyn PolarityAnalyzer>,
}

impl SentimentEngine {
    pub fn new(scorer: ValenceScorer, analyzer: Box<dyn PolarityAnalyzer>) -> Self {
        Self { scorer, analyzer }
    }

    /// Builds the scorer from the merged lexicon and picks the analyzer
    /// once, here, based on whether one is configured.
    pub fn from_configuration(config: &Configuration) -> Result<Self, AnalyzerError> {
        let scorer = ValenceScorer::new(config.lexicon(), config.boosters());
        let analyzer: Box<dyn PolarityAnalyzer> = match &config.sentiment.external_analyzer {
            Some(external) => Box::new(HttpPolarityAnalyzer::new(external)?),
            None => Box::new(NullAnalyzer),
        };

        info!(
            analyzer = analyzer.name(),
            lexicon_entries = scorer.lexicon().len(),
            "sentiment engine ready"
        );
        Ok(Self::new(scorer, analyzer))
    }

    pub fn analyze(&self, text: &str) -> SentimentLabel {
        if text.is_empty() {
            return SentimentLabel::Neutral;
        }

        match self.analyzer.analyze(text) {
            Ok(Overall::Neutral) => {}
            Ok(verdict) => return verdict.into(),
            Err(e) => {
                warn!(analyzer = self.analyzer.name(), error = %e, "analyzer failed, using lexicon score");
            }
        }

        SentimentLabel::from_compound(self.scorer.compound(text))
    }
}
