//! Lexicon store: polarity weights and the keyword tables used by the
//! category and intent classifiers.
//!
//! Everything here is built once from configuration and never mutated
//! afterwards, so the tables can be shared freely between worker threads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scalar added (or subtracted) by an intensifier word.
pub const BOOSTER_INCREMENT: f64 = 0.293;
pub const BOOSTER_DECREMENT: f64 = -0.293;

// ============================================================================
// General polarity dictionary
// ============================================================================

/// General-purpose polarity weights on the usual -4..=4 valence scale.
/// Domain overrides from configuration are layered on top of these.
static GENERAL_LEXICON: &[(&str, f64)] = &[
    // Positive
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("wonderful", 2.7),
    ("fantastic", 2.6),
    ("perfect", 2.7),
    ("beautiful", 2.9),
    ("lovely", 2.8),
    ("love", 3.2),
    ("loved", 2.9),
    ("like", 2.0),
    ("liked", 1.8),
    ("nice", 1.8),
    ("happy", 2.7),
    ("glad", 2.0),
    ("pleased", 1.9),
    ("satisfied", 1.8),
    ("best", 3.2),
    ("better", 1.9),
    ("thanks", 1.9),
    ("thank", 1.5),
    ("thx", 1.5),
    ("helpful", 1.7),
    ("friendly", 2.2),
    ("kind", 2.4),
    ("recommend", 1.5),
    ("recommended", 1.6),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("fun", 2.3),
    ("cool", 1.3),
    ("ok", 1.2),
    ("okay", 0.9),
    ("fine", 0.8),
    ("yes", 1.7),
    ("super", 2.9),
    ("gorgeous", 3.0),
    ("stunning", 2.8),
    ("elegant", 2.1),
    ("affordable", 1.4),
    ("reasonable", 1.0),
    ("quick", 1.0),
    ("fast", 0.9),
    ("professional", 1.4),
    ("congratulations", 2.9),
    ("congrats", 2.4),
    (":)", 2.0),
    (":-)", 1.3),
    (":d", 2.9),
    ("<3", 1.9),
    // Negative
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("horrible", -2.5),
    ("worst", -3.1),
    ("worse", -2.1),
    ("hate", -2.7),
    ("hated", -3.2),
    ("poor", -2.1),
    ("sad", -2.1),
    ("angry", -2.3),
    ("annoyed", -1.6),
    ("upset", -1.6),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("unhappy", -1.8),
    ("rude", -2.0),
    ("problem", -1.7),
    ("problems", -1.7),
    ("issue", -0.6),
    ("complaint", -1.2),
    ("broken", -1.7),
    ("wrong", -2.1),
    ("fail", -2.5),
    ("failed", -2.3),
    ("late", -0.9),
    ("delay", -1.3),
    ("delayed", -1.3),
    ("expensive", -1.2),
    ("overpriced", -1.9),
    ("ugly", -3.1),
    ("useless", -1.8),
    ("waste", -1.8),
    ("sorry", -0.3),
    ("cancel", -1.0),
    ("cancelled", -1.0),
    ("no", -1.2),
    (":(", -1.9),
    (":-(", -1.5),
];

/// Intensifiers that scale the valence of the following sentiment word.
static GENERAL_BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOSTER_INCREMENT),
    ("amazingly", BOOSTER_INCREMENT),
    ("completely", BOOSTER_INCREMENT),
    ("considerably", BOOSTER_INCREMENT),
    ("deeply", BOOSTER_INCREMENT),
    ("especially", BOOSTER_INCREMENT),
    ("extremely", BOOSTER_INCREMENT),
    ("highly", BOOSTER_INCREMENT),
    ("incredibly", BOOSTER_INCREMENT),
    ("really", BOOSTER_INCREMENT),
    ("so", BOOSTER_INCREMENT),
    ("totally", BOOSTER_INCREMENT),
    ("truly", BOOSTER_INCREMENT),
    ("very", BOOSTER_INCREMENT),
    ("almost", BOOSTER_DECREMENT),
    ("barely", BOOSTER_DECREMENT),
    ("hardly", BOOSTER_DECREMENT),
    ("marginally", BOOSTER_DECREMENT),
    ("partly", BOOSTER_DECREMENT),
    ("slightly", BOOSTER_DECREMENT),
    ("somewhat", BOOSTER_DECREMENT),
];

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn merge_tables(defaults: &[(&str, f64)], overrides: &HashMap<String, f64>) -> HashMap<String, f64> {
    let mut merged: HashMap<String, f64> = defaults
        .iter()
        .map(|(word, weight)| (normalize_key(word), *weight))
        .collect();
    for (word, weight) in overrides {
        merged.insert(normalize_key(word), *weight);
    }
    merged
}

// ============================================================================
// Lexicon
// ============================================================================

/// Merged word/phrase -> signed weight table.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    weights: HashMap<String, f64>,
    max_phrase_words: usize,
}

impl Lexicon {
    /// The general dictionary with no domain overrides.
    pub fn general() -> Self {
        Self::with_overrides(&HashMap::new())
    }

    /// General dictionary merged with `overrides`; override entries win for
    /// identical (normalized) keys.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        Self::from_weights(merge_tables(GENERAL_LEXICON, overrides))
    }

    pub fn from_weights(weights: HashMap<String, f64>) -> Self {
        let max_phrase_words = weights
            .keys()
            .map(|k| k.split(' ').count())
            .max()
            .unwrap_or(0);
        Self {
            weights,
            max_phrase_words,
        }
    }

    /// Looks up a lowercased word or space-joined phrase.
    pub fn weight(&self, key: &str) -> Option<f64> {
        self.weights.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.weights.contains_key(key)
    }

    /// Longest entry length in words (1 when the table holds no phrases).
    pub fn max_phrase_words(&self) -> usize {
        self.max_phrase_words
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Intensifier word -> scalar table.
#[derive(Debug, Clone, Default)]
pub struct BoosterTable {
    scalars: HashMap<String, f64>,
}

impl BoosterTable {
    pub fn general() -> Self {
        Self::with_overrides(&HashMap::new())
    }

    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        Self {
            scalars: merge_tables(GENERAL_BOOSTERS, overrides),
        }
    }

    pub fn scalar(&self, word: &str) -> Option<f64> {
        self.scalars.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.scalars.contains_key(word)
    }
}

// ============================================================================
// Keyword tables
// ============================================================================

/// One labelled group of trigger phrases, as declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordGroup {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Ordered list of keyword groups. Declaration order is the match priority.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    groups: Vec<KeywordGroup>,
}

impl KeywordTable {
    /// Keywords are lowercased here so matching only lowercases the text.
    pub fn new(groups: &[KeywordGroup]) -> Self {
        let groups = groups
            .iter()
            .map(|group| KeywordGroup {
                label: group.label.clone(),
                keywords: group.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { groups }
    }

    /// Label of the first group with a keyword occurring in `lowered_text`.
    pub fn first_match(&self, lowered_text: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|group| {
                group
                    .keywords
                    .iter()
                    .any(|keyword| lowered_text.contains(keyword.as_str()))
            })
            .map(|group| group.label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
