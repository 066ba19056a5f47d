//! Rule-based valence scorer producing a compound polarity in [-1, 1].
//!
//! Each token is looked up in the merged lexicon (longest phrase first) and
//! its valence adjusted by nearby intensifiers, negators, capitalization and
//! contrastive conjunctions. The summed valence is amplified by trailing
//! punctuation and squashed into the compound score.

use common::lexicon::{BoosterTable, Lexicon};

/// Added to a sentiment word written in caps inside mixed-case text.
const CAPS_EMPHASIS: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
/// Approximates the maximum expected valence sum.
const NORMALIZATION_ALPHA: f64 = 15.0;

const EXCLAMATION_WEIGHT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_WEIGHT: f64 = 0.18;
const MAX_QUESTION_EMPHASIS: f64 = 0.96;

/// Intensifier weight by distance from the sentiment word.
const BOOSTER_DECAY: [f64; 3] = [1.0, 0.95, 0.9];

/// Valences before a contrast word are damped, those after are stressed.
const BEFORE_CONTRAST: f64 = 0.5;
const AFTER_CONTRAST: f64 = 1.5;

static NEGATORS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "never", "none", "nope", "nor",
    "not", "nothing", "nowhere", "shouldnt", "wasnt", "werent", "without", "wont", "wouldnt",
    "rarely", "seldom", "despite",
];

static CONTRAST_WORDS: &[&str] = &["but", "ama", "fakat", "ancak"];

#[derive(Debug)]
struct Token<'a> {
    raw: &'a str,
    lower: String,
}

fn strip_punctuation_if_word(token: &str) -> &str {
    let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
    // Short leftovers are emoticons like ":)" or ":D"; keep them whole.
    if stripped.chars().count() <= 2 {
        token
    } else {
        stripped
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    text.split_whitespace()
        .map(strip_punctuation_if_word)
        .filter(|t| !t.is_empty())
        .map(|raw| Token {
            raw,
            lower: raw.to_lowercase(),
        })
        .collect()
}

fn is_all_caps(word: &str) -> bool {
    let mut has_upper = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_upper = true;
        }
    }
    has_upper
}

/// True when some, but not all, tokens are written in caps.
fn has_cap_differential(tokens: &[Token<'_>]) -> bool {
    let caps = tokens.iter().filter(|t| is_all_caps(t.raw)).count();
    caps > 0 && caps < tokens.len()
}

fn is_negator(word: &str) -> bool {
    NEGATORS.contains(&word) || word.ends_with("n't")
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_emphasis = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_WEIGHT,
        _ => MAX_QUESTION_EMPHASIS,
    };
    exclamations as f64 * EXCLAMATION_WEIGHT + question_emphasis
}

fn normalize(score: f64) -> f64 {
    let compound = score / (score * score + NORMALIZATION_ALPHA).sqrt();
    let compound = compound.clamp(-1.0, 1.0);
    (compound * 10_000.0).round() / 10_000.0
}

fn apply_contrast(tokens: &[Token<'_>], valences: &mut [f64]) {
    let Some(pivot) = tokens
        .iter()
        .position(|t| CONTRAST_WORDS.contains(&t.lower.as_str()))
    else {
        return;
    };
    for (index, valence) in valences.iter_mut().enumerate() {
        if index < pivot {
            *valence *= BEFORE_CONTRAST;
        } else if index > pivot {
            *valence *= AFTER_CONTRAST;
        }
    }
}

/// Lexicon-weighted polarity scorer over a fixed lexicon and booster table.
#[derive(Debug, Clone)]
pub struct ValenceScorer {
    lexicon: Lexicon,
    boosters: BoosterTable,
}

impl ValenceScorer {
    pub fn new(lexicon: Lexicon, boosters: BoosterTable) -> Self {
        Self { lexicon, boosters }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Compound polarity of `text`; 0.0 when nothing in it carries valence.
    pub fn compound(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }

        let cap_differential = has_cap_differential(&tokens);
        let mut valences = vec![0.0; tokens.len()];

        let mut index = 0;
        while index < tokens.len() {
            let Some((base, span)) = self.lookup(&tokens, index) else {
                index += 1;
                continue;
            };

            let mut valence = base;
            if cap_differential && is_all_caps(tokens[index].raw) {
                valence += CAPS_EMPHASIS * valence.signum();
            }

            for (distance, decay) in BOOSTER_DECAY.iter().enumerate() {
                if index <= distance {
                    break;
                }
                let prior = &tokens[index - distance - 1];
                if self.lexicon.contains(&prior.lower) {
                    continue;
                }
                valence += self.booster_scalar(prior, valence, cap_differential) * decay;
                if is_negator(&prior.lower) {
                    valence *= NEGATION_SCALAR;
                }
            }

            valences[index] = valence;
            index += span;
        }

        apply_contrast(&tokens, &mut valences);

        let mut sum: f64 = valences.iter().sum();
        let emphasis = punctuation_emphasis(text);
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }

        normalize(sum)
    }

    /// Base valence and token span of the lexicon entry starting at `index`.
    fn lookup(&self, tokens: &[Token<'_>], index: usize) -> Option<(f64, usize)> {
        let longest = self.lexicon.max_phrase_words().min(tokens.len() - index);
        for span in (2..=longest).rev() {
            let phrase = tokens[index..index + span]
                .iter()
                .map(|t| t.lower.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(weight) = self.lexicon.weight(&phrase) {
                return Some((weight, span));
            }
        }

        let word = &tokens[index].lower;
        // Intensifiers only modify their neighbours.
        if self.boosters.contains(word) {
            return None;
        }
        self.lexicon.weight(word).map(|weight| (weight, 1))
    }

    fn booster_scalar(&self, token: &Token<'_>, valence: f64, cap_differential: bool) -> f64 {
        let Some(mut scalar) = self.boosters.scalar(&token.lower) else {
            return 0.0;
        };
        if valence < 0.0 {
            scalar = -scalar;
        }
        if cap_differential && is_all_caps(token.raw) {
            scalar += CAPS_EMPHASIS * valence.signum();
        }
        scalar
    }
}

impl Default for ValenceScorer {
    fn default() -> Self {
        Self::new(Lexicon::general(), BoosterTable::general())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn domain_scorer() -> ValenceScorer {
        let mut lexicon = HashMap::new();
        lexicon.insert("harika".to_string(), 4.0);
        lexicon.insert("pahalı".to_string(), -2.5);
        lexicon.insert("hayal kırıklığı".to_string(), -3.0);
        let mut boosters = HashMap::new();
        boosters.insert("çok".to_string(), 0.293);
        ValenceScorer::new(
            Lexicon::with_overrides(&lexicon),
            BoosterTable::with_overrides(&boosters),
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_empty_and_unscored_text() {
        let scorer = domain_scorer();
        assert_eq!(scorer.compound(""), 0.0);
        assert_eq!(scorer.compound("   "), 0.0);
        assert_eq!(scorer.compound("Teslimat tarihini öğrenebilir miyim?"), 0.0);
    }

    #[test]
    fn test_single_word_with_exclamation() {
        // 4.0 + one exclamation (0.292), normalized.
        let score = domain_scorer().compound("Harika bir mekan!");
        assert!(approx(score, 0.7424), "score was {}", score);
    }

    #[test]
    fn test_booster_strengthens_negative_word() {
        let scorer = domain_scorer();
        let plain = scorer.compound("Fiyatlar pahalı");
        let boosted = scorer.compound("Fiyatlar çok pahalı");
        assert!(plain < 0.0);
        assert!(boosted < plain);
    }

    #[test]
    fn test_phrase_entry_scores_once() {
        let scorer = domain_scorer();
        let score = scorer.compound("tam bir hayal kırıklığı");
        assert!(approx(score, normalize(-3.0)));
        assert_eq!(scorer.compound("hayal gücü"), 0.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let scorer = ValenceScorer::default();
        assert!(scorer.compound("this is good") > 0.0);
        assert!(scorer.compound("this is not good") < 0.0);
        assert!(scorer.compound("this isn't good") < 0.0);
    }

    #[test]
    fn test_contrast_shifts_weight_to_second_clause() {
        let scorer = ValenceScorer::default();
        // Without the contrast rule the sum would be 1.9 - 2.5 < 0.
        assert!(scorer.compound("bad but good") > 0.0);
        assert!(scorer.compound("good but bad") < 0.0);
    }

    #[test]
    fn test_caps_emphasis_only_in_mixed_case() {
        let scorer = ValenceScorer::default();
        let shouted = scorer.compound("the food was GREAT");
        let plain = scorer.compound("the food was great");
        assert!(shouted > plain);
        assert!(approx(scorer.compound("GREAT"), scorer.compound("great")));
    }

    #[test]
    fn test_punctuation_emphasis_caps_out() {
        assert!(approx(punctuation_emphasis("wow!!!!!!!"), 4.0 * EXCLAMATION_WEIGHT));
        assert!(approx(punctuation_emphasis("really??"), 2.0 * QUESTION_WEIGHT));
        assert!(approx(punctuation_emphasis("what?????"), MAX_QUESTION_EMPHASIS));
        assert_eq!(punctuation_emphasis("ok?"), 0.0);
    }

    #[test]
    fn test_emoticons_survive_tokenization() {
        let scorer = ValenceScorer::default();
        assert!(scorer.compound("see you tomorrow :)") > 0.0);
        assert!(scorer.compound("see you tomorrow :(") < 0.0);
    }

    #[test]
    fn test_compound_is_bounded() {
        let scorer = domain_scorer();
        let text = "harika harika harika harika harika harika harika!!!!";
        let score = scorer.compound(text);
        assert!(score <= 1.0 && score > 0.9);
    }
}
