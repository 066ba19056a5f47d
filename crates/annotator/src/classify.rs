use common::consts::{AMBIGUOUS_LABEL, GENERAL_QUERY_LABEL, OTHER_CATEGORY_LABEL};
use common::lexicon::KeywordTable;

/// First-match keyword classifier over an ordered table.
///
/// Empty text yields the ambiguous label; text matching no group yields the
/// fallback label. Matching is a case-insensitive substring test.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: KeywordTable,
    fallback_label: String,
}

impl KeywordClassifier {
    pub fn new(table: KeywordTable, fallback_label: impl Into<String>) -> Self {
        Self {
            table,
            fallback_label: fallback_label.into(),
        }
    }

    pub fn categories(table: KeywordTable) -> Self {
        Self::new(table, OTHER_CATEGORY_LABEL)
    }

    pub fn intents(table: KeywordTable) -> Self {
        Self::new(table, GENERAL_QUERY_LABEL)
    }

    pub fn classify(&self, text: &str) -> &str {
        if text.is_empty() {
            return AMBIGUOUS_LABEL;
        }
        let lowered = text.to_lowercase();
        self.table
            .first_match(&lowered)
            .unwrap_or(self.fallback_label.as_str())
    }
}
