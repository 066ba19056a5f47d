use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Joins the option texts of a multiple-choice message.
pub const CHOICE_SEPARATOR: &str = " | ";

pub trait ExtractText {
    fn extract_text(&self) -> String;
}

/// One selectable option of a multiple-choice message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ChoiceOption {
    pub text: Option<String>,
}

/// Message payload. Variants are tried in order, so an object carrying both
/// `text` and `options` is a text payload; any other shape is kept verbatim
/// as `Unrecognized`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text { text: String },
    Choices { options: Vec<ChoiceOption> },
    Unrecognized(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Unrecognized(Value::Null)
    }
}

impl ExtractText for MessageContent {
    fn extract_text(&self) -> String {
        match self {
            MessageContent::Text { text } => text.clone(),
            MessageContent::Choices { options } => options
                .iter()
                .map(|option| option.text.as_deref().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(CHOICE_SEPARATOR),
            MessageContent::Unrecognized(_) => String::new(),
        }
    }
}
