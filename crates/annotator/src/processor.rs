//! Per-message feature extraction and record assembly for one conversation.

use chatlog::{Conversation, ExtractText, Identifier, MessageEntry};
use common::configuration::Configuration;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tracing::debug;

use crate::classify::KeywordClassifier;
use crate::errors::AnnotationFailure;
use crate::sentiment::{AnalyzerError, SentimentEngine, SentimentLabel};
use crate::timing::ResponseTime;

pub type MessageOutcome = Result<AnnotatedMessage, AnnotationFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answered {
    Yes,
    No,
}

impl Display for Answered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answered::Yes => f.write_str("Yes"),
            Answered::No => f.write_str("No"),
        }
    }
}

/// Flat output record, one per input message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedMessage {
    pub conversation_id: String,
    pub message_id: String,
    pub sender_id: String,
    pub text: String,
    pub is_answered: Answered,
    pub sentiment: SentimentLabel,
    pub category: String,
    pub intent: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub is_internal: bool,
    pub timestamp: String,
    pub response_time: Option<ResponseTime>,
}

impl AnnotatedMessage {
    /// Stand-in for a message that could not be annotated.
    pub fn placeholder(conversation_id: impl Into<String>, index: usize) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message_id: index.to_string(),
            sender_id: String::new(),
            text: String::new(),
            is_answered: Answered::No,
            sentiment: SentimentLabel::Neutral,
            category: common::consts::AMBIGUOUS_LABEL.to_string(),
            intent: common::consts::AMBIGUOUS_LABEL.to_string(),
            message_type: String::new(),
            is_internal: false,
            timestamp: String::new(),
            response_time: None,
        }
    }
}

/// A message is answered when the next one exists and comes from a
/// different, known sender.
pub fn is_answered(messages: &[MessageEntry], index: usize) -> Answered {
    let Some(Ok(next)) = messages.get(index + 1) else {
        return Answered::No;
    };
    let current_sender = messages
        .get(index)
        .and_then(|entry| entry.as_ref().ok())
        .and_then(|message| message.sender_id.as_ref());

    match next.sender_id.as_ref() {
        Some(next_sender) if Some(next_sender) != current_sender => Answered::Yes,
        _ => Answered::No,
    }
}

/// Time since the previous message; absent for the first message, for
/// missing or unparsable timestamps and for incomparable pairs.
pub fn response_time(messages: &[MessageEntry], index: usize) -> Option<ResponseTime> {
    if index == 0 {
        return None;
    }
    let current = messages.get(index)?.as_ref().ok()?.timestamp()?;
    let previous = messages.get(index - 1)?.as_ref().ok()?.timestamp();

    let response_time = previous.and_then(|previous| ResponseTime::between(previous, current));
    match response_time {
        None => debug!(
            message_index = index,
            previous = previous.unwrap_or_default(),
            current,
            "no response time for message"
        ),
        Some(rt) if rt.is_negative() => debug!(
            message_index = index,
            response_time = %rt,
            "message timestamps out of order"
        ),
        Some(_) => {}
    }
    response_time
}

/// Conversation-level id used in output records when a message carries none.
pub fn conversation_label(conversation: &Conversation) -> String {
    conversation
        .conversation_id
        .as_ref()
        .map(Identifier::to_string)
        .unwrap_or_default()
}

pub struct MessageAnnotator {
    sentiment: SentimentEngine,
    categories: KeywordClassifier,
    intents: KeywordClassifier,
}

impl MessageAnnotator {
    pub fn new(
        sentiment: SentimentEngine,
        categories: KeywordClassifier,
        intents: KeywordClassifier,
    ) -> Self {
        Self {
            sentiment,
            categories,
            intents,
        }
    }

    pub fn from_configuration(config: &Configuration) -> Result<Self, AnalyzerError> {
        Ok(Self::new(
            SentimentEngine::from_configuration(config)?,
            KeywordClassifier::categories(config.category_table()),
            KeywordClassifier::intents(config.intent_table()),
        ))
    }

    pub fn sentiment(&self, text: &str) -> SentimentLabel {
        self.sentiment.analyze(text)
    }

    pub fn category(&self, text: &str) -> &str {
        self.categories.classify(text)
    }

    pub fn intent(&self, text: &str) -> &str {
        self.intents.classify(text)
    }

    /// One outcome per message slot, in conversation order.
    pub fn annotate_conversation(&self, conversation: &Conversation) -> Vec<MessageOutcome> {
        let fallback_id = conversation_label(conversation);
        (0..conversation.len())
            .map(|index| self.annotate_message(conversation, index, &fallback_id))
            .collect()
    }

    fn annotate_message(
        &self,
        conversation: &Conversation,
        index: usize,
        fallback_id: &str,
    ) -> MessageOutcome {
        let message = match &conversation.messages[index] {
            Ok(message) => message,
            Err(e) => {
                return Err(AnnotationFailure::Message {
                    conversation_id: fallback_id.to_string(),
                    message_index: index,
                    reason: e.to_string(),
                })
            }
        };

        let text = message.extract_text();
        let conversation_id = message
            .conversation_id
            .as_ref()
            .map(Identifier::to_string)
            .unwrap_or_else(|| fallback_id.to_string());
        let message_id = message
            .id
            .clone()
            .unwrap_or_else(|| Identifier::from(index))
            .to_string();

        Ok(AnnotatedMessage {
            conversation_id,
            message_id,
            sender_id: message
                .sender_id
                .as_ref()
                .map(Identifier::to_string)
                .unwrap_or_default(),
            is_answered: is_answered(&conversation.messages, index),
            sentiment: self.sentiment(&text),
            category: self.category(&text).to_string(),
            intent: self.intent(&text).to_string(),
            message_type: message.message_type.clone().unwrap_or_default(),
            is_internal: message.is_internal(),
            timestamp: message.created_at.clone().unwrap_or_default(),
            response_time: response_time(&conversation.messages, index),
            text,
        })
    }
}
