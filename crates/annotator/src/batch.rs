//! Batch orchestration: conversations in, ordered record table plus a
//! failure report out.

use std::path::Path;
use std::sync::Arc;

use chatlog::{parse_conversations, read_conversations, ChatlogError, ConversationEntry};
use common::configuration::{Configuration, Settings};
use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::errors::AnnotationFailure;
use crate::processor::{conversation_label, AnnotatedMessage, Answered, MessageAnnotator};
use crate::sentiment::AnalyzerError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub conversations_total: usize,
    pub conversations_skipped: usize,
    pub messages_total: usize,
    pub messages_failed: usize,
    pub unanswered: usize,
    pub slow_responses: usize,
    pub failures: Vec<AnnotationFailure>,
}

impl BatchReport {
    /// Share of message slots that degraded to placeholders.
    pub fn message_failure_rate(&self) -> f64 {
        if self.messages_total == 0 {
            0.0
        } else {
            self.messages_failed as f64 / self.messages_total as f64
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.conversations_total += other.conversations_total;
        self.conversations_skipped += other.conversations_skipped;
        self.messages_total += other.messages_total;
        self.messages_failed += other.messages_failed;
        self.unanswered += other.unanswered;
        self.slow_responses += other.slow_responses;
        self.failures.extend(other.failures);
    }
}

#[derive(Debug, Default)]
pub struct BatchOutput {
    pub records: Vec<AnnotatedMessage>,
    pub report: BatchReport,
}

pub struct BatchOrchestrator {
    annotator: Arc<MessageAnnotator>,
    max_response_time_hours: u64,
}

impl BatchOrchestrator {
    pub fn new(annotator: Arc<MessageAnnotator>, settings: &Settings) -> Self {
        Self {
            annotator,
            max_response_time_hours: settings.max_response_time_hours,
        }
    }

    pub fn from_configuration(config: &Configuration) -> Result<Self, AnalyzerError> {
        let annotator = MessageAnnotator::from_configuration(config)?;
        Ok(Self::new(Arc::new(annotator), &config.settings))
    }

    /// Annotates every conversation in order. Undecodable conversations are
    /// skipped; undecodable messages contribute placeholder records.
    pub fn annotate(&self, conversations: Vec<ConversationEntry>) -> BatchOutput {
        let mut output = BatchOutput::default();
        output.report.conversations_total = conversations.len();

        for (index, entry) in conversations.into_iter().enumerate() {
            let conversation = match entry {
                Ok(conversation) => conversation,
                Err(e) => {
                    warn!(conversation_index = index, error = %e, "skipping conversation");
                    output.report.conversations_skipped += 1;
                    output
                        .report
                        .failures
                        .push(AnnotationFailure::Conversation {
                            index,
                            reason: e.to_string(),
                        });
                    continue;
                }
            };

            let conversation_id = conversation_label(&conversation);
            debug!(
                conversation_id = %conversation_id,
                messages = conversation.len(),
                "annotating conversation"
            );

            for (message_index, outcome) in self
                .annotator
                .annotate_conversation(&conversation)
                .into_iter()
                .enumerate()
            {
                output.report.messages_total += 1;
                let record = match outcome {
                    Ok(record) => record,
                    Err(failure) => {
                        warn!(
                            conversation_id = %conversation_id,
                            message_index,
                            error = %failure,
                            "message degraded to placeholder"
                        );
                        output.report.messages_failed += 1;
                        output.report.failures.push(failure);
                        AnnotatedMessage::placeholder(conversation_id.clone(), message_index)
                    }
                };

                if record.is_answered == Answered::No {
                    output.report.unanswered += 1;
                }
                if record
                    .response_time
                    .is_some_and(|rt| rt.exceeds_hours(self.max_response_time_hours))
                {
                    output.report.slow_responses += 1;
                }
                output.records.push(record);
            }
        }
        output
    }

    /// Unparsable input yields an empty table.
    pub fn annotate_json(&self, input: &str) -> BatchOutput {
        match parse_conversations(input) {
            Ok(conversations) => self.annotate(conversations),
            Err(e) => {
                warn!(error = %e, "input is not a conversation collection");
                BatchOutput::default()
            }
        }
    }

    /// Reads and annotates one input file. Only an unreadable file is an
    /// error; undecodable content yields an empty table.
    pub fn annotate_file(&self, path: &Path) -> Result<BatchOutput, ChatlogError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _span = info_span!("batch", file = %name).entered();

        match read_conversations(path) {
            Ok(conversations) => Ok(self.annotate(conversations)),
            Err(e @ ChatlogError::Io { .. }) => Err(e),
            Err(e) => {
                warn!(error = %e, "input is not a conversation collection");
                Ok(BatchOutput::default())
            }
        }
    }
}
