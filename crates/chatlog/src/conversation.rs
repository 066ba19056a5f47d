use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt::{self, Display};
use std::fs;
use std::path::Path;

use crate::content::{ExtractText, MessageContent};
use crate::errors::ChatlogError;

/// A message that failed to decode keeps its slot so neighbours still see
/// the original positions.
pub type MessageEntry = Result<Message, ChatlogError>;
pub type ConversationEntry = Result<Conversation, ChatlogError>;

/// Identifiers arrive as either JSON numbers or strings. `1` and `"1"` are
/// different identifiers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Identifier {
    Number(Number),
    Text(String),
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<usize> for Identifier {
    fn from(index: usize) -> Self {
        Identifier::Number(Number::from(index))
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

/// Every field decodes leniently: a wrongly-typed value degrades that field
/// to `None` instead of failing the message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Message {
    #[serde(default, deserialize_with = "lenient_identifier")]
    pub id: Option<Identifier>,
    #[serde(default, deserialize_with = "lenient_identifier")]
    pub sender_id: Option<Identifier>,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub message_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_internal: Option<bool>,
    /// Raw ISO-8601 creation time; parsing happens at annotation time.
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_identifier")]
    pub conversation_id: Option<Identifier>,
}

impl Message {
    pub fn from_value(value: Value) -> Result<Self, ChatlogError> {
        if !value.is_object() {
            return Err(ChatlogError::NotAnObject {
                what: "message",
                found: json_kind(&value),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal.unwrap_or(false)
    }

    /// Timestamp if present and non-empty.
    pub fn timestamp(&self) -> Option<&str> {
        self.created_at.as_deref().filter(|t| !t.is_empty())
    }
}

impl ExtractText for Message {
    fn extract_text(&self) -> String {
        self.content.extract_text()
    }
}

/// Strings are taken as-is, null becomes `None`, and any other scalar is
/// kept in its JSON rendering so a wrongly-typed field degrades instead of
/// failing the whole message.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Numbers and strings are identifiers; anything else is treated as absent.
fn lenient_identifier<'de, D>(deserializer: D) -> Result<Option<Identifier>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => Some(Identifier::Number(n)),
        Value::String(s) => Some(Identifier::Text(s)),
        _ => None,
    })
}

/// Accepts booleans, `0`/`1` and the strings `"true"`/`"false"`/`"0"`/`"1"`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => Some(b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

#[derive(Debug)]
pub struct Conversation {
    pub conversation_id: Option<Identifier>,
    pub messages: Vec<MessageEntry>,
}

impl Conversation {
    pub fn new(conversation_id: Option<Identifier>, messages: Vec<Message>) -> Self {
        Self {
            conversation_id,
            messages: messages.into_iter().map(Ok).collect(),
        }
    }

    /// Decodes one conversation object. Messages are decoded individually;
    /// only a structurally broken conversation is an error.
    pub fn from_value(value: Value) -> Result<Self, ChatlogError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ChatlogError::NotAnObject {
                    what: "conversation",
                    found: json_kind(&other),
                })
            }
        };

        let conversation_id = match map.remove("conversation_id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| ChatlogError::invalid_field("conversation_id", e.to_string()))?,
            ),
        };

        let messages = match map.remove("messages") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.into_iter().map(Message::from_value).collect(),
            Some(other) => {
                return Err(ChatlogError::invalid_field(
                    "messages",
                    format!("expected an array, found {}", json_kind(&other)),
                ))
            }
        };

        Ok(Self {
            conversation_id,
            messages,
        })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Decodes a JSON array of conversations. The outer array must be valid;
/// each element is decoded independently.
pub fn parse_conversations(input: &str) -> Result<Vec<ConversationEntry>, ChatlogError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    match serde_json::from_str::<Value>(input)? {
        Value::Array(items) => Ok(items.into_iter().map(Conversation::from_value).collect()),
        other => Err(ChatlogError::NotAnArray {
            found: json_kind(&other),
        }),
    }
}

pub fn read_conversations(path: &Path) -> Result<Vec<ConversationEntry>, ChatlogError> {
    let contents = fs::read_to_string(path).map_err(|source| ChatlogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_conversations(&contents)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_decode_full_message() {
        let message = Message::from_value(json!({
            "id": 17,
            "sender_id": "customer-9",
            "conversation_id": 3,
            "content": {"text": "Salon fiyatı nedir?"},
            "type": "text",
            "is_internal": false,
            "created_at": "2024-05-01T10:00:00"
        }))
        .unwrap();

        assert_eq!(message.id, Some(Identifier::from(17usize)));
        assert_eq!(message.sender_id, Some(Identifier::from("customer-9")));
        assert_eq!(message.conversation_id.as_ref().unwrap().to_string(), "3");
        assert_eq!(message.message_type.as_deref(), Some("text"));
        assert_eq!(message.timestamp(), Some("2024-05-01T10:00:00"));
        assert_eq!(message.extract_text(), "Salon fiyatı nedir?");
        assert!(!message.is_internal());
    }

    #[test]
    fn test_decode_sparse_message() {
        let message = Message::from_value(json!({})).unwrap();
        assert_eq!(message, Message::default());
        assert_eq!(message.extract_text(), "");
        assert_eq!(message.timestamp(), None);
    }

    #[test]
    fn test_wrongly_typed_scalars_degrade() {
        let message = Message::from_value(json!({
            "created_at": 1714557600,
            "type": null,
            "is_internal": null
        }))
        .unwrap();
        assert_eq!(message.created_at.as_deref(), Some("1714557600"));
        assert_eq!(message.message_type, None);
        assert!(!message.is_internal());
    }

    #[test]
    fn test_empty_timestamp_is_absent() {
        let message = Message::from_value(json!({"created_at": ""})).unwrap();
        assert_eq!(message.timestamp(), None);
    }

    #[test]
    fn test_non_object_message_is_an_error() {
        let err = Message::from_value(json!("hello")).unwrap_err();
        assert!(matches!(
            err,
            ChatlogError::NotAnObject {
                what: "message",
                found: "a string"
            }
        ));
    }

    #[test]
    fn test_unusable_identifiers_degrade() {
        let message = Message::from_value(json!({
            "id": [1],
            "sender_id": {"nested": true},
            "conversation_id": false,
            "content": {"text": "merhaba"}
        }))
        .unwrap();
        assert_eq!(message.id, None);
        assert_eq!(message.sender_id, None);
        assert_eq!(message.conversation_id, None);
        assert_eq!(message.extract_text(), "merhaba");
    }

    #[test]
    fn test_internal_flag_variants() {
        let flag = |value: Value| {
            Message::from_value(json!({ "is_internal": value }))
                .unwrap()
                .is_internal
        };
        assert_eq!(flag(json!(true)), Some(true));
        assert_eq!(flag(json!(0)), Some(false));
        assert_eq!(flag(json!(1)), Some(true));
        assert_eq!(flag(json!("TRUE")), Some(true));
        assert_eq!(flag(json!("false")), Some(false));
        assert_eq!(flag(json!(7)), None);
        assert_eq!(flag(json!("maybe")), None);
        assert_eq!(flag(json!({"a": 1})), None);
    }

    #[test]
    fn test_numeric_and_text_ids_differ() {
        assert_ne!(Identifier::from(1usize), Identifier::from("1"));
    }

    #[test]
    fn test_conversation_keeps_failed_message_slots() {
        let conversation = Conversation::from_value(json!({
            "conversation_id": "c-1",
            "messages": [
                {"sender_id": 1, "content": {"text": "merhaba"}},
                [1, 2, 3],
                {"sender_id": 2, "content": {"text": "hoş geldiniz"}}
            ]
        }))
        .unwrap();

        assert_eq!(conversation.conversation_id, Some(Identifier::from("c-1")));
        assert_eq!(conversation.len(), 3);
        assert!(conversation.messages[1].is_err());
        assert_eq!(
            conversation.messages[2].as_ref().unwrap().extract_text(),
            "hoş geldiniz"
        );
    }

    #[test]
    fn test_conversation_without_messages() {
        let conversation = Conversation::from_value(json!({"conversation_id": 5})).unwrap();
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_broken_conversations_are_errors() {
        assert!(Conversation::from_value(json!([])).is_err());
        assert!(Conversation::from_value(json!({"messages": {"a": 1}})).is_err());
        assert!(Conversation::from_value(json!({"conversation_id": [1]})).is_err());
    }

    #[test]
    fn test_parse_conversations() {
        let input = r#"[
            {"conversation_id": 1, "messages": [{"sender_id": 1}]},
            "garbage",
            {"conversation_id": 2, "messages": []}
        ]"#;
        let conversations = parse_conversations(input).unwrap();
        assert_eq!(conversations.len(), 3);
        assert!(conversations[0].is_ok());
        assert!(conversations[1].is_err());
        assert!(conversations[2].as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_parse_conversations_rejects_non_array() {
        assert!(matches!(
            parse_conversations(r#"{"conversation_id": 1}"#),
            Err(ChatlogError::NotAnArray { found: "an object" })
        ));
        assert!(matches!(
            parse_conversations("not json"),
            Err(ChatlogError::Json(_))
        ));
    }

    #[test]
    fn test_read_conversations_strips_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\u{feff}[]").unwrap();
        assert!(read_conversations(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_conversations(Path::new("/nonexistent/export.json")).unwrap_err();
        assert!(matches!(err, ChatlogError::Io { .. }));
    }
}
