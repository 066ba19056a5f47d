//! chatlog: the logged-conversation data model and its lenient JSON decoding.

pub mod content;
pub mod conversation;
pub mod errors;

pub use content::{ChoiceOption, ExtractText, MessageContent, CHOICE_SEPARATOR};
pub use conversation::{
    parse_conversations, read_conversations, Conversation, ConversationEntry, Identifier,
    Message, MessageEntry,
};
pub use errors::ChatlogError;
