//! Conversation history validation
//!
//! Every connector runs these checks before any network I/O.

use crate::error::LlmError;
use crate::types::{ChatMessage, MessageRole};

/// Where a connector puts the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemMessagePolicy {
    /// Removed from the message list and sent in a dedicated vendor field.
    Separate,
    /// Kept as the first message.
    Inline,
    /// Sent as a leading user turn.
    AsUser,
}

/// Validated history ready for a vendor DTO.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedHistory {
    /// System prompt for `Separate`; always `None` for the other policies.
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Check the shared history invariants and apply `policy`.
///
/// Rejects an empty history, more than one system message, and a history
/// made only of system messages.
pub fn validate_history(
    messages: &[ChatMessage],
    policy: SystemMessagePolicy,
) -> Result<PreparedHistory, LlmError> {
    if messages.is_empty() {
        return Err(LlmError::InvalidInput(
            "chat history must contain at least one message".to_string(),
        ));
    }

    let system_count = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .count();
    if system_count > 1 {
        return Err(LlmError::InvalidInput(format!(
            "chat history may contain at most one system message, found {system_count}"
        )));
    }
    if system_count == messages.len() {
        return Err(LlmError::InvalidInput(
            "chat history must contain at least one non-system message".to_string(),
        ));
    }

    let system = messages
        .iter()
        .find(|m| m.role == MessageRole::System)
        .map(|m| m.content.clone());
    let rest = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .cloned();

    let prepared = match (policy, system) {
        (SystemMessagePolicy::Separate, system) => PreparedHistory {
            system,
            messages: rest.collect(),
        },
        (SystemMessagePolicy::Inline, Some(system)) => PreparedHistory {
            system: None,
            messages: std::iter::once(ChatMessage::system(system)).chain(rest).collect(),
        },
        (SystemMessagePolicy::AsUser, Some(system)) => PreparedHistory {
            system: None,
            messages: std::iter::once(ChatMessage::user(system)).chain(rest).collect(),
        },
        (_, None) => PreparedHistory {
            system: None,
            messages: rest.collect(),
        },
    };
    Ok(prepared)
}
