//! Streaming event types

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use super::{FinishReason, ResponseMetadata, Usage};
use crate::error::LlmError;

/// Incremental chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatStreamEvent {
    /// First event of a stream, when the vendor reports ids up front.
    StreamStart { metadata: ResponseMetadata },
    /// Incremental text.
    ContentDelta { delta: String },
    /// Incremental tool call. `id`/`name` arrive with the first fragment only
    /// on vendors that stream arguments.
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments_delta: Option<String>,
    },
    UsageUpdate { usage: Usage },
    /// Last event of a successful stream.
    StreamEnd {
        finish_reason: Option<FinishReason>,
        metadata: ResponseMetadata,
    },
}

impl ChatStreamEvent {
    pub fn content(delta: impl Into<String>) -> Self {
        Self::ContentDelta {
            delta: delta.into(),
        }
    }

    pub fn as_content_delta(&self) -> Option<&str> {
        match self {
            Self::ContentDelta { delta } => Some(delta),
            _ => None,
        }
    }
}

/// Lazy sequence of chat events, consumed by pulling.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatStreamEvent, LlmError>> + Send>>;
