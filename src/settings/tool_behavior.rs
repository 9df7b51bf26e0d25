use serde::{Deserialize, Serialize};

/// How tools advertised in a request may be used.
///
/// The host framework runs the auto-invoke loop; connectors only translate
/// this into the vendor's `tool_choice`-like field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolCallBehavior {
    /// Tools are not sent to the vendor.
    #[default]
    None,
    /// Tools are sent; the model may request calls which are returned to the caller.
    EnableFunctions,
    /// Tools are sent and the host executes requested calls up to `max_attempts` rounds.
    AutoInvoke { max_attempts: u32 },
    /// The model must call this function.
    Required { function: String },
}

impl ToolCallBehavior {
    pub const fn auto_invoke() -> Self {
        Self::AutoInvoke { max_attempts: 5 }
    }

    pub fn sends_tools(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// OpenAI-style `tool_choice` value; `None` means omit the field.
    pub fn openai_tool_choice(&self) -> Option<serde_json::Value> {
        match self {
            Self::None => None,
            Self::EnableFunctions | Self::AutoInvoke { .. } => Some(serde_json::json!("auto")),
            Self::Required { function } => Some(serde_json::json!({
                "type": "function",
                "function": { "name": function }
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_choice_mapping() {
        assert_eq!(ToolCallBehavior::None.openai_tool_choice(), None);
        assert_eq!(
            ToolCallBehavior::auto_invoke().openai_tool_choice(),
            Some(serde_json::json!("auto"))
        );
        let forced = ToolCallBehavior::Required {
            function: "get_weather".into(),
        };
        assert_eq!(
            forced.openai_tool_choice().unwrap()["function"]["name"],
            "get_weather"
        );
    }
}
