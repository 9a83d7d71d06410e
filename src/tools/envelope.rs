//! The result shape every tool call returns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// `{content: [{type: "text", text}], isError}`; `isError` is omitted when
/// false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// All text blocks joined by newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|ContentBlock::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_omits_is_error() {
        let value = serde_json::to_value(ToolResponse::text("ok")).unwrap();
        assert_eq!(value, json!({"content": [{"type": "text", "text": "ok"}]}));
    }

    #[test]
    fn test_error_sets_is_error() {
        let value = serde_json::to_value(ToolResponse::error("boom")).unwrap();
        assert_eq!(
            value,
            json!({"content": [{"type": "text", "text": "boom"}], "isError": true})
        );
    }

    #[test]
    fn test_deserialize_without_is_error() {
        let response: ToolResponse =
            serde_json::from_value(json!({"content": [{"type": "text", "text": "a"}]})).unwrap();
        assert!(!response.is_error);
        assert_eq!(response.joined_text(), "a");
    }
}
