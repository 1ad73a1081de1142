//! Model service response shapes.
//!
//! The Responses API is reached through different client stacks and
//! proxies, and the text comes back in one of two places: a top-level
//! `output_text` convenience field, or nested under
//! `output[].content[].text`. [`ModelResponse`] names both shapes and
//! [`ModelResponse::into_text`] is the single place they are reconciled.

use crate::error::ModelError;
use serde::Deserialize;

/// A model response in one of its two known shapes.
///
/// Deserialization tries the convenience shape first, so it is chosen
/// whenever `output_text` is present and non-null. Any structured output
/// sent alongside it is kept as a fallback for blank convenience text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ModelResponse {
    /// Flat shape with the text already joined.
    Convenience {
        /// Concatenated output text.
        output_text: String,
        /// Structured entries, when the service sends both.
        #[serde(default)]
        output: Vec<OutputEntry>,
    },
    /// Nested shape: a list of output entries, each with content items.
    Structured {
        /// Output entries in service order.
        output: Vec<OutputEntry>,
    },
}

/// One entry of the structured `output` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputEntry {
    /// Content items; absent on reasoning entries.
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

/// One content item of an output entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentItem {
    /// Text payload; absent on refusals and non-text items.
    #[serde(default)]
    pub text: Option<String>,
}

impl ModelResponse {
    /// Creates a flat response carrying `text`.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Convenience {
            output_text: text.into(),
            output: Vec::new(),
        }
    }

    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Malformed`] if the body matches neither shape.
    pub fn from_json(body: &str) -> Result<Self, ModelError> {
        serde_json::from_str(body).map_err(|e| {
            ModelError::Malformed(format!("unrecognized response shape: {e}"))
        })
    }

    /// Extracts the output text.
    ///
    /// Non-blank `output_text` wins. Otherwise the text is the first content
    /// item of the first entry that has any content; entries without content
    /// (reasoning traces) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyOutput`] if no text is found or the text
    /// is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use contrib_qa::model::ModelResponse;
    ///
    /// let flat = ModelResponse::from_json(r#"{"output_text": "SELECT 1"}"#).unwrap();
    /// assert_eq!(flat.into_text().unwrap(), "SELECT 1");
    ///
    /// let nested = ModelResponse::from_json(
    ///     r#"{"output": [{"content": [{"text": "SELECT 1"}]}]}"#,
    /// ).unwrap();
    /// assert_eq!(nested.into_text().unwrap(), "SELECT 1");
    /// ```
    pub fn into_text(self) -> Result<String, ModelError> {
        let text = match self {
            Self::Convenience {
                output_text,
                output,
            } => {
                if output_text.trim().is_empty() {
                    first_text(output)
                } else {
                    Some(output_text)
                }
            }
            Self::Structured { output } => first_text(output),
        };

        text.filter(|t| !t.trim().is_empty())
            .ok_or(ModelError::EmptyOutput)
    }
}

fn first_text(output: Vec<OutputEntry>) -> Option<String> {
    output
        .into_iter()
        .find(|entry| !entry.content.is_empty())
        .and_then(|entry| entry.content.into_iter().next())
        .and_then(|item| item.text)
}
