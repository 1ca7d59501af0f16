//! Tool Result Formatting
//!
//! Converts a [`CommandResponse`] into MCP `tools/call` content blocks.
//!
//! | Command result                                   | Content                          |
//! |--------------------------------------------------|----------------------------------|
//! | `Error(message)`                                 | one text block, `isError: true`  |
//! | `Ok` without image keys                          | one text block with the payload  |
//! | `Ok` with only `image` (+ `mimeType`)            | one image block                  |
//! | `Ok` with `image` and/or `images` plus metadata  | metadata text block, then images |
//!
//! An image value is either a base64 string or `{ "data": ..., "mimeType": ... }`.
//! The media type falls back to `image/png`.

use crate::commands::{CommandParams, CommandResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};

/// Media type used when a handler does not declare one
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

/// Key for one primary image
pub const IMAGE_KEY: &str = "image";

/// Key for a list of images
pub const IMAGES_KEY: &str = "images";

const MIME_KEYS: [&str; 2] = ["mimeType", "mime_type"];

/// One MCP content block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// `tools/call` result body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: true,
        }
    }

    pub fn to_value(&self) -> Value {
        json!(self)
    }
}

/// Image bytes ready to be returned from a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Base64-encoded image data
    pub data: String,
    pub mime_type: String,
}

impl ImagePayload {
    /// Encode raw image bytes
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// JSON form understood by [`format_response`]
    pub fn to_value(&self) -> Value {
        json!({ "data": self.data, "mimeType": self.mime_type })
    }
}

/// Format a command result as MCP tool content
pub fn format_response(response: &CommandResponse) -> ToolCallResult {
    match response {
        CommandResponse::Error(message) => ToolCallResult::error(message.clone()),
        CommandResponse::Ok(data) => format_data(data),
    }
}

fn format_data(data: &CommandParams) -> ToolCallResult {
    let primary = match data.get(IMAGE_KEY) {
        Some(value) => match parse_image(value, mime_hint(data)) {
            Some(image) => Some(image),
            None => return text_result(data),
        },
        None => None,
    };

    let mut images: Vec<ContentBlock> = primary.into_iter().collect();
    if let Some(value) = data.get(IMAGES_KEY) {
        let Some(list) = value.as_array() else {
            return text_result(data);
        };
        for item in list {
            match parse_image(item, None) {
                Some(image) => images.push(image),
                None => return text_result(data),
            }
        }
    }

    if images.is_empty() && !data.contains_key(IMAGES_KEY) {
        return text_result(data);
    }

    let metadata: CommandParams = data
        .iter()
        .filter(|(key, _)| !is_image_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut content = Vec::with_capacity(images.len() + 1);
    if !metadata.is_empty() {
        content.push(ContentBlock::text(to_text(&metadata)));
    }
    content.extend(images);
    if content.is_empty() {
        return text_result(data);
    }

    ToolCallResult {
        content,
        is_error: false,
    }
}

fn text_result(data: &CommandParams) -> ToolCallResult {
    ToolCallResult {
        content: vec![ContentBlock::text(to_text(data))],
        is_error: false,
    }
}

fn to_text(data: &CommandParams) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| format!("{:?}", data))
}

fn is_image_key(key: &str) -> bool {
    key == IMAGE_KEY || key == IMAGES_KEY || MIME_KEYS.contains(&key)
}

fn mime_hint(data: &CommandParams) -> Option<&str> {
    MIME_KEYS
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
}

fn parse_image(value: &Value, mime_hint: Option<&str>) -> Option<ContentBlock> {
    let (data, mime_type) = match value {
        Value::String(data) => (data.as_str(), mime_hint),
        Value::Object(object) => {
            let data = object.get("data")?.as_str()?;
            let mime = MIME_KEYS
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))
                .or(mime_hint);
            (data, mime)
        }
        _ => return None,
    };
    if data.is_empty() {
        return None;
    }
    Some(ContentBlock::Image {
        data: data.to_string(),
        mime_type: mime_type
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME_TYPE)
            .to_string(),
    })
}

#[cfg(test)]
#[path = "response_test.rs"]
mod response_test;
