//! Message data model and payload normalization.
//!
//! A message arrives as an arbitrary JSON value. The durable log always
//! records its original encoding; display and downstream forwarding use a
//! normalized text form with at most one layer of string encoding removed.

use chrono::{DateTime, Local};
use serde_json::Value;

/// Sender label used when the request supplies no `text_from`.
pub const DEFAULT_SENDER: &str = "aYYbsYYa";

/// A single accepted notification in its normalized display/forward form.
///
/// Immutable once constructed; cloned by value into each delivery task.
#[derive(Debug, Clone)]
pub struct Message {
    /// Normalized text, forwarded to channels and shown in the viewer.
    pub text: String,
    /// Free-text display origin.
    pub sender_label: String,
    /// Assigned at ingestion.
    pub received_at: DateTime<Local>,
}

impl Message {
    /// Construct a message from the raw payload value and optional
    /// `text_from` routing field.
    pub fn new(raw: &Value, text_from: Option<String>, received_at: DateTime<Local>) -> Self {
        Self {
            text: display_text(raw),
            sender_label: text_from.unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            received_at,
        }
    }
}

/// Render a raw message value as display/forward text, unwrapping at most
/// one layer of string encoding.
///
/// A string value that itself parses as a JSON string loses exactly one
/// layer (`"\"hello\""` becomes `hello`); anything else is left alone. The
/// unwrap is deliberately not recursive, so a triple-encoded value keeps
/// its remaining layers.
pub fn display_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::String(inner)) => inner,
            _ => s.clone(),
        },
        other => other.to_string(),
    }
}

/// The original encoding of the message value, as recorded in the durable
/// log. Never unwrapped.
pub fn original_text(raw: &Value) -> String {
    raw.to_string()
}
