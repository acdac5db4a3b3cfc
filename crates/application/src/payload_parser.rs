//! Payload parser - Repair loosely formatted request bodies
//!
//! Clients of the send endpoint post bodies that are "almost JSON": wrapped
//! in stray characters, single-quoted, or with escaped line breaks left
//! in the message text. The parser recovers `{ number, message }` from
//! those bodies on a best-effort basis.
//!
//! The repair is heuristic. Replacing every `'` with `"` breaks messages
//! that contain apostrophes; such bodies fail with `MalformedPayload`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApplicationError;

/// Request body as received
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadInput {
    /// Body already decoded into structured data
    Structured(Value),
    /// Raw body text, possibly malformed
    Raw(String),
}

impl PayloadInput {
    /// Classify a request body
    ///
    /// A body declared as JSON that parses strictly into an object is
    /// structured; everything else goes through lenient repair.
    pub fn from_body(body: &str, declared_json: bool) -> Self {
        if declared_json {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(body) {
                return Self::Structured(value);
            }
            debug!("Body declared as JSON did not parse strictly, falling back to repair");
        }
        Self::Raw(body.to_string())
    }
}

/// Fields of a text send request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPayload {
    /// Recipient number as sent by the client
    pub number: Option<String>,
    /// Message text
    pub message: Option<String>,
}

impl TextPayload {
    fn from_value(value: &Value) -> Self {
        Self {
            number: field_text(value, "number"),
            message: field_text(value, "message"),
        }
    }
}

/// Fields of an audio send request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioPayload {
    /// Recipient number as sent by the client
    pub number: Option<String>,
    /// Public URL of the audio file
    pub audio_url: Option<String>,
}

impl AudioPayload {
    /// Extract `{ number, audioUrl }` from a decoded body
    pub fn from_value(value: &Value) -> Self {
        Self {
            number: field_text(value, "number"),
            audio_url: field_text(value, "audioUrl"),
        }
    }
}

/// Parse a send request body
pub fn parse_payload(input: PayloadInput) -> Result<TextPayload, ApplicationError> {
    match input {
        PayloadInput::Structured(value) => Ok(TextPayload::from_value(&value)),
        PayloadInput::Raw(raw) => parse_lenient(&raw),
    }
}

/// Recover `{ number, message }` from raw body text
pub fn parse_lenient(raw: &str) -> Result<TextPayload, ApplicationError> {
    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        (Some(_), Some(_)) => {
            return Err(ApplicationError::MalformedPayload(
                "closing brace precedes opening brace".to_string(),
            ));
        },
        _ => {
            return Err(ApplicationError::MalformedPayload(
                "no object delimiters found".to_string(),
            ));
        },
    };

    let candidate = raw[start..=end].replace('\'', "\"");

    let value: Value = serde_json::from_str(&candidate).map_err(|e| {
        warn!(error = %e, body_len = raw.len(), "Failed to parse repaired payload");
        ApplicationError::MalformedPayload(e.to_string())
    })?;

    let mut payload = TextPayload::from_value(&value);
    if value.get("message").is_some_and(Value::is_string) {
        payload.message = payload.message.map(|m| m.replace("\\n", "\n"));
    }

    debug!(
        trimmed = raw.len() - candidate.len(),
        has_number = payload.number.is_some(),
        has_message = payload.message.is_some(),
        "Payload repaired"
    );

    Ok(payload)
}

/// Read a field as text; numbers and booleans are rendered, null is absent
fn field_text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn clean_json_is_parsed() {
        let payload = parse_lenient(r#"{"number":"11987654321","message":"hi"}"#).unwrap();
        assert_eq!(payload.number.as_deref(), Some("11987654321"));
        assert_eq!(payload.message.as_deref(), Some("hi"));
    }

    #[test]
    fn surrounding_noise_is_discarded() {
        let payload =
            parse_lenient(r#"body=  {"number":"11987654321","message":"hi"}" trailing"#).unwrap();
        assert_eq!(payload.number.as_deref(), Some("11987654321"));
        assert_eq!(payload.message.as_deref(), Some("hi"));
    }

    #[test]
    fn single_quotes_are_repaired() {
        let payload = parse_lenient("{'number':'11987654321','message':'ola'}").unwrap();
        assert_eq!(payload.number.as_deref(), Some("11987654321"));
        assert_eq!(payload.message.as_deref(), Some("ola"));
    }

    #[test]
    fn apostrophe_in_message_breaks_repair() {
        let err = parse_lenient(r#"{"number":"11987654321","message":"it's"}"#).unwrap_err();
        assert!(matches!(err, ApplicationError::MalformedPayload(_)));
    }

    #[test]
    fn escaped_newlines_become_line_breaks() {
        let payload =
            parse_lenient(r#"{"number":"11987654321","message":"line 1\\nline 2"}"#).unwrap();
        assert_eq!(payload.message.as_deref(), Some("line 1\nline 2"));
    }

    #[test]
    fn json_newline_escape_is_kept() {
        let payload = parse_lenient(r#"{"number":"11987654321","message":"a\nb"}"#).unwrap();
        assert_eq!(payload.message.as_deref(), Some("a\nb"));
    }

    #[test]
    fn numeric_number_is_rendered() {
        let payload = parse_lenient(r#"{"number":11987654321,"message":"hi"}"#).unwrap();
        assert_eq!(payload.number.as_deref(), Some("11987654321"));
    }

    #[test]
    fn numeric_message_skips_newline_repair() {
        let payload = parse_lenient(r#"{"number":"11987654321","message":42}"#).unwrap();
        assert_eq!(payload.message.as_deref(), Some("42"));
    }

    #[test]
    fn missing_fields_are_none() {
        let payload = parse_lenient(r#"{"other":1}"#).unwrap();
        assert_eq!(payload, TextPayload::default());
    }

    #[test]
    fn null_fields_are_none() {
        let payload = parse_lenient(r#"{"number":null,"message":null}"#).unwrap();
        assert!(payload.number.is_none());
        assert!(payload.message.is_none());
    }

    #[test]
    fn missing_opening_brace_fails() {
        let err = parse_lenient(r#""number":"1"}"#).unwrap_err();
        assert!(matches!(err, ApplicationError::MalformedPayload(_)));
    }

    #[test]
    fn missing_closing_brace_fails() {
        let err = parse_lenient(r#"{"number":"1""#).unwrap_err();
        assert!(matches!(err, ApplicationError::MalformedPayload(_)));
    }

    #[test]
    fn reversed_braces_fail() {
        let err = parse_lenient("} nothing here {").unwrap_err();
        let ApplicationError::MalformedPayload(msg) = err else {
            unreachable!("Expected MalformedPayload");
        };
        assert!(msg.contains("precedes"));
    }

    #[test]
    fn empty_body_fails() {
        assert!(matches!(
            parse_lenient(""),
            Err(ApplicationError::MalformedPayload(_))
        ));
    }

    #[test]
    fn invalid_content_between_braces_fails() {
        let err = parse_lenient("{number: 1}").unwrap_err();
        assert!(matches!(err, ApplicationError::MalformedPayload(_)));
    }

    #[test]
    fn structured_input_is_returned_unchanged() {
        let input = PayloadInput::Structured(json!({
            "number": "11987654321",
            "message": "it's fine\\n"
        }));
        let payload = parse_payload(input).unwrap();
        assert_eq!(payload.message.as_deref(), Some("it's fine\\n"));
    }

    #[test]
    fn raw_input_is_repaired() {
        let input = PayloadInput::Raw("x{'number':'11987654321','message':'hi'}x".to_string());
        let payload = parse_payload(input).unwrap();
        assert_eq!(payload.message.as_deref(), Some("hi"));
    }

    #[test]
    fn declared_json_object_is_structured() {
        let input = PayloadInput::from_body(r#"{"number":"1","message":"it's"}"#, true);
        assert!(matches!(input, PayloadInput::Structured(_)));
    }

    #[test]
    fn declared_json_that_fails_is_raw() {
        let input = PayloadInput::from_body("{'number':'1'}", true);
        assert!(matches!(input, PayloadInput::Raw(_)));
    }

    #[test]
    fn undeclared_body_is_raw() {
        let input = PayloadInput::from_body(r#"{"number":"1"}"#, false);
        assert!(matches!(input, PayloadInput::Raw(_)));
    }

    #[test]
    fn audio_payload_reads_camel_case_url() {
        let payload = AudioPayload::from_value(&json!({
            "number": 11_987_654_321_u64,
            "audioUrl": "https://cdn.example/a.ogg"
        }));
        assert_eq!(payload.number.as_deref(), Some("11987654321"));
        assert_eq!(payload.audio_url.as_deref(), Some("https://cdn.example/a.ogg"));
    }
}
