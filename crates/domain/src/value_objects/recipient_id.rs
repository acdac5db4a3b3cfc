//! Recipient id value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Minimum number of digits a recipient id must keep after normalization
pub const MIN_RECIPIENT_DIGITS: usize = 10;

/// A normalized WhatsApp recipient id (digits only, e.g. `11987654321`)
///
/// Normalization strips every non-digit character, so `(11) 98765-4321`
/// and `11987654321` are the same recipient. The country code is not part
/// of the id; gateways prefix it when addressing the contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipientId {
    value: String,
}

impl RecipientId {
    /// Normalize and validate a raw recipient id
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = raw.as_ref();
        let value: String = raw.chars().filter(char::is_ascii_digit).collect();

        if value.len() < MIN_RECIPIENT_DIGITS {
            return Err(DomainError::InvalidRecipient(format!(
                "'{raw}' has {} digits, at least {MIN_RECIPIENT_DIGITS} required",
                value.len()
            )));
        }

        Ok(Self { value })
    }

    /// Get the normalized digits
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for RecipientId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RecipientId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecipientId> for String {
    fn from(id: RecipientId) -> Self {
        id.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_digits_are_accepted() {
        let id = RecipientId::new("11987654321").unwrap();
        assert_eq!(id.as_str(), "11987654321");
    }

    #[test]
    fn formatting_characters_are_stripped() {
        let id = RecipientId::new("(11) 98765-4321").unwrap();
        assert_eq!(id.as_str(), "11987654321");
    }

    #[test]
    fn plus_prefix_is_stripped() {
        let id = RecipientId::new("+55 11 98765 4321").unwrap();
        assert_eq!(id.as_str(), "5511987654321");
    }

    #[test]
    fn exactly_ten_digits_is_accepted() {
        assert!(RecipientId::new("1198765432").is_ok());
    }

    #[test]
    fn nine_digits_is_rejected() {
        let err = RecipientId::new("119876543").unwrap_err();
        assert!(matches!(err, DomainError::InvalidRecipient(_)));
    }

    #[test]
    fn short_number_is_rejected() {
        assert!(RecipientId::new("123").is_err());
    }

    #[test]
    fn letters_only_is_rejected() {
        assert!(RecipientId::new("not-a-number").is_err());
    }

    #[test]
    fn empty_is_rejected() {
        assert!(RecipientId::new("").is_err());
    }

    #[test]
    fn display_format() {
        let id = RecipientId::new("11 98765 4321").unwrap();
        assert_eq!(id.to_string(), "11987654321");
    }

    #[test]
    fn try_from_str() {
        let id: RecipientId = "11987654321".try_into().unwrap();
        assert_eq!(id.as_str(), "11987654321");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = RecipientId::new("11987654321").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"11987654321\"");
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<RecipientId, _> = serde_json::from_str("\"11987654321\"");
        assert!(ok.is_ok());

        let err: Result<RecipientId, _> = serde_json::from_str("\"123\"");
        assert!(err.is_err());
    }
}
