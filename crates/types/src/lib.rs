/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input exceeded the permitted length after trimming
    #[error("Text exceeds maximum length of {max} characters")]
    TooLong { max: usize },

    /// The input contained control characters
    #[error("Text contains control characters")]
    ControlCharacters,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank input to `None`.
    ///
    /// Handy for optional free-text form fields where blank means "not supplied".
    pub fn optional(input: impl AsRef<str>) -> Option<Self> {
        Self::new(input).ok()
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque identifier of a remote resource (service request or appointment).
///
/// The Clinical Records API does not publish an id grammar, so this only guarantees what the
/// client relies on: the id is trimmed, non-empty, bounded in length and free of control
/// characters. It is percent-encoded when placed in a URL path, never interpolated raw.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(NonEmptyText);

impl ResourceId {
    /// Maximum accepted id length in characters.
    pub const MAX_LEN: usize = 256;

    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;

        if text.as_str().chars().count() > Self::MAX_LEN {
            return Err(TextError::TooLong { max: Self::MAX_LEN });
        }
        if text.as_str().chars().any(char::is_control) {
            return Err(TextError::ControlCharacters);
        }

        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::str::FromStr for ResourceId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_input() {
        let text = NonEmptyText::new("  SR-100 \n").expect("should accept padded input");
        assert_eq!(text.as_str(), "SR-100");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace_only() {
        assert_eq!(NonEmptyText::new("   \t").unwrap_err(), TextError::Empty);
        assert!(NonEmptyText::optional("").is_none());
    }

    #[test]
    fn test_resource_id_rejects_control_characters() {
        assert_eq!(
            ResourceId::new("SR\u{0}1").unwrap_err(),
            TextError::ControlCharacters
        );
    }

    #[test]
    fn test_resource_id_rejects_overlong_input() {
        let long = "x".repeat(ResourceId::MAX_LEN + 1);
        assert_eq!(
            ResourceId::new(long).unwrap_err(),
            TextError::TooLong {
                max: ResourceId::MAX_LEN
            }
        );
    }

    #[test]
    fn test_resource_id_deserialize_validates() {
        let id: ResourceId = serde_json::from_str("\" A-1 \"").expect("valid id");
        assert_eq!(id.as_str(), "A-1");

        let err = serde_json::from_str::<ResourceId>("\"  \"");
        assert!(err.is_err());
    }
}
