//! Generated image records and prompt validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ImageId, UserId};

/// Maximum prompt length, counted in characters.
pub const MAX_PROMPT_CHARS: usize = 500;

/// A validated text-to-image prompt (1 to [`MAX_PROMPT_CHARS`] characters).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prompt(String);

impl Prompt {
    /// Validate and wrap prompt text.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::Empty` for an empty string and
    /// `PromptError::TooLong` when the text exceeds [`MAX_PROMPT_CHARS`].
    pub fn parse(text: impl Into<String>) -> Result<Self, PromptError> {
        let text = text.into();
        let len = text.chars().count();
        if len == 0 {
            return Err(PromptError::Empty);
        }
        if len > MAX_PROMPT_CHARS {
            return Err(PromptError::TooLong { len });
        }
        Ok(Self(text))
    }

    /// Return the prompt text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prompt({:?})", self.0)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Prompt {
    type Error = PromptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Prompt> for String {
    fn from(prompt: Prompt) -> Self {
        prompt.0
    }
}

/// Prompt validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    /// The prompt was empty.
    #[error("Prompt cannot be empty")]
    Empty,

    /// The prompt exceeded the length limit.
    #[error("Prompt cannot exceed 500 characters (got {len})")]
    TooLong {
        /// Actual length in characters.
        len: usize,
    },
}

/// A generated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image ID (ULID, creation-ordered).
    pub id: ImageId,

    /// The user who generated the image.
    pub author_id: UserId,

    /// Prompt the image was generated from.
    pub prompt: Prompt,

    /// Where the image can be fetched.
    pub url: String,

    /// Insert time. Never changes after creation.
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// Create a new image record stamped with the current time.
    #[must_use]
    pub fn new(author_id: UserId, prompt: Prompt, url: impl Into<String>) -> Self {
        Self {
            id: ImageId::generate(),
            author_id,
            prompt,
            url: url.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_bounds() {
        assert_eq!(Prompt::parse(""), Err(PromptError::Empty));
        assert!(Prompt::parse("a").is_ok());
        assert!(Prompt::parse("a".repeat(500)).is_ok());
        assert_eq!(
            Prompt::parse("a".repeat(501)),
            Err(PromptError::TooLong { len: 501 })
        );
    }

    #[test]
    fn prompt_counts_characters_not_bytes() {
        // 500 two-byte characters is still within the limit.
        assert!(Prompt::parse("é".repeat(500)).is_ok());
    }

    #[test]
    fn prompt_keeps_whitespace() {
        let prompt = Prompt::parse(" a red bicycle ").unwrap();
        assert_eq!(prompt.as_str(), " a red bicycle ");
    }

    #[test]
    fn prompt_deserialization_validates() {
        assert!(serde_json::from_str::<Prompt>("\"\"").is_err());
        let prompt: Prompt = serde_json::from_str("\"a red bicycle\"").unwrap();
        assert_eq!(prompt.as_str(), "a red bicycle");
    }

    #[test]
    fn image_serializes_flat() {
        let image = Image::new(
            "u1".parse().unwrap(),
            Prompt::parse("a red bicycle").unwrap(),
            "https://cdn.example.com/1.png",
        );
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["author_id"], "u1");
        assert_eq!(json["prompt"], "a red bicycle");
        assert_eq!(json["id"], image.id.to_string());
    }
}
