//! Identifier types for pixelmint.
//!
//! `UserId` wraps the opaque subject issued by the authentication provider.
//! `ImageId` is a ULID so that identifiers sort in creation order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use ulid::{Generator, Ulid};

/// Process-wide monotonic ULID source.
static IMAGE_ID_GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();

/// Maximum accepted length of a user identifier.
const MAX_USER_ID_LEN: usize = 255;

/// A user identifier issued by the authentication provider.
///
/// The value is opaque (for example `user_2NNEqL2nrIRdJ194ndJqAHwEfxC`) and is
/// only ever compared for equality. It is never persisted beyond a reference.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(IdError::EmptyUserId);
        }
        if s.len() > MAX_USER_ID_LEN {
            return Err(IdError::UserIdTooLong(s.len()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for UserId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// An image identifier using ULID for time-ordering.
///
/// Image IDs are time-ordered so that feeds can be served newest-first by
/// walking keys in reverse.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(Ulid);

impl ImageId {
    /// Create a new `ImageId` from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Generate a new `ImageId` with the current timestamp.
    ///
    /// IDs generated within one millisecond still sort in generation order.
    #[must_use]
    pub fn generate() -> Self {
        let generator = IMAGE_ID_GENERATOR.get_or_init(|| Mutex::new(Generator::new()));
        let ulid = generator
            .lock()
            .ok()
            .and_then(|mut g| g.generate().ok())
            .unwrap_or_else(Ulid::new);
        Self(ulid)
    }

    /// Return the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> &Ulid {
        &self.0
    }

    /// Return the bytes of the ULID (16 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }

    /// Create an `ImageId` from bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Ulid::from_bytes(bytes))
    }
}

impl FromStr for ImageId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ImageId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The user identifier is empty or whitespace.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// The user identifier exceeds the accepted length.
    #[error("user id is too long ({0} bytes)")]
    UserIdTooLong(usize),

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_provider_subjects() {
        let id: UserId = "user_2NNEqL2nrIRdJ194ndJqAHwEfxC".parse().unwrap();
        assert_eq!(id.as_str(), "user_2NNEqL2nrIRdJ194ndJqAHwEfxC");
        assert_eq!(id.to_string(), "user_2NNEqL2nrIRdJ194ndJqAHwEfxC");
    }

    #[test]
    fn user_id_rejects_blank() {
        assert_eq!("".parse::<UserId>(), Err(IdError::EmptyUserId));
        assert_eq!("   ".parse::<UserId>(), Err(IdError::EmptyUserId));
    }

    #[test]
    fn user_id_rejects_oversized() {
        let long = "u".repeat(256);
        assert_eq!(long.parse::<UserId>(), Err(IdError::UserIdTooLong(256)));
    }

    #[test]
    fn user_id_serde_json() {
        let id: UserId = "u1".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"u1\"");
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }

    #[test]
    fn image_id_roundtrip() {
        let id = ImageId::generate();
        let parsed = ImageId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(ImageId::from_bytes(id.to_bytes()), id);
    }

    #[test]
    fn generated_image_ids_are_strictly_increasing() {
        let ids: Vec<ImageId> = (0..1000).map(|_| ImageId::generate()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn image_id_rejects_garbage() {
        assert_eq!("not-a-ulid".parse::<ImageId>(), Err(IdError::InvalidUlid));
    }

    #[test]
    fn image_ids_sort_by_creation_time() {
        let earlier = ImageId::from_ulid(Ulid::from_parts(1_000, 99));
        let later = ImageId::from_ulid(Ulid::from_parts(2_000, 1));
        assert!(earlier < later);
        assert!(earlier.to_string() < later.to_string());
    }
}
