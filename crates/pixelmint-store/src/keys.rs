//! Key encoding for the `RocksDB` column families.
//!
//! User IDs are variable-length strings, so the author index prefixes them
//! with a big-endian `u16` length. That keeps `user_1` from being a prefix
//! of `user_10`.

use pixelmint_core::{ImageId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_str().as_bytes().to_vec()
}

/// Create an image key from an image ID.
#[must_use]
pub fn image_key(image_id: &ImageId) -> [u8; 16] {
    image_id.to_bytes()
}

/// Prefix shared by every index entry of one author.
#[must_use]
pub fn author_prefix(author_id: &UserId) -> Vec<u8> {
    let author = author_id.as_str().as_bytes();
    // User IDs are capped well below u16::MAX bytes.
    let len = u16::try_from(author.len()).unwrap_or(u16::MAX);

    let mut key = Vec::with_capacity(2 + author.len() + 16);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(author);
    key
}

/// Create an author index key.
///
/// Format: `len (2 bytes) || author_id || image_id (16 bytes)`
#[must_use]
pub fn author_image_key(author_id: &UserId, image_id: &ImageId) -> Vec<u8> {
    let mut key = author_prefix(author_id);
    key.extend_from_slice(&image_id.to_bytes());
    key
}

/// Extract the image ID from the tail of an author index key.
///
/// Returns `None` if the key is too short to hold one.
#[must_use]
pub fn image_id_from_author_key(key: &[u8]) -> Option<ImageId> {
    let tail = key.len().checked_sub(16)?;
    let bytes: [u8; 16] = key[tail..].try_into().ok()?;
    Some(ImageId::from_bytes(bytes))
}

/// Create a suggested-prompt key from its ID.
#[must_use]
pub fn prompt_key(id: i64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decode a suggested-prompt key.
#[must_use]
pub fn prompt_id(key: &[u8]) -> Option<i64> {
    key.try_into().ok().map(i64::from_be_bytes)
}
