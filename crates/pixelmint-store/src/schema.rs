//! Column families used by the `RocksDB` backend.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Credit accounts, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Image records, keyed by `image_id` (ULID bytes, creation-ordered).
    pub const IMAGES: &str = "images";

    /// Index: images by author, keyed by `len(author) || author || image_id`.
    /// Value is empty.
    pub const IMAGES_BY_AUTHOR: &str = "images_by_author";

    /// Suggested prompts, keyed by big-endian `u64` ID.
    pub const SUGGESTED_PROMPTS: &str = "suggested_prompts";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> [&'static str; 4] {
    [
        cf::ACCOUNTS,
        cf::IMAGES,
        cf::IMAGES_BY_AUTHOR,
        cf::SUGGESTED_PROMPTS,
    ]
}
