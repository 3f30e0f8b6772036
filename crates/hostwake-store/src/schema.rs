//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Operator records, keyed by normalized username.
    pub const USERS: &str = "users";

    /// Host target overrides, keyed by field name.
    pub const HOST_SETTINGS: &str = "host_settings";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::USERS, cf::HOST_SETTINGS]
}
