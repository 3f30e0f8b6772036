//! Key encoding utilities for `RocksDB`.
//!
//! Usernames are stored as their normalized UTF-8 bytes so that a forward
//! iteration over the `users` column family yields records in username order.

use hostwake_core::Username;

use crate::types::HostField;

/// Encode a user key (the normalized username bytes).
#[must_use]
pub fn user_key(username: &Username) -> Vec<u8> {
    username.as_bytes().to_vec()
}

/// Encode a host setting key (the field name bytes).
#[must_use]
pub fn host_setting_key(field: HostField) -> Vec<u8> {
    field.as_str().as_bytes().to_vec()
}

/// Decode a host setting key back into its field.
///
/// Returns `None` for keys written by a newer schema.
#[must_use]
pub fn host_field_from_key(key: &[u8]) -> Option<HostField> {
    std::str::from_utf8(key).ok()?.parse().ok()
}
