//! `RocksDB` storage layer for hostwake.
//!
//! This crate provides persistent storage for the operator directory and for
//! the host settings that can be changed at runtime, using `RocksDB` with one
//! column family per concern.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `users`: Operator records, keyed by normalized username
//! - `host_settings`: Runtime overrides of the host target, keyed by field name
//!
//! # Example
//!
//! ```no_run
//! use hostwake_core::{Role, Username};
//! use hostwake_store::{Directory, RocksStore};
//!
//! let store = RocksStore::open("/tmp/hostwake-db").unwrap();
//!
//! let alice = Username::parse("alice").unwrap();
//! store.put_user(&alice, Role::User).unwrap();
//! assert!(store.get_user(&alice).unwrap().is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{HostField, UserRecord};

use hostwake_core::{Role, Username};

/// The operator directory: username → role records.
///
/// Implementations enforce username uniqueness by keying on the normalized
/// username.
pub trait Directory: Send + Sync {
    /// Get an operator record by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, username: &Username) -> Result<Option<UserRecord>>;

    /// Insert or update an operator record.
    ///
    /// An existing record keeps its creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&self, username: &Username, role: Role) -> Result<UserRecord>;

    /// Delete an operator record.
    ///
    /// Deleting an absent record is not an error. Returns whether a record
    /// was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_user(&self, username: &Username) -> Result<bool>;

    /// List all operator records, ordered by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users(&self) -> Result<Vec<UserRecord>>;
}

/// Persisted overrides of the host target configuration.
pub trait HostSettings: Send + Sync {
    /// Get the persisted value of a host field, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_host_setting(&self, field: HostField) -> Result<Option<String>>;

    /// Persist a host field value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_host_setting(&self, field: HostField, value: &str) -> Result<()>;

    /// List all persisted host fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_host_settings(&self) -> Result<Vec<(HostField, String)>>;
}

/// Everything the conversation engine needs from storage.
pub trait Store: Directory + HostSettings {}

impl<T: Directory + HostSettings> Store for T {}
