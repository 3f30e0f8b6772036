//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Directory`
//! and `HostSettings` traits.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use hostwake_core::{Role, Username};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{HostField, UserRecord};
use crate::{Directory, HostSettings};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::MissingColumnFamily(name.to_string()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Directory for RocksStore {
    fn get_user(&self, username: &Username) -> Result<Option<UserRecord>> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(username);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_user(&self, username: &Username, role: Role) -> Result<UserRecord> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(username);
        let now = Utc::now();

        let record = match self.get_user(username)? {
            Some(existing) => UserRecord {
                role,
                updated_at: now,
                ..existing
            },
            None => UserRecord {
                username: username.clone(),
                role,
                created_at: now,
                updated_at: now,
            },
        };

        let value = Self::serialize(&record)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(username = %username, role = %role, "Stored user record");

        Ok(record)
    }

    fn delete_user(&self, username: &Username) -> Result<bool> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(username);

        let existed = self
            .db
            .get_cf(&cf, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        if existed {
            self.db
                .delete_cf(&cf, &key)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            tracing::debug!(username = %username, "Deleted user record");
        }

        Ok(existed)
    }

    fn list_users(&self) -> Result<Vec<UserRecord>> {
        let cf = self.cf(cf::USERS)?;

        let mut users = Vec::new();
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);

        for item in iter {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let user: UserRecord = Self::deserialize(&value)?;
            users.push(user);
        }

        Ok(users)
    }
}

impl HostSettings for RocksStore {
    fn get_host_setting(&self, field: HostField) -> Result<Option<String>> {
        let cf = self.cf(cf::HOST_SETTINGS)?;
        let key = keys::host_setting_key(field);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_host_setting(&self, field: HostField, value: &str) -> Result<()> {
        let cf = self.cf(cf::HOST_SETTINGS)?;
        let key = keys::host_setting_key(field);
        let value = Self::serialize(&value)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(field = %field, "Persisted host setting");

        Ok(())
    }

    fn list_host_settings(&self) -> Result<Vec<(HostField, String)>> {
        let cf = self.cf(cf::HOST_SETTINGS)?;

        let mut settings = Vec::new();
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);

        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            let Some(field) = keys::host_field_from_key(&key) else {
                tracing::warn!(key = ?key, "Skipping unknown host setting");
                continue;
            };
            settings.push((field, Self::deserialize(&value)?));
        }

        Ok(settings)
    }
}
