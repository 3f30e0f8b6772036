//! The process-wide host target.
//!
//! The target starts from the values the process was configured with and is
//! overlaid by whatever an admin persisted at runtime. Writes go to the store
//! first and only then replace the in-memory copy, so readers never see a
//! value that was not persisted. Writers are serialized among themselves;
//! readers only wait for the swap, never for the store.

use std::sync::Arc;

use hostwake_core::{MacAddress, OsHint};
use hostwake_host::HostTarget;
use hostwake_store::{HostField, HostSettings};
use parking_lot::{Mutex, RwLock};

use crate::error::Result;

/// Holds the current host target and persists changes to it.
pub struct HostRegistry<S: HostSettings> {
    store: Arc<S>,
    target: RwLock<HostTarget>,
    writes: Mutex<()>,
}

impl<S: HostSettings> HostRegistry<S> {
    /// Load the target: `defaults` overlaid by persisted settings.
    ///
    /// A persisted value that no longer parses is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Store` if the settings cannot be read.
    pub fn load(store: Arc<S>, defaults: HostTarget) -> Result<Self> {
        let mut target = defaults;

        for (field, value) in store.list_host_settings()? {
            if let Err(e) = apply(&mut target, field, &value) {
                tracing::warn!(field = %field, error = %e, "Ignoring persisted host setting");
            }
        }

        tracing::info!(
            mac = ?target.mac,
            ip = ?target.ip,
            os = %target.os_hint,
            configured = target.is_configured(),
            "Loaded host target"
        );

        Ok(Self {
            store,
            target: RwLock::new(target),
            writes: Mutex::new(()),
        })
    }

    /// A snapshot of the current target.
    #[must_use]
    pub fn current(&self) -> HostTarget {
        self.target.read().clone()
    }

    /// Validate, persist and apply a new value for one field.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidInput` if the value does not parse, or
    /// `ControlError::Store` if it cannot be written. In both cases the
    /// in-memory target is unchanged.
    pub fn persist(&self, field: HostField, value: &str) -> Result<()> {
        let normalized = apply(&mut HostTarget::default(), field, value)?;

        let _writer = self.writes.lock();
        self.store.put_host_setting(field, &normalized)?;
        apply(&mut self.target.write(), field, &normalized)?;

        tracing::info!(field = %field, value = %normalized, "Persisted host setting");

        Ok(())
    }

    /// Persist a new MAC address.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Store` if it cannot be written.
    pub fn set_mac(&self, mac: MacAddress) -> Result<()> {
        self.persist(HostField::Mac, &mac.to_string())
    }
}

/// Apply one field to `target`, returning the normalized stored form.
fn apply(target: &mut HostTarget, field: HostField, value: &str) -> Result<String> {
    let value = value.trim();
    match field {
        HostField::Mac => {
            let mac: MacAddress = value.parse()?;
            target.mac = Some(mac);
            Ok(mac.to_string())
        }
        HostField::Ip => {
            target.ip = Some(value.to_string()).filter(|ip| !ip.is_empty());
            Ok(value.to_string())
        }
        HostField::SshUser => {
            target.ssh_user = Some(value.to_string()).filter(|user| !user.is_empty());
            Ok(value.to_string())
        }
        HostField::OsHint => {
            let os: OsHint = value.parse()?;
            target.os_hint = os;
            Ok(os.as_str().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;
    use hostwake_store::{RocksStore, StoreError};
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn defaults() -> HostTarget {
        HostTarget {
            mac: Some("11:22:33:44:55:66".parse().unwrap()),
            ip: Some("192.168.1.20".to_string()),
            ssh_user: Some("owner".to_string()),
            ssh_secret: Some("hunter2".to_string()),
            os_hint: OsHint::Windows,
        }
    }

    fn open(dir: &TempDir) -> Arc<RocksStore> {
        Arc::new(RocksStore::open(dir.path()).unwrap())
    }

    #[test]
    fn load_without_settings_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let registry = HostRegistry::load(open(&dir), defaults()).unwrap();
        assert_eq!(registry.current(), defaults());
    }

    #[test]
    fn persisted_settings_override_defaults() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.put_host_setting(HostField::Mac, "AA:BB:CC:DD:EE:FF").unwrap();
        store.put_host_setting(HostField::OsHint, "other").unwrap();

        let registry = HostRegistry::load(store, defaults()).unwrap();
        let target = registry.current();
        assert_eq!(target.mac.unwrap().to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(target.os_hint, OsHint::Other);
        assert_eq!(target.ip.as_deref(), Some("192.168.1.20"));
        assert_eq!(target.ssh_secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn broken_setting_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.put_host_setting(HostField::Mac, "not-a-mac").unwrap();

        let registry = HostRegistry::load(store, defaults()).unwrap();
        assert_eq!(registry.current().mac, defaults().mac);
    }

    #[test]
    fn set_mac_writes_through() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let registry = HostRegistry::load(Arc::clone(&store), defaults()).unwrap();

        registry.set_mac("aa-bb-cc-dd-ee-ff".parse().unwrap()).unwrap();

        assert_eq!(
            registry.current().mac.unwrap().to_string(),
            "AA:BB:CC:DD:EE:FF"
        );
        assert_eq!(
            store.get_host_setting(HostField::Mac).unwrap().as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );

        // A fresh load sees the persisted value
        drop(registry);
        let reloaded = HostRegistry::load(store, defaults()).unwrap();
        assert_eq!(
            reloaded.current().mac.unwrap().to_string(),
            "AA:BB:CC:DD:EE:FF"
        );
    }

    #[test]
    fn invalid_value_leaves_target_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let registry = HostRegistry::load(Arc::clone(&store), defaults()).unwrap();

        let result = registry.persist(HostField::Mac, "zz:zz");
        assert!(matches!(result, Err(ControlError::InvalidInput(_))));
        assert_eq!(registry.current(), defaults());
        assert_eq!(store.get_host_setting(HostField::Mac).unwrap(), None);
    }

    /// Settings store whose writes block until the test lets them finish.
    struct GatedSettings {
        started: Mutex<mpsc::Sender<()>>,
        proceed: Mutex<mpsc::Receiver<()>>,
        fail: bool,
    }

    impl HostSettings for GatedSettings {
        fn get_host_setting(&self, _field: HostField) -> hostwake_store::Result<Option<String>> {
            Ok(None)
        }

        fn put_host_setting(&self, _field: HostField, _value: &str) -> hostwake_store::Result<()> {
            self.started.lock().send(()).unwrap();
            self.proceed.lock().recv().unwrap();
            if self.fail {
                Err(StoreError::Database("disk full".to_string()))
            } else {
                Ok(())
            }
        }

        fn list_host_settings(&self) -> hostwake_store::Result<Vec<(HostField, String)>> {
            Ok(Vec::new())
        }
    }

    fn gated(fail: bool) -> (Arc<HostRegistry<GatedSettings>>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (proceed_tx, proceed_rx) = mpsc::channel();
        let store = Arc::new(GatedSettings {
            started: Mutex::new(started_tx),
            proceed: Mutex::new(proceed_rx),
            fail,
        });
        let registry = Arc::new(HostRegistry::load(store, defaults()).unwrap());
        (registry, started_rx, proceed_tx)
    }

    #[test]
    fn readers_are_not_blocked_by_store_writes() {
        let (registry, started, proceed) = gated(false);

        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.set_mac("aa:bb:cc:dd:ee:ff".parse().unwrap()))
        };

        started.recv().unwrap();
        assert!(registry.target.try_read().is_some());
        assert_eq!(registry.current(), defaults());

        proceed.send(()).unwrap();
        writer.join().unwrap().unwrap();
        assert_eq!(
            registry.current().mac.unwrap().to_string(),
            "AA:BB:CC:DD:EE:FF"
        );
    }

    #[test]
    fn failed_write_leaves_target_unchanged() {
        let (registry, started, proceed) = gated(true);

        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.set_mac("aa:bb:cc:dd:ee:ff".parse().unwrap()))
        };

        started.recv().unwrap();
        proceed.send(()).unwrap();
        let result = writer.join().unwrap();

        assert!(matches!(result, Err(ControlError::Store(_))));
        assert_eq!(registry.current(), defaults());
    }
}
