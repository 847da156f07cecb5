use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::models::{DispatchEntity, DriverLocation, DriverRecord, NotificationRecord, NotifiedMarker};
use crate::services::store::{DocumentStore, StoreError};

/// Seed data for a memory-backed store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemorySeed {
    #[serde(default)]
    pub drivers: Vec<DriverRecord>,
    /// Raw location documents keyed by driver id; invalid entries are skipped
    #[serde(default)]
    pub locations: HashMap<String, Value>,
}

/// In-process document store
///
/// Backs local development runs and the test suite. Individual operations
/// can be made to fail to exercise the error paths.
#[derive(Default)]
pub struct MemoryStore {
    drivers: RwLock<BTreeMap<String, DriverRecord>>,
    locations: RwLock<HashMap<String, DriverLocation>>,
    notifications: RwLock<HashMap<String, Vec<NotificationRecord>>>,
    markers: RwLock<HashMap<DispatchEntity, Vec<NotifiedMarker>>>,
    fail_reads: AtomicBool,
    fail_notification_writes: AtomicBool,
    fail_marker_writes: AtomicBool,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: MemorySeed) -> Self {
        let store = Self::new();

        for driver in seed.drivers {
            store.insert_driver(driver);
        }

        for (driver_id, raw) in seed.locations {
            match serde_json::from_value::<DriverLocation>(raw) {
                Ok(location) => store.insert_location(&driver_id, location),
                Err(e) => tracing::warn!("Skipping invalid seed location for {}: {}", driver_id, e),
            }
        }

        store
    }

    /// Load a JSON seed file of the form `{"drivers": [...], "locations": {...}}`
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Unavailable(format!("cannot read seed file {}: {}", path.display(), e))
        })?;
        let seed: MemorySeed = serde_json::from_str(&contents).map_err(|e| {
            StoreError::InvalidResponse(format!("invalid seed file {}: {}", path.display(), e))
        })?;

        let store = Self::from_seed(seed);
        tracing::info!(
            "Loaded {} drivers and {} locations from {}",
            read(&store.drivers).len(),
            read(&store.locations).len(),
            path.display()
        );
        Ok(store)
    }

    pub fn insert_driver(&self, driver: DriverRecord) {
        write(&self.drivers).insert(driver.id.clone(), driver);
    }

    pub fn insert_location(&self, driver_id: &str, location: DriverLocation) {
        write(&self.locations).insert(driver_id.to_string(), location);
    }

    pub fn remove_location(&self, driver_id: &str) -> Option<DriverLocation> {
        write(&self.locations).remove(driver_id)
    }

    /// Notification log of one driver, oldest first
    pub fn notifications_for(&self, driver_id: &str) -> Vec<NotificationRecord> {
        read(&self.notifications)
            .get(driver_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn notified_drivers(&self, entity: &DispatchEntity) -> Vec<NotifiedMarker> {
        read(&self.markers).get(entity).cloned().unwrap_or_default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_notification_writes(&self, fail: bool) {
        self.fail_notification_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_marker_writes(&self, fail: bool) {
        self.fail_marker_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool, operation: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{} failed (injected)", operation)))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn list_drivers(&self) -> Result<Vec<DriverRecord>, StoreError> {
        self.check(&self.fail_reads, "list_drivers")?;
        Ok(read(&self.drivers).values().cloned().collect())
    }

    async fn list_locations(&self) -> Result<HashMap<String, DriverLocation>, StoreError> {
        self.check(&self.fail_reads, "list_locations")?;
        Ok(read(&self.locations).clone())
    }

    async fn get_driver(&self, driver_id: &str) -> Result<Option<DriverRecord>, StoreError> {
        self.check(&self.fail_reads, "get_driver")?;
        Ok(read(&self.drivers).get(driver_id).cloned())
    }

    async fn append_notification(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        self.check(&self.fail_notification_writes, "append_notification")?;
        write(&self.notifications)
            .entry(record.driver_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn record_notified_marker(
        &self,
        entity: &DispatchEntity,
        marker: &NotifiedMarker,
    ) -> Result<bool, StoreError> {
        self.check(&self.fail_marker_writes, "record_notified_marker")?;
        let mut markers = write(&self.markers);
        let entries = markers.entry(entity.clone()).or_default();

        if entries.iter().any(|m| m.driver_id == marker.driver_id) {
            return Ok(false);
        }
        entries.push(marker.clone());
        Ok(true)
    }
}
