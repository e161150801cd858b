//! The model's three tables.
//!
//! - [`ConnectivityTable`]: device -> connection metadata, present only while
//!   the device is connected. Absence *is* the disconnected state.
//! - [`CompletionTable`]: (device, folder) -> completion percentage.
//! - [`FolderStateTable`]: folder -> last reported state.
//!
//! All three iterate in key order so snapshots compare and print stably.

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use syncwatch_types::{Completion, DeviceConnected, DeviceId, FolderId, FolderState};

/// A keyed table with last-write-wins upserts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table<K: Ord, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Table<K, V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or replace the value for `key`, returning the previous value.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Remove the value for `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.remove(key)
    }

    /// Look up the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key)
    }

    /// Look up the value for `key`, falling back to `default`.
    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: Clone,
    {
        self.entries.get(key).cloned().unwrap_or(default)
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord, V> Default for Table<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection metadata of a connected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityEntry {
    /// The connected device.
    pub device_id: DeviceId,
    /// Name the device announced.
    pub display_name: String,
    /// Remote address.
    pub address: String,
    /// Client software name.
    pub client_name: String,
    /// Client software version.
    pub client_version: String,
    /// Connection kind, e.g. "tcp-client".
    pub connection_kind: String,
}

impl From<DeviceConnected> for ConnectivityEntry {
    fn from(event: DeviceConnected) -> Self {
        Self {
            device_id: event.device_id,
            display_name: event.display_name,
            address: event.address,
            client_name: event.client_name,
            client_version: event.client_version,
            connection_kind: event.connection_kind,
        }
    }
}

/// Devices currently believed connected.
pub type ConnectivityTable = Table<DeviceId, ConnectivityEntry>;

/// Last reported state of each folder.
pub type FolderStateTable = Table<FolderId, FolderState>;

/// Completion of each folder on each device.
///
/// Rows are grouped by device so a disconnect can purge them in one step.
/// Anything not reported yet reads as [`Completion::FULL`]: the model assumes
/// synced until told otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompletionTable {
    devices: BTreeMap<DeviceId, BTreeMap<FolderId, Completion>>,
}

impl CompletionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the completion for `(device, folder)`.
    pub fn upsert(
        &mut self,
        device: DeviceId,
        folder: FolderId,
        completion: Completion,
    ) -> Option<Completion> {
        self.devices
            .entry(device)
            .or_default()
            .insert(folder, completion)
    }

    /// Remove the completion for `(device, folder)`.
    pub fn remove(&mut self, device: &DeviceId, folder: &FolderId) -> Option<Completion> {
        let folders = self.devices.get_mut(device)?;
        let removed = folders.remove(folder);
        if folders.is_empty() {
            self.devices.remove(device);
        }
        removed
    }

    /// Look up the completion for `(device, folder)`.
    pub fn get(&self, device: &DeviceId, folder: &FolderId) -> Option<Completion> {
        self.devices.get(device)?.get(folder).copied()
    }

    /// Look up the completion for `(device, folder)`, defaulting to 100.
    pub fn get_or_default(&self, device: &DeviceId, folder: &FolderId) -> Completion {
        self.get(device, folder).unwrap_or(Completion::FULL)
    }

    /// All `(device, folder)` keys in order.
    pub fn keys(&self) -> impl Iterator<Item = (&DeviceId, &FolderId)> {
        self.devices
            .iter()
            .flat_map(|(device, folders)| folders.keys().map(move |folder| (device, folder)))
    }

    /// Devices with at least one row.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.keys()
    }

    /// The rows of one device.
    pub fn folders<'a>(
        &'a self,
        device: &DeviceId,
    ) -> impl Iterator<Item = (&'a FolderId, Completion)> + 'a {
        self.devices
            .get(device)
            .into_iter()
            .flat_map(|folders| folders.iter().map(|(folder, c)| (folder, *c)))
    }

    /// Remove every row of `device`, returning how many were removed.
    pub fn remove_device(&mut self, device: &DeviceId) -> usize {
        self.devices
            .remove(device)
            .map(|folders| folders.len())
            .unwrap_or(0)
    }

    /// Mean completion over the device's folders, floored to a whole percent.
    ///
    /// A device with no tracked folders has nothing pending and reads as 100.
    pub fn device_completion(&self, device: &DeviceId) -> f64 {
        match self.devices.get(device) {
            Some(folders) if !folders.is_empty() => {
                let sum: f64 = folders.values().map(Completion::value).sum();
                (sum / folders.len() as f64).floor()
            }
            _ => Completion::FULL.value(),
        }
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.devices.values().map(BTreeMap::len).sum()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
