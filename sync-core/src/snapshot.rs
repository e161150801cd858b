//! Point-in-time copies of the model.

use serde::Serialize;
use std::fmt;
use syncwatch_types::{Completion, DeviceId, EventId, FolderId, FolderState};

use crate::{CompletionTable, ConnectivityEntry, ConnectivityTable, FolderStateTable};

/// An immutable copy of the model's tables, validity and cursor.
///
/// Owns its data outright, so it can be read, iterated and sent across
/// threads without touching the model's lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    valid: bool,
    last_applied_id: Option<EventId>,
    connections: ConnectivityTable,
    completion: CompletionTable,
    folder_states: FolderStateTable,
}

impl Snapshot {
    pub(crate) fn new(
        valid: bool,
        last_applied_id: Option<EventId>,
        connections: ConnectivityTable,
        completion: CompletionTable,
        folder_states: FolderStateTable,
    ) -> Self {
        Self {
            valid,
            last_applied_id,
            connections,
            completion,
            folder_states,
        }
    }

    /// Whether the model was valid when the snapshot was taken.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether no event had been applied yet.
    pub fn is_initializing(&self) -> bool {
        self.last_applied_id.is_none()
    }

    /// The model's cursor at snapshot time.
    pub fn last_applied_id(&self) -> Option<EventId> {
        self.last_applied_id
    }

    /// Connected devices.
    pub fn connections(&self) -> &ConnectivityTable {
        &self.connections
    }

    /// Per-device, per-folder completion.
    pub fn completion(&self) -> &CompletionTable {
        &self.completion
    }

    /// Folder states.
    pub fn folder_states(&self) -> &FolderStateTable {
        &self.folder_states
    }

    /// Connection metadata of `device`, if it is connected.
    pub fn connection(&self, device: &DeviceId) -> Option<&ConnectivityEntry> {
        self.connections.get(device)
    }

    /// Whether `device` is connected.
    pub fn is_connected(&self, device: &DeviceId) -> bool {
        self.connections.contains_key(device)
    }

    /// Completion of `folder` on `device`, 100 if never reported.
    pub fn folder_completion(&self, device: &DeviceId, folder: &FolderId) -> Completion {
        self.completion.get_or_default(device, folder)
    }

    /// State of `folder`, if one was reported.
    pub fn folder_state(&self, folder: &FolderId) -> Option<&FolderState> {
        self.folder_states.get(folder)
    }

    /// Floored mean completion of `device` over its folders; 100 with none.
    pub fn device_completion(&self, device: &DeviceId) -> f64 {
        self.completion.device_completion(device)
    }

    /// Whether the tables match, ignoring validity and cursor.
    pub fn same_tables(&self, other: &Snapshot) -> bool {
        self.connections == other.connections
            && self.completion == other.completion
            && self.folder_states == other.folder_states
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if !self.valid {
            "INVALID (needs resync)"
        } else if self.is_initializing() {
            "initializing"
        } else {
            "valid"
        };
        write!(f, "Model: {}", status)?;
        if let Some(id) = self.last_applied_id {
            write!(f, " (last event: {})", id)?;
        }
        writeln!(f)?;

        writeln!(f, "Connected devices: {}", self.connections.len())?;
        for (device, entry) in self.connections.iter() {
            let name = if entry.display_name.is_empty() {
                device.as_str()
            } else {
                entry.display_name.as_str()
            };
            writeln!(
                f,
                "  {} [{}] {} {} ({}%)",
                name,
                device.short(),
                entry.address,
                entry.connection_kind,
                self.device_completion(device)
            )?;
        }

        writeln!(f, "Folder completion: {}", self.completion.len())?;
        for device in self.completion.devices() {
            for (folder, completion) in self.completion.folders(device) {
                write!(f, "  {} / {}: {}", device.short(), folder, completion)?;
                if completion.is_complete() {
                    write!(f, " (up to date)")?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "Folder states: {}", self.folder_states.len())?;
        for (folder, state) in self.folder_states.iter() {
            write!(f, "  {}: {}", folder, state)?;
            if state.is_busy() {
                write!(f, " (busy)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
