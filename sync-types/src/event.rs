//! Decoded daemon events.
//!
//! Every event the daemon emits becomes one [`EventRecord`]: its sequence id
//! plus a typed [`EventPayload`]. The payload set is closed. Types the model
//! does not track are carried as [`EventPayload::Other`], and a recognized
//! type whose data could not be extracted is [`EventPayload::Malformed`].

use std::fmt;

use crate::{Completion, DeviceId, EventId, FolderId, FolderState};

/// The kinds of event the model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A peer device connected.
    DeviceConnected,
    /// A peer device disconnected.
    DeviceDisconnected,
    /// A device's completion for a folder changed.
    FolderCompletion,
    /// A folder's state changed.
    FolderStateChanged,
    /// Anything else.
    Other,
}

impl EventType {
    /// Map a daemon type tag onto the model's event types.
    pub fn from_daemon(tag: &str) -> Self {
        match tag {
            "DeviceConnected" => EventType::DeviceConnected,
            "DeviceDisconnected" => EventType::DeviceDisconnected,
            "FolderCompletion" => EventType::FolderCompletion,
            "StateChanged" | "FolderStateChanged" => EventType::FolderStateChanged,
            _ => EventType::Other,
        }
    }

    /// Name of this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DeviceConnected => "DeviceConnected",
            EventType::DeviceDisconnected => "DeviceDisconnected",
            EventType::FolderCompletion => "FolderCompletion",
            EventType::FolderStateChanged => "FolderStateChanged",
            EventType::Other => "Other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A peer device connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConnected {
    /// The connected device
    pub device_id: DeviceId,
    /// Name the device announced for itself
    pub display_name: String,
    /// Remote address of the connection
    pub address: String,
    /// Client software name
    pub client_name: String,
    /// Client software version
    pub client_version: String,
    /// Connection kind, e.g. "tcp-client" or "relay-server"
    pub connection_kind: String,
}

impl DeviceConnected {
    /// A connection event carrying only the device id.
    pub fn new(device_id: impl Into<DeviceId>) -> Self {
        Self {
            device_id: device_id.into(),
            display_name: String::new(),
            address: String::new(),
            client_name: String::new(),
            client_version: String::new(),
            connection_kind: String::new(),
        }
    }

    /// Set the announced device name.
    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    /// Set the remote address.
    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }
}

/// A peer device disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDisconnected {
    /// The disconnected device
    pub device_id: DeviceId,
}

impl DeviceDisconnected {
    /// A disconnect event for the given device.
    pub fn new(device_id: impl Into<DeviceId>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }
}

/// A device's completion for one folder changed.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderCompletion {
    /// The remote device
    pub device_id: DeviceId,
    /// The shared folder
    pub folder_id: FolderId,
    /// How much of the folder the device has
    pub completion: Completion,
}

impl FolderCompletion {
    /// A completion event; the value is clamped into `[0, 100]`.
    ///
    /// Returns `None` for a non-finite value.
    pub fn new(
        device_id: impl Into<DeviceId>,
        folder_id: impl Into<FolderId>,
        completion: f64,
    ) -> Option<Self> {
        Some(Self {
            device_id: device_id.into(),
            folder_id: folder_id.into(),
            completion: Completion::clamped(completion)?,
        })
    }
}

/// A folder moved to a new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStateChanged {
    /// The folder
    pub folder_id: FolderId,
    /// State the folder moved to
    pub to_state: FolderState,
}

impl FolderStateChanged {
    /// A state change event.
    pub fn new(folder_id: impl Into<FolderId>, to_state: impl Into<FolderState>) -> Self {
        Self {
            folder_id: folder_id.into(),
            to_state: to_state.into(),
        }
    }
}

/// Type-specific content of an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A peer device connected
    DeviceConnected(DeviceConnected),
    /// A peer device disconnected
    DeviceDisconnected(DeviceDisconnected),
    /// A device's completion for a folder changed
    FolderCompletion(FolderCompletion),
    /// A folder's state changed
    FolderStateChanged(FolderStateChanged),
    /// An event type the model does not track
    Other {
        /// Daemon type tag
        event_type: String,
        /// Raw JSON of the event data
        raw: Vec<u8>,
    },
    /// A tracked event type whose data could not be extracted
    Malformed {
        /// The type the event claimed to be
        event_type: EventType,
        /// Raw JSON of the event data
        raw: Vec<u8>,
        /// Why extraction failed
        reason: String,
    },
}

impl EventPayload {
    /// The model-level type of this payload.
    ///
    /// Malformed payloads report the type they claimed to be.
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::DeviceConnected(_) => EventType::DeviceConnected,
            EventPayload::DeviceDisconnected(_) => EventType::DeviceDisconnected,
            EventPayload::FolderCompletion(_) => EventType::FolderCompletion,
            EventPayload::FolderStateChanged(_) => EventType::FolderStateChanged,
            EventPayload::Other { .. } => EventType::Other,
            EventPayload::Malformed { event_type, .. } => *event_type,
        }
    }

    /// An opaque payload for an untracked event type.
    pub fn other(event_type: &str) -> Self {
        EventPayload::Other {
            event_type: event_type.to_string(),
            raw: Vec::new(),
        }
    }
}

impl From<DeviceConnected> for EventPayload {
    fn from(payload: DeviceConnected) -> Self {
        EventPayload::DeviceConnected(payload)
    }
}

impl From<DeviceDisconnected> for EventPayload {
    fn from(payload: DeviceDisconnected) -> Self {
        EventPayload::DeviceDisconnected(payload)
    }
}

impl From<FolderCompletion> for EventPayload {
    fn from(payload: FolderCompletion) -> Self {
        EventPayload::FolderCompletion(payload)
    }
}

impl From<FolderStateChanged> for EventPayload {
    fn from(payload: FolderStateChanged) -> Self {
        EventPayload::FolderStateChanged(payload)
    }
}

/// One daemon event: its sequence id and decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Daemon-assigned sequence id
    pub id: EventId,
    /// Decoded content
    pub payload: EventPayload,
}

impl EventRecord {
    /// Create a record from an id and anything convertible to a payload.
    pub fn new(id: impl Into<EventId>, payload: impl Into<EventPayload>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }

    /// The model-level type of this event.
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}
