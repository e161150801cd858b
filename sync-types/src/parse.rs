//! Ingestion boundary: daemon event JSON into [`EventRecord`]s.
//!
//! The daemon's event endpoint returns a JSON array of envelopes:
//!
//! ```text
//! [{"id": 12, "globalID": 40, "type": "StateChanged", "time": "...",
//!   "data": {"folder": "default", "from": "idle", "to": "scanning"}}]
//! ```
//!
//! Payloads are decoded once, here. An envelope without a numeric id is an
//! error, since it cannot be ordered. Everything else still yields a record:
//! an envelope without a type is [`EventPayload::Other`] and payload problems
//! become [`EventPayload::Malformed`], so one bad event never hides the ones
//! after it.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Completion, DeviceConnected, DeviceDisconnected, EventError, EventId, EventPayload,
    EventRecord, EventType, FolderCompletion, FolderStateChanged,
};

/// Parse one batch returned by the daemon's event endpoint.
pub fn parse_batch(bytes: &[u8]) -> Result<Vec<EventRecord>, EventError> {
    let envelopes: Vec<Value> = serde_json::from_slice(bytes)?;
    envelopes.iter().map(parse_event).collect()
}

/// Parse a single event envelope.
pub fn parse_event(envelope: &Value) -> Result<EventRecord, EventError> {
    let id = envelope
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| EventError::InvalidEnvelope("missing or non-numeric id".into()))?;
    // A type-less event still occupies its place in the sequence.
    let tag = envelope.get("type").and_then(Value::as_str).unwrap_or_default();
    let data = envelope.get("data").unwrap_or(&Value::Null);

    let payload = match EventType::from_daemon(tag) {
        EventType::DeviceConnected => decode(EventType::DeviceConnected, data, device_connected),
        EventType::DeviceDisconnected => {
            decode(EventType::DeviceDisconnected, data, device_disconnected)
        }
        EventType::FolderCompletion => decode(EventType::FolderCompletion, data, folder_completion),
        EventType::FolderStateChanged => {
            decode(EventType::FolderStateChanged, data, folder_state_changed)
        }
        EventType::Other => EventPayload::Other {
            event_type: tag.to_string(),
            raw: raw_bytes(data),
        },
    };

    Ok(EventRecord::new(EventId::new(id), payload))
}

/// Decode `data` into its wire struct, then convert; any failure is Malformed.
fn decode<W, F>(event_type: EventType, data: &Value, convert: F) -> EventPayload
where
    W: DeserializeOwned,
    F: FnOnce(W) -> Result<EventPayload, String>,
{
    serde_json::from_value::<W>(data.clone())
        .map_err(|e| e.to_string())
        .and_then(convert)
        .unwrap_or_else(|reason| EventPayload::Malformed {
            event_type,
            raw: raw_bytes(data),
            reason,
        })
}

fn raw_bytes(data: &Value) -> Vec<u8> {
    serde_json::to_vec(data).unwrap_or_default()
}

fn non_empty(field: &str, value: String) -> Result<String, String> {
    if value.is_empty() {
        Err(format!("empty `{}`", field))
    } else {
        Ok(value)
    }
}

// Wire shapes of the tracked event types. Optional strings tolerate null.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDeviceConnected {
    id: String,
    #[serde(default)]
    device_name: Option<String>,
    #[serde(default)]
    addr: Option<String>,
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    client_version: Option<String>,
    #[serde(default, rename = "type")]
    connection_type: Option<String>,
}

#[derive(Deserialize)]
struct WireDeviceDisconnected {
    id: String,
}

#[derive(Deserialize)]
struct WireFolderCompletion {
    device: String,
    folder: String,
    completion: f64,
}

#[derive(Deserialize)]
struct WireStateChanged {
    folder: String,
    to: String,
}

fn device_connected(wire: WireDeviceConnected) -> Result<EventPayload, String> {
    Ok(EventPayload::DeviceConnected(DeviceConnected {
        device_id: non_empty("id", wire.id)?.into(),
        display_name: wire.device_name.unwrap_or_default(),
        address: wire.addr.unwrap_or_default(),
        client_name: wire.client_name.unwrap_or_default(),
        client_version: wire.client_version.unwrap_or_default(),
        connection_kind: wire.connection_type.unwrap_or_default(),
    }))
}

fn device_disconnected(wire: WireDeviceDisconnected) -> Result<EventPayload, String> {
    Ok(EventPayload::DeviceDisconnected(DeviceDisconnected::new(
        non_empty("id", wire.id)?,
    )))
}

fn folder_completion(wire: WireFolderCompletion) -> Result<EventPayload, String> {
    let completion = Completion::clamped(wire.completion)
        .ok_or_else(|| format!("non-finite completion {}", wire.completion))?;
    Ok(EventPayload::FolderCompletion(FolderCompletion {
        device_id: non_empty("device", wire.device)?.into(),
        folder_id: non_empty("folder", wire.folder)?.into(),
        completion,
    }))
}

fn folder_state_changed(wire: WireStateChanged) -> Result<EventPayload, String> {
    Ok(EventPayload::FolderStateChanged(FolderStateChanged::new(
        non_empty("folder", wire.folder)?,
        wire.to,
    )))
}
