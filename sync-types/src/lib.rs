//! # syncwatch-types
//!
//! Event and identity types for the syncwatch event model.
//!
//! This crate provides the values that flow from the daemon's event stream
//! into the model engine:
//! - [`EventId`], [`DeviceId`], [`FolderId`] - Identity and ordering types
//! - [`Completion`], [`FolderState`] - Per-folder status values
//! - [`EventRecord`], [`EventPayload`] - One decoded daemon event
//! - [`parse_batch`], [`parse_event`] - The ingestion boundary for daemon JSON
//! - [`EventError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod event;
mod folder;
mod ids;
mod parse;

pub use error::EventError;
pub use event::{
    DeviceConnected, DeviceDisconnected, EventPayload, EventRecord, EventType, FolderCompletion,
    FolderStateChanged,
};
pub use folder::{Completion, FolderState};
pub use ids::{DeviceId, EventId, FolderId};
pub use parse::{parse_batch, parse_event};
