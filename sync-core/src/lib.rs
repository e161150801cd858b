//! # syncwatch-core
//!
//! Event-stream state reconstruction for syncwatch.
//!
//! This crate turns the daemon's ordered event stream into a consistent,
//! queryable model of connected devices, per-folder completion and folder
//! states. It fetches nothing itself: an ingestion loop feeds it
//! [`EventRecord`](syncwatch_types::EventRecord)s in daemon order.
//!
//! ## Design Philosophy
//!
//! The model is a reactive state machine with no timers, threads or I/O:
//! - Ordering violations invalidate the model instead of corrupting it
//! - Malformed payloads are skipped without losing track of later events
//! - Readers take immutable [`Snapshot`]s and never see a half-applied event
//!
//! ```ignore
//! let model = Arc::new(ModelReconstructor::new(ModelConfig::default()));
//! for batch in daemon_batches {
//!     model.apply_batch(syncwatch_types::parse_batch(&batch)?);
//!     if !model.is_valid() {
//!         model.reset();
//!         // refetch the full event history before applying more
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cursor;
pub mod model;
pub mod notifier;
pub mod snapshot;
pub mod table;

pub use config::ModelConfig;
pub use cursor::{EventCursor, OrderingPolicy, OrderingViolation};
pub use model::{ApplyOutcome, BatchOutcome, ModelReconstructor};
pub use notifier::{ChangeNotifier, Dispatch, ListenerError, ListenerId, ModelListener};
pub use snapshot::Snapshot;
pub use table::{
    CompletionTable, ConnectivityEntry, ConnectivityTable, FolderStateTable, Table,
};
