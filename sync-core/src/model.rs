//! The event-driven model of daemon activity.
//!
//! [`ModelReconstructor`] consumes the daemon's ordered event stream and keeps
//! a queryable picture of which devices are connected, how complete each
//! folder is on each device, and what state each folder is in.
//!
//! # Concurrency
//!
//! One ingestion thread calls [`apply`](ModelReconstructor::apply) serially;
//! any number of readers call [`snapshot`](ModelReconstructor::snapshot) and
//! [`is_valid`](ModelReconstructor::is_valid). Tables, cursor, validity flag
//! and listener registry share a single mutex. Listeners run after it is
//! released.
//!
//! # Validity
//!
//! ```text
//! Fresh --apply(ordered)--> Valid --apply(out of order)--> Invalid
//!   ^                                                        |
//!   +----------------------------- reset() -----------------+
//! ```
//!
//! Once invalid, `apply` is a no-op until `reset`. The caller then refetches
//! the daemon's full event history and replays it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use syncwatch_types::{
    DeviceConnected, DeviceDisconnected, DeviceId, EventId, EventPayload, EventRecord,
    FolderCompletion, FolderStateChanged,
};
use tracing::Level;

use crate::{
    ChangeNotifier, CompletionTable, ConnectivityTable, Dispatch, EventCursor, FolderStateTable,
    ListenerId, ModelConfig, ModelListener, OrderingViolation, Snapshot,
};

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event was accepted and the cursor moved to it.
    Applied {
        /// Whether any table was mutated.
        changed: bool,
    },
    /// The model was already invalid; nothing happened.
    Ignored,
    /// The event broke the ordering contract and invalidated the model.
    Invalidated(OrderingViolation),
}

impl ApplyOutcome {
    /// Whether a table was mutated.
    pub fn changed(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { changed: true })
    }
}

/// Summary of [`ModelReconstructor::apply_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Events accepted by the cursor.
    pub applied: usize,
    /// Accepted events that mutated a table.
    pub changed: usize,
    /// Events skipped because the model was invalid.
    pub ignored: usize,
    /// The violation that invalidated the model during this batch, if any.
    pub violation: Option<OrderingViolation>,
}

/// Reconstructs daemon state from its event stream.
pub struct ModelReconstructor {
    config: ModelConfig,
    inner: Mutex<ModelInner>,
}

struct ModelInner {
    cursor: EventCursor,
    valid: bool,
    connections: ConnectivityTable,
    completion: CompletionTable,
    folder_states: FolderStateTable,
    notifier: ChangeNotifier,
}

impl ModelReconstructor {
    /// Create an empty, valid model.
    pub fn new(config: ModelConfig) -> Self {
        let inner = ModelInner {
            cursor: EventCursor::new(config.ordering),
            valid: true,
            connections: ConnectivityTable::new(),
            completion: CompletionTable::new(),
            folder_states: FolderStateTable::new(),
            notifier: ChangeNotifier::new(),
        };
        Self {
            config,
            inner: Mutex::new(inner),
        }
    }

    /// The configuration this model was created with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Apply one event, then notify listeners if anything changed.
    ///
    /// Never fails: an out-of-order id invalidates the model (check
    /// [`is_valid`](Self::is_valid) or the returned outcome), and a payload the
    /// model cannot use is logged and skipped.
    pub fn apply(&self, event: EventRecord) -> ApplyOutcome {
        let (outcome, dispatch) = {
            let mut inner = self.lock();
            let outcome = inner.apply(&event);
            let dispatch = outcome.changed().then(|| inner.notifier.dispatch());
            (outcome, dispatch)
        };
        let applied = matches!(outcome, ApplyOutcome::Applied { .. });
        self.finish(applied, dispatch);
        outcome
    }

    /// Apply a batch of events in order under one lock acquisition.
    ///
    /// Listeners are notified at most once, after the whole batch. Events after
    /// an invalidation are counted as ignored.
    ///
    /// The batch is collected before the lock is taken, so a lazy iterator
    /// never runs while readers are waiting and may itself query the model.
    pub fn apply_batch<I>(&self, events: I) -> BatchOutcome
    where
        I: IntoIterator<Item = EventRecord>,
    {
        let events: Vec<EventRecord> = events.into_iter().collect();
        let (outcome, dispatch) = {
            let mut inner = self.lock();
            let mut outcome = BatchOutcome::default();
            for event in events {
                match inner.apply(&event) {
                    ApplyOutcome::Applied { changed } => {
                        outcome.applied += 1;
                        if changed {
                            outcome.changed += 1;
                        }
                    }
                    ApplyOutcome::Ignored => outcome.ignored += 1,
                    ApplyOutcome::Invalidated(violation) => {
                        outcome.ignored += 1;
                        outcome.violation = Some(violation);
                    }
                }
            }
            let dispatch = (outcome.changed > 0).then(|| inner.notifier.dispatch());
            (outcome, dispatch)
        };
        self.finish(outcome.applied > 0, dispatch);
        outcome
    }

    /// Clear every table, return the cursor to its sentinel and become valid.
    ///
    /// Listeners are notified so they drop whatever they were showing.
    pub fn reset(&self) {
        let dispatch = {
            let mut inner = self.lock();
            inner.clear();
            inner.notifier.dispatch()
        };
        tracing::info!("model reset, waiting for full event history");
        dispatch.notify_all(self);
    }

    /// Whether the model still reflects an unbroken event sequence.
    pub fn is_valid(&self) -> bool {
        self.lock().valid
    }

    /// Whether no event has been applied since creation or the last reset.
    pub fn is_initializing(&self) -> bool {
        self.lock().cursor.is_initial()
    }

    /// Id of the last applied event; `None` before the first one.
    pub fn last_applied_id(&self) -> Option<EventId> {
        self.lock().cursor.last()
    }

    /// Copy the current state out from under the lock.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        Snapshot::new(
            inner.valid,
            inner.cursor.last(),
            inner.connections.clone(),
            inner.completion.clone(),
            inner.folder_states.clone(),
        )
    }

    /// Floored mean completion of `device`; 100 when it has no tracked folders.
    pub fn device_completion(&self, device: &DeviceId) -> f64 {
        self.lock().completion.device_completion(device)
    }

    /// Register a listener for model changes.
    pub fn add_listener(&self, listener: Arc<dyn ModelListener>) -> ListenerId {
        self.lock().notifier.add_listener(listener)
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.lock().notifier.remove_listener(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().notifier.len()
    }

    fn lock(&self) -> MutexGuard<'_, ModelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Status dump after anything was applied, then change notification.
    fn finish(&self, applied: bool, dispatch: Option<Dispatch>) {
        if applied && self.config.log_status && tracing::enabled!(Level::DEBUG) {
            tracing::debug!("model status:\n{}", self.snapshot());
        }
        if let Some(dispatch) = dispatch {
            dispatch.notify_all(self);
        }
    }
}

impl Default for ModelReconstructor {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl std::fmt::Debug for ModelReconstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ModelReconstructor")
            .field("config", &self.config)
            .field("valid", &inner.valid)
            .field("cursor", &inner.cursor.last())
            .field("connections", &inner.connections.len())
            .field("completion", &inner.completion.len())
            .field("folder_states", &inner.folder_states.len())
            .field("notifier", &inner.notifier)
            .finish()
    }
}

impl ModelInner {
    fn apply(&mut self, event: &EventRecord) -> ApplyOutcome {
        if !self.valid {
            tracing::warn!(id = %event.id, "model is outdated, ignoring event until reset");
            return ApplyOutcome::Ignored;
        }
        if let Err(violation) = self.cursor.advance(event.id) {
            self.valid = false;
            tracing::warn!(%violation, "event ordering broken, model needs a full resync");
            return ApplyOutcome::Invalidated(violation);
        }

        tracing::trace!(id = %event.id, event_type = %event.event_type(), "processing event");
        let changed = match &event.payload {
            EventPayload::DeviceConnected(e) => self.device_connected(e),
            EventPayload::DeviceDisconnected(e) => self.device_disconnected(e),
            EventPayload::FolderCompletion(e) => self.folder_completion(e),
            EventPayload::FolderStateChanged(e) => self.folder_state_changed(e),
            EventPayload::Other { event_type, .. } => {
                tracing::debug!(id = %event.id, %event_type, "unhandled event");
                false
            }
            EventPayload::Malformed {
                event_type, reason, ..
            } => {
                tracing::warn!(
                    id = %event.id,
                    %event_type,
                    %reason,
                    "could not extract required information from event data"
                );
                false
            }
        };
        ApplyOutcome::Applied { changed }
    }

    fn device_connected(&mut self, event: &DeviceConnected) -> bool {
        self.connections
            .upsert(event.device_id.clone(), event.clone().into());
        true
    }

    fn device_disconnected(&mut self, event: &DeviceDisconnected) -> bool {
        let was_connected = self.connections.remove(&event.device_id).is_some();
        let purged = self.completion.remove_device(&event.device_id);
        was_connected || purged > 0
    }

    fn folder_completion(&mut self, event: &FolderCompletion) -> bool {
        self.completion.upsert(
            event.device_id.clone(),
            event.folder_id.clone(),
            event.completion,
        );
        true
    }

    fn folder_state_changed(&mut self, event: &FolderStateChanged) -> bool {
        self.folder_states
            .upsert(event.folder_id.clone(), event.to_state.clone());
        true
    }

    fn clear(&mut self) {
        self.connections.clear();
        self.completion.clear();
        self.folder_states.clear();
        self.cursor.reset();
        self.valid = true;
    }
}
