//! Change notification for model consumers.
//!
//! The registry lives inside the model's lock together with the tables.
//! Dispatch happens in two steps: [`ChangeNotifier::dispatch`] copies the
//! listener set while the lock is held, then [`Dispatch::notify_all`] runs
//! after the lock is released, so a listener may call straight back into the
//! model (typically to take a snapshot) without deadlocking.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::ModelReconstructor;

/// Error a listener may report. It is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Something that wants to know when the model changed.
pub trait ModelListener: Send + Sync {
    /// Called after a batch of mutations or a reset.
    fn on_model_changed(&self, model: &ModelReconstructor) -> Result<(), ListenerError>;
}

impl<F> ModelListener for F
where
    F: Fn(&ModelReconstructor) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_model_changed(&self, model: &ModelReconstructor) -> Result<(), ListenerError> {
        self(model)
    }
}

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

type Registered = (ListenerId, Arc<dyn ModelListener>);

/// Registry of model listeners, in registration order.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<Registered>,
    next_id: u64,
}

impl ChangeNotifier {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add_listener(&mut self, listener: Arc<dyn ModelListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Take a stable copy of the current listener set.
    pub fn dispatch(&self) -> Dispatch {
        Dispatch {
            listeners: self.listeners.clone(),
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// A copy of the listener set, ready to be notified outside the lock.
#[must_use = "a dispatch does nothing until notify_all is called"]
pub struct Dispatch {
    listeners: Vec<Registered>,
}

impl Dispatch {
    /// Number of listeners that will be called.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether there is nobody to notify.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Call every listener once, in registration order.
    ///
    /// Each call is isolated: an error or a panic in one listener is logged
    /// and the remaining listeners are still called. Returns the number of
    /// listeners that failed.
    pub fn notify_all(self, model: &ModelReconstructor) -> usize {
        let mut failed = 0;
        for (id, listener) in self.listeners {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener.on_model_changed(model)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::error!(%id, error = %e, "model listener failed");
                }
                Err(payload) => {
                    failed += 1;
                    tracing::error!(%id, panic = panic_message(payload.as_ref()), "model listener panicked");
                }
            }
        }
        failed
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
