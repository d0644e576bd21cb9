use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Observer invoked with `(device_id, location_id, probability)`.
pub type EventListener = Arc<dyn Fn(&str, &str, f64) + Send + Sync>;

/// Per-username observer lists. Nothing in the dispatcher fires events; the
/// hook exists for transports and embedders to wire up side effects.
#[derive(Clone, Default)]
pub struct EventNotifier {
    listeners: Arc<RwLock<HashMap<String, Vec<EventListener>>>>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, username: &str, listener: F)
    where
        F: Fn(&str, &str, f64) + Send + Sync + 'static,
    {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners
            .entry(username.to_string())
            .or_default()
            .push(Arc::new(listener));
    }

    /// Calls every listener for `username` in registration order, on the
    /// calling thread. The list is snapshotted first so listeners may
    /// register further listeners.
    pub fn fire(&self, username: &str, device_id: &str, location_id: &str, probability: f64) {
        tracing::info!(username, device_id, location_id, probability, "user event");

        let snapshot: Vec<EventListener> = {
            let listeners = self
                .listeners
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match listeners.get(username) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for listener in snapshot {
            listener(device_id, location_id, probability);
        }
    }

    pub fn listener_count(&self, username: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(username)
            .map_or(0, Vec::len)
    }
}
