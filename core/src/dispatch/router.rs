use std::any::Any;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use super::{DispatchOutcome, GameEvent};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    #[error("{0}")]
    Failed(String),
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Observer of processed events, called after routing in registration order
pub trait EventListener {
    fn name(&self) -> &str;
    fn on_event(&mut self, event: &GameEvent, outcome: &DispatchOutcome) -> Result<(), ListenerError>;
}

/// FIFO of pending events plus the listener registry.
/// Routing itself lives on the engine, which owns every collaborator it needs.
#[derive(Default)]
pub struct EventDispatchRouter {
    queue: VecDeque<GameEvent>,
    pub(crate) draining: bool,
    listeners: Vec<Box<dyn EventListener>>,
    listener_faults: u64,
    route_faults: u64,
    dispatched: u64,
}

impl std::fmt::Debug for EventDispatchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatchRouter")
            .field("queued", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .field("listener_faults", &self.listener_faults)
            .field("route_faults", &self.route_faults)
            .field("dispatched", &self.dispatched)
            .finish()
    }
}

impl EventDispatchRouter {
    pub fn register(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn enqueue(&mut self, event: GameEvent) {
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn listener_faults(&self) -> u64 {
        self.listener_faults
    }

    /// Panics caught while routing events or running deferred tasks
    pub fn route_faults(&self) -> u64 {
        self.route_faults
    }

    pub(crate) fn record_route_fault(&mut self, what: &str, payload: &(dyn Any + Send)) {
        self.route_faults += 1;
        tracing::error!(what, panic = %panic_message(payload), "collaborator panicked");
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Report a processed event to every listener. A failing or panicking
    /// listener is counted and logged; the rest still run.
    pub fn notify(&mut self, event: &GameEvent, outcome: &DispatchOutcome) {
        self.dispatched += 1;
        for listener in &mut self.listeners {
            let error = match catch_unwind(AssertUnwindSafe(|| listener.on_event(event, outcome))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(payload) => ListenerError::Panicked(panic_message(payload.as_ref())),
            };
            self.listener_faults += 1;
            tracing::error!(listener = listener.name(), event = event.name(), %error, "event listener failed");
        }
    }

    /// Drop queued events; listeners stay registered
    pub fn clear(&mut self) {
        self.queue.clear();
        self.draining = false;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
