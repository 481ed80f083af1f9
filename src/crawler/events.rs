//! Observer surface of the engine
//!
//! Listeners are registered per event kind and invoked synchronously, in
//! registration order, from the engine's own task. Having no listener for a
//! kind changes nothing about how the engine behaves.

use crate::crawler::fetcher::Response;
use crate::state::{EngineState, FinalPayload, Resource};
use crate::{FetchError, PluginError};
use std::collections::HashMap;

/// Something the engine reports to its caller
#[derive(Debug)]
pub enum Event<'a> {
    /// A dispatch tick fired
    Interval { queued: usize, pending: usize },

    /// A fetched resource went through the plugin pipeline
    ResourceProcessed { resource: &'a Resource },

    /// A fetch failed at the transport level
    ResourceError {
        error: &'a FetchError,
        resource: &'a Resource,
    },

    /// One plugin failed for one resource
    PluginError {
        error: &'a PluginError,
        resource: &'a Resource,
        response: &'a Response,
    },

    /// The engine was paused
    Paused { state: &'a EngineState },

    /// The crawl reached quiescence
    End { payload: &'a FinalPayload },
}

/// Names the variants of [`Event`] for subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Interval,
    ResourceProcessed,
    ResourceError,
    PluginError,
    Paused,
    End,
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Interval { .. } => EventKind::Interval,
            Self::ResourceProcessed { .. } => EventKind::ResourceProcessed,
            Self::ResourceError { .. } => EventKind::ResourceError,
            Self::PluginError { .. } => EventKind::PluginError,
            Self::Paused { .. } => EventKind::Paused,
            Self::End { .. } => EventKind::End,
        }
    }
}

type Listener = Box<dyn Fn(&Event<'_>) + Send + Sync>;

/// Ordered listener lists per event kind
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F)
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    pub fn emit(&self, event: &Event<'_>) {
        if let Some(listeners) = self.listeners.get(&event.kind()) {
            for listener in listeners {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_listeners_run_in_order_for_their_kind_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = seen.clone();
        bus.subscribe(EventKind::Interval, move |_| first.lock().unwrap().push("first"));
        let second = seen.clone();
        bus.subscribe(EventKind::Interval, move |_| second.lock().unwrap().push("second"));
        let other = seen.clone();
        bus.subscribe(EventKind::End, move |_| other.lock().unwrap().push("end"));

        bus.emit(&Event::Interval {
            queued: 0,
            pending: 0,
        });

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(bus.listener_count(EventKind::Interval), 2);
        assert_eq!(bus.listener_count(EventKind::Paused), 0);
    }

    #[test]
    fn test_emit_without_listeners() {
        let bus = EventBus::new();
        let payload = FinalPayload::default();
        bus.emit(&Event::End { payload: &payload });
    }
}
