use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gridshell_types::{ShellEvent, Topic};
use tracing::warn;

/// Handle returned by `on`/`once`, used to unsubscribe.
pub type HandlerId = u64;

type Handler = Rc<RefCell<dyn FnMut(&ShellEvent) -> anyhow::Result<()>>>;

struct Entry {
    id: HandlerId,
    once: bool,
    handler: Handler,
}

/// Process-wide synchronous publish/subscribe hub.
///
/// Handlers for a topic run in registration order, on the emitter's stack.
/// A failing handler is logged and never stops the remaining handlers, nor
/// does its error reach the emitter. Emission dispatches to the handlers
/// registered at the moment it starts: a handler registered mid-emission
/// first runs on the next one.
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<Topic, Vec<Entry>>>,
    next_id: Cell<HandlerId>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `topic`. Returns the unsubscribe handle.
    pub fn on<F>(&self, topic: Topic, handler: F) -> HandlerId
    where
        F: FnMut(&ShellEvent) -> anyhow::Result<()> + 'static,
    {
        self.register(topic, handler, false)
    }

    /// Register a handler that unsubscribes itself after its first run.
    pub fn once<F>(&self, topic: Topic, handler: F) -> HandlerId
    where
        F: FnMut(&ShellEvent) -> anyhow::Result<()> + 'static,
    {
        self.register(topic, handler, true)
    }

    fn register<F>(&self, topic: Topic, handler: F, once: bool) -> HandlerId
    where
        F: FnMut(&ShellEvent) -> anyhow::Result<()> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let handler: Handler = Rc::new(RefCell::new(handler));
        self.handlers
            .borrow_mut()
            .entry(topic)
            .or_default()
            .push(Entry { id, once, handler });
        id
    }

    /// Remove one handler. Returns whether it was still registered.
    pub fn off(&self, topic: Topic, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.get_mut(&topic) {
            Some(entries) => {
                let before = entries.len();
                entries.retain(|e| e.id != id);
                entries.len() != before
            }
            None => false,
        }
    }

    /// Remove all handlers for one topic, or for every topic.
    pub fn clear(&self, topic: Option<Topic>) {
        let mut handlers = self.handlers.borrow_mut();
        match topic {
            Some(topic) => {
                handlers.remove(&topic);
            }
            None => handlers.clear(),
        }
    }

    /// Invoke every handler currently registered for the event's topic.
    pub fn emit(&self, event: &ShellEvent) {
        let topic = event.topic();
        let snapshot: Vec<(HandlerId, bool, Handler)> = {
            let handlers = self.handlers.borrow();
            match handlers.get(&topic) {
                Some(entries) => entries
                    .iter()
                    .map(|e| (e.id, e.once, e.handler.clone()))
                    .collect(),
                None => return,
            }
        };

        let mut fired_once: Vec<HandlerId> = Vec::new();
        for (id, once, handler) in snapshot {
            if once {
                fired_once.push(id);
            }
            if let Err(err) = (handler.borrow_mut())(event) {
                warn!(event = topic.as_str(), handler = id, "event handler failed: {err:#}");
            }
        }

        if !fired_once.is_empty() {
            let mut handlers = self.handlers.borrow_mut();
            if let Some(entries) = handlers.get_mut(&topic) {
                entries.retain(|e| !fired_once.contains(&e.id));
            }
        }
    }

    /// Number of live handlers for a topic.
    pub fn handler_count(&self, topic: Topic) -> usize {
        self.handlers
            .borrow()
            .get(&topic)
            .map_or(0, |entries| entries.len())
    }
}
