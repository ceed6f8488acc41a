//! Trigger dispatch: fan one payload out to an ordered handler list.
//!
//! A [`Trigger`] is how hosts wire game events (an item used, a scene
//! entered) to script-visible effects. Handlers run in registration
//! order and a handler returning [`ActionFlow::Stop`] consumes the
//! event, skipping everything registered after it.

use fabula_core::GameState;

use crate::action::{ActionFlow, Payload};

type HandlerFn = dyn Fn(&mut GameState, &Payload) -> ActionFlow;

/// An ordered list of named event handlers.
#[derive(Default)]
pub struct Trigger {
    handlers: Vec<(String, Box<HandlerFn>)>,
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("handlers", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl Trigger {
    /// Create an empty trigger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. Handlers run in registration order.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut GameState, &Payload) -> ActionFlow + 'static,
    ) {
        self.handlers.push((name.into(), Box::new(handler)));
    }

    /// Run the handlers against `payload` until one returns
    /// [`ActionFlow::Stop`].
    ///
    /// Returns the name of the handler that consumed the event, or
    /// `None` when every handler ran.
    pub fn dispatch(&self, state: &mut GameState, payload: &Payload) -> Option<&str> {
        for (name, handler) in &self.handlers {
            if handler(state, payload) == ActionFlow::Stop {
                return Some(name);
            }
        }
        None
    }

    /// Registered handler names, in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
