//! Lifecycle events for a run context.

use crate::error::RunError;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// A lifecycle event emitted by a run context.
///
/// Exactly one of `End` or `Error` fires per run; `Generator` events are
/// forwarded from the generator itself.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Generator execution is about to start.
    Run { namespace: String },
    /// The run succeeded; `dir` is the established working directory.
    End { dir: PathBuf },
    /// The run failed. The same `Arc` also rejects the promise view.
    Error { error: Arc<RunError> },
    /// Generator-specific event forwarded through the harness.
    Generator { name: String, data: Value },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::End { .. } | RunEvent::Error { .. })
    }
}

type Listener = Box<dyn FnMut(&RunEvent) + Send>;

/// Fan-out point for run events: synchronous callbacks plus channel
/// subscriptions, all fed from the same emission path.
pub(crate) struct EventBus {
    listeners: Vec<Listener>,
    subscribers: Vec<Sender<RunEvent>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn listen(&mut self, listener: impl FnMut(&RunEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn subscribe(&mut self) -> Receiver<RunEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    pub(crate) fn emit(&mut self, event: RunEvent) {
        tracing::trace!(?event, "emitting run event");
        for listener in &mut self.listeners {
            listener(&event);
        }
        // Dropped receivers fall out of the fan-out set.
        self.subscribers.retain(|s| s.send(event.clone()).is_ok());
    }
}
