//! Progress notification hook threaded through the lock manager and runner.
//!
//! The engine never prints directly; it calls into a caller-supplied
//! [`Notify`] so a CLI can render progress lines while tests can capture
//! them for assertions. The default implementation logs through `tracing`,
//! matching how the rest of this crate and its teacher emit progress.

use std::sync::{Arc, Mutex};

pub trait Notify: Send + Sync {
    fn message(&self, msg: &str);
}

/// Default sink: forwards every message to `tracing::info!`.
pub struct TracingNotify;

impl Notify for TracingNotify {
    fn message(&self, msg: &str) {
        tracing::info!("{msg}");
    }
}

/// Test/CLI-table sink that collects messages in order for inspection.
#[derive(Default, Clone)]
pub struct CollectingNotify {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingNotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notify for CollectingNotify {
    fn message(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
    }
}
