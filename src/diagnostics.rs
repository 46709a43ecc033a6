//! Caller-configured diagnostics channel
//!
//! Advisory conditions found while assembling scatterers (e.g. overlapping
//! spheres in a cluster) are not errors: the geometry is still well defined
//! through indicator priority. They are reported to an explicit sink owned
//! by the caller, so there is no process-wide warning state.

/// Collects advisory warnings from geometry routines.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// The warnings recorded so far, in order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
