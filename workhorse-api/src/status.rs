//! Status rendering capability.
//!
//! Anything that can describe its current state as text implements
//! [`StatusProvider`]. Sinks (files, terminals) call it on demand and
//! decide what to do with the text.

/// Renders a point-in-time status snapshot.
pub trait StatusProvider: Send + Sync {
    /// Append the current status snapshot to `status`.
    fn update_status(&self, status: &mut String);

    /// Render the current status into a fresh string.
    fn render_status(&self) -> String {
        let mut status = String::new();
        self.update_status(&mut status);
        status
    }
}

impl<F> StatusProvider for F
where
    F: Fn(&mut String) + Send + Sync,
{
    fn update_status(&self, status: &mut String) {
        self(status)
    }
}
