//! Safety monitors: global observers with hot/cold state.
//!
//! A monitor watches the program under test without participating in it. It
//! receives every broadcast event synchronously at the sending point, flips
//! between *cold* (nothing pending) and *hot* (an expected response is still
//! outstanding), and is never itself subject to scheduling choices. A
//! monitor left hot when every actor has halted is a liveness violation.

use crate::event::Event;

/// A global observer with a notion of hot (error-pending) vs cold state.
///
/// Implementations keep whatever state they need to track the property
/// being checked; the runtime only reads [`is_hot`](Self::is_hot) at
/// quiescence and delivers broadcasts through
/// [`on_event`](Self::on_event).
pub trait Monitor: Send + 'static {
    /// Name used in bug reports.
    fn name(&self) -> &str;

    /// Observes one broadcast event, synchronously with the send point.
    fn on_event(&mut self, event: &Event);

    /// True while the monitor is waiting for something that has not
    /// happened yet.
    fn is_hot(&self) -> bool;

    /// Explanation attached to the bug report when the monitor is hot at
    /// termination.
    fn hot_reason(&self) -> String {
        "monitor is in a hot state".to_string()
    }
}
