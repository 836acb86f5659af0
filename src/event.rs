//! Immutable events delivered to actor inboxes.
//!
//! An event is a type identifier plus an optional payload. Events are
//! immutable once constructed and cheap to clone, so the runtime can hand
//! the same event to an actor and broadcast it to every monitor without
//! copying the payload.

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

/// An immutable message with a type identifier and optional payload.
///
/// Insertion order per inbox is preserved and significant (FIFO per actor).
#[derive(Clone)]
pub struct Event {
    kind: Cow<'static, str>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Event {
    /// Creates an event with no payload.
    #[must_use]
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    /// Creates an event carrying a payload.
    #[must_use]
    pub fn with_payload<T: Any + Send + Sync>(
        kind: impl Into<Cow<'static, str>>,
        payload: T,
    ) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(Arc::new(payload)),
        }
    }

    /// Returns the event's type identifier.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the payload downcast to `T`, if present and of that type.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload
            .as_deref()
            .and_then(|p| (p as &dyn Any).downcast_ref())
    }

    /// True if this event matches the given kind.
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_downcasts_to_original_type() {
        let event = Event::with_payload("ping", 42u64);
        assert_eq!(event.kind(), "ping");
        assert_eq!(event.payload::<u64>(), Some(&42));
        assert_eq!(event.payload::<String>(), None);
    }

    #[test]
    fn clone_shares_payload() {
        let event = Event::with_payload("data", vec![1u8, 2, 3]);
        let copy = event.clone();
        assert_eq!(copy.payload::<Vec<u8>>(), event.payload::<Vec<u8>>());
    }

    #[test]
    fn no_payload_event() {
        let event = Event::new("halt");
        assert!(event.is("halt"));
        assert_eq!(event.payload::<u64>(), None);
    }
}
