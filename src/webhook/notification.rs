//! Normalized notification produced by a provider adapter.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A decoded webhook, renderable for humans.
///
/// The dispatch path only ever uses the `Display` rendering. Observers that
/// know a provider's concrete type can recover it with `downcast_ref`.
pub trait Notification: fmt::Display + fmt::Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl dyn Notification {
    /// Returns the concrete notification if it is a `T`.
    pub fn downcast_ref<T: Notification>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Shared handle passed to every observer of one delivery.
pub type SharedNotification = Arc<dyn Notification>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    impl fmt::Display for Ping {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "ping #{}", self.0)
        }
    }

    impl Notification for Ping {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct Pong;

    impl fmt::Display for Pong {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("pong")
        }
    }

    impl Notification for Pong {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_downcast_to_concrete_type() {
        let note: SharedNotification = Arc::new(Ping(7));
        assert_eq!(note.downcast_ref::<Ping>(), Some(&Ping(7)));
        assert!(note.downcast_ref::<Pong>().is_none());
    }

    #[test]
    fn test_display_through_trait_object() {
        let note: SharedNotification = Arc::new(Ping(3));
        assert_eq!(note.to_string(), "ping #3");
    }
}
