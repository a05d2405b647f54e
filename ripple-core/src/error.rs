//! Error Types
//!
//! The engine itself never fails: every error seen by a caller originates in a
//! user-supplied callback and is propagated unchanged to whoever triggered the
//! run (an `effect()` call, a `Signal::set`, a memo constructor, or a batch
//! settle pass).

use thiserror::Error;

/// Boxed error raised by a callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used by every reactive callback and by the operations that
/// may run one.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

/// A failure raised inside a reactive computation.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// An ad-hoc failure with a message.
    #[error("{0}")]
    Message(String),

    /// Any other error raised by a callback.
    #[error(transparent)]
    Callback(#[from] BoxError),
}

impl ReactiveError {
    /// Build a failure from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap an arbitrary error raised by a callback.
    pub fn callback<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Callback(Box::new(error))
    }

    /// Borrow the wrapped callback error as a concrete type, if it is one.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Message(_) => None,
            Self::Callback(inner) => inner.downcast_ref::<E>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Boom(u32);

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom {}", self.0)
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn message_displays_verbatim() {
        let err = ReactiveError::msg("effect failed");
        assert_eq!(err.to_string(), "effect failed");
        assert!(err.downcast_ref::<Boom>().is_none());
    }

    #[test]
    fn callback_error_is_transparent() {
        let err = ReactiveError::callback(Boom(7));
        assert_eq!(err.to_string(), "boom 7");
        assert_eq!(err.downcast_ref::<Boom>().map(|b| b.0), Some(7));
    }

    #[test]
    fn boxed_errors_convert() {
        let boxed: BoxError = "bad value".into();
        let err: ReactiveError = boxed.into();
        assert_eq!(err.to_string(), "bad value");
    }
}
