//! Error types.
//!
//! Misuse that the typed API cannot rule out statically panics with a
//! descriptive message (see crate docs). The only probe-able failure is a
//! context read with no enclosing provider, surfaced through
//! [`Context::try_read`](crate::Context::try_read).

use thiserror::Error;

/// Failure to read an ambient context value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// No enclosing component provided a value for this context.
    #[error("no value provided for context id {id}; `provide` must run in an enclosing component before `read`")]
    Unbound {
        /// The unique id of the context that was read.
        id: u64,
    },

    /// The binding for this id holds a value of a different type.
    #[error("context id {id} is bound to a value of a different type")]
    TypeMismatch {
        /// The unique id of the context that was read.
        id: u64,
    },
}
