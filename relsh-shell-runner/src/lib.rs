//! Command dispatch for release automation.
//!
//! A [`Dispatcher`] turns an [`Operation`] into work on a
//! [`ProcessCapability`]: a shell built-in, a generic command line or a
//! direct function call. Dry-run and verbosity come from a
//! [`PolicySource`](relsh_commons::PolicySource) consulted on every call,
//! and every result is normalized into `Result<Outcome, DispatchError>`.
//! [`Sequence`] chains dispatches with stop-on-first-failure semantics.

mod builtins;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod operation;
mod pipe;
pub mod recording;
pub mod sequence;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use executor::{
    Builtin, CapabilityFuture, CommandOutput, ProcessCapability, ShellKind, ShellProcess,
};
pub use operation::{DirectCall, Operation, Outcome, Strategy};
pub use recording::{RecordedCall, RecordedKind, RecordingProcess};
pub use sequence::Sequence;
