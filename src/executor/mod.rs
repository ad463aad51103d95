//! # Executor - Action Program Interpreter
//!
//! Runs compiled action programs: a program is an ordered list of sequences,
//! a sequence an ordered list of block references.
//!
//! ## Core Principles
//!
//! 1. **Strictly sequential**: a block starts only after the previous one
//!    (sync or async) produced its result; sequences likewise
//! 2. **Shared templates, private copies**: blocks are cloned only when an
//!    override, a child result or a placeholder writes into them
//! 3. **Contained failures**: an error stops the sequence it happened in and
//!    is reported on the outcome, never panics the host
//! 4. **Cursor-driven control flow**: condition blocks redirect a `Cursor`
//!    instead of recursing

pub mod control;
pub mod dispatcher;
pub mod errors;
pub mod host;
pub mod hydrate;
pub mod operations;
pub mod operators;
pub mod program;
pub mod resolve;
pub mod sequence;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use errors::{ActionError, OperationError};
pub use host::{AsyncDispatch, MethodContext, MethodRegistry};
pub use operations::Operation;
pub use program::DispatchOutcome;
pub use resolve::resolve;
