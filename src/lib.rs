pub mod cli;
pub mod config;
pub mod executor;
pub mod store;
pub mod types;
pub mod validator;

// Re-export main types
pub use types::*;

// Re-export the dispatch API for convenience
pub use config::{Config, EngineConfig, SequenceErrorPolicy};
pub use executor::{ActionError, DispatchOutcome, Dispatcher, DispatcherBuilder};
pub use store::{ActionStore, MemoryValueStore, OverrideStore, ValueStore};
