//! In-process event dispatch.
//!
//! Producers `put` events onto a bounded queue and return immediately; one
//! dispatch task hands each event to every handler registered for its type,
//! finishing all handlers of one event before taking the next.

pub mod engine;
pub mod error;
pub mod event;

pub use engine::{EngineConfig, EngineStats, EventEngine, EventHandler};
pub use error::EngineError;
pub use event::Event;
