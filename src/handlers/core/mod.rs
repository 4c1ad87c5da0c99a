//! Core handler infrastructure: the handler trait, its context, and the
//! registry that routes commands through the hook pipeline.

pub mod context;
pub mod registry;

pub use context::{Context, Handler};
pub use registry::{CommandEntry, CommandRegistry, CommandSpec, HandlerPhase};
