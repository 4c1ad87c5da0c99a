//! User and channel modes.
//!
//! Descriptors live in a [`ModeRegistry`] so extensions can add letters at
//! runtime; [`Matrix::process_mode`](crate::state::Matrix::process_mode)
//! runs a request through parsing, validation, the mode hooks and
//! application.

mod change;
mod core_modes;
mod descriptor;
mod engine;
mod extban;
mod parse;
mod registry;

pub use change::{ChangeRecord, ModeChange};
pub use core_modes::register_core_modes;
pub use descriptor::{
    CORE_OWNER, HALFOP_RANK, ModeClass, ModeDescriptor, ModeTarget, OP_RANK, PrefixSpec,
    VOICE_RANK, Validator,
};
pub use engine::{ModeOutcome, ModeTargetRef, Rejection};
pub use extban::{ExtbanMatcher, ExtbanRegistry, canonicalize_mask, parse_extban};
pub use parse::{ParsedItem, list_query, parse_request};
pub use registry::ModeRegistry;
