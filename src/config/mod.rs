//! Configuration loading and management.
//!
//! - [`types`]: Core config struct definitions (Config, ServerConfig, ListenConfig, LoggingConfig)
//! - [`limits`]: Mode and queue limits (LimitsConfig)
//! - [`oper`]: Operator blocks (OperBlock)
//! - [`validation`]: Startup validation

mod limits;
mod oper;
mod types;
pub mod validation;

pub use limits::LimitsConfig;
pub use oper::OperBlock;
pub use types::{
    ChannelsConfig, Config, ConfigError, ListenConfig, LogFormat, LoggingConfig, ModulesConfig,
    ServerConfig,
};
pub use validation::{ValidationError, validate};
