//! Registration surface handed to [`Module::init`](super::Module::init).

use std::any::Any;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ModuleError;
use crate::extensible::{ExtItem, ExtensibleKind};
use crate::handlers::{CommandSpec, Handler};
use crate::hooks::{EventKind, Priority};
use crate::modes::{ExtbanMatcher, ModeDescriptor};
use crate::state::Matrix;

/// Everything registered through a context is recorded against the module
/// and released automatically when it unloads.
pub struct ModuleContext<'a> {
    module: String,
    matrix: &'a mut Matrix,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(module: &str, matrix: &'a mut Matrix) -> Self {
        Self {
            module: module.to_string(),
            matrix,
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    pub fn config(&self) -> &Config {
        &self.matrix.config
    }

    /// Direct access for modules that need to seed state at load time.
    pub fn matrix(&mut self) -> &mut Matrix {
        self.matrix
    }

    pub fn subscribe(&mut self, kind: EventKind, priority: Priority) {
        self.matrix.hooks.subscribe(&self.module, kind, priority);
    }

    pub fn register_ext<T: Any + Send + Sync>(
        &mut self,
        kind: ExtensibleKind,
        name: &str,
    ) -> Result<ExtItem<T>, ModuleError> {
        Ok(self.matrix.extensions.register(&self.module, kind, name)?)
    }

    pub fn register_ext_with_release<T, F>(
        &mut self,
        kind: ExtensibleKind,
        name: &str,
        release: F,
    ) -> Result<ExtItem<T>, ModuleError>
    where
        T: Any + Send + Sync,
        F: Fn(T) + Send + Sync + 'static,
    {
        Ok(self
            .matrix
            .extensions
            .register_with_release(&self.module, kind, name, release)?)
    }

    /// Add a mode letter owned by this module.
    pub fn add_mode(&mut self, mut desc: ModeDescriptor) -> Result<(), ModuleError> {
        desc.owner = self.module.clone();
        self.matrix.modes.register(desc)
    }

    pub fn add_extban(&mut self, letter: char, matcher: Arc<dyn ExtbanMatcher>) -> Result<(), ModuleError> {
        self.matrix.extbans.register(&self.module, letter, matcher)
    }

    pub fn add_command(
        &mut self,
        name: &str,
        handler: Arc<dyn Handler>,
        spec: CommandSpec,
    ) -> Result<(), ModuleError> {
        self.matrix.commands.register(&self.module, name, handler, spec)
    }
}
