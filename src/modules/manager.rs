//! Loading and unloading modules.

use std::sync::Arc;

use tracing::{info, warn};

use super::{Module, ModuleContext, ModuleEvent, bundled};
use crate::error::ModuleError;
use crate::metrics;
use crate::modes::ModeTarget;
use crate::state::Matrix;
use crate::telemetry::spans;

/// Live modules, in load order.
#[derive(Default)]
pub struct ModuleManager {
    loaded: Vec<(String, Arc<dyn Module>)>,
}

impl ModuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.loaded
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| Arc::clone(m))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaded.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.loaded.iter().map(|(n, _)| n.clone()).collect()
    }

    /// `(name, description)` pairs, in load order.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.loaded
            .iter()
            .map(|(n, m)| (n.clone(), m.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    fn insert(&mut self, name: String, module: Arc<dyn Module>) {
        self.loaded.push((name, module));
    }

    fn remove(&mut self, name: &str) -> Option<Arc<dyn Module>> {
        let idx = self.loaded.iter().position(|(n, _)| n == name)?;
        Some(self.loaded.remove(idx).1)
    }
}

impl Matrix {
    /// Initialise and activate `module`.
    pub fn load_module(&mut self, mut module: Box<dyn Module>) -> Result<(), ModuleError> {
        let name = module.name().to_string();
        let _span = spans::module(&name, "load").entered();
        if self.modules.contains(&name) {
            return Err(ModuleError::AlreadyLoaded(name));
        }

        let result = {
            let mut ctx = ModuleContext::new(&name, self);
            module.init(&mut ctx)
        };
        if let Err(e) = result {
            warn!(module = %name, error = %e, "Module init failed, rolling back");
            self.release_module(&name);
            return Err(e);
        }

        self.modules.insert(name.clone(), Arc::from(module));
        metrics::set_loaded_modules(self.modules.len());
        info!(module = %name, "Module loaded");
        self.fire_load_module(&ModuleEvent { name });
        Ok(())
    }

    /// Load one of the modules shipped with the daemon.
    pub fn load_bundled(&mut self, name: &str) -> Result<(), ModuleError> {
        let module = bundled::create(name).ok_or_else(|| ModuleError::UnknownModule(name.to_string()))?;
        self.load_module(module)
    }

    /// Unload `name` and release everything it registered.
    pub fn unload_module(&mut self, name: &str) -> Result<(), ModuleError> {
        let _span = spans::module(name, "unload").entered();
        let Some(module) = self.modules.get(name) else {
            return Err(ModuleError::NotLoaded(name.to_string()));
        };

        self.fire_unload_module(&ModuleEvent { name: name.to_string() });
        module.on_unload(self);
        self.modules.remove(name);
        self.release_module(name);

        metrics::set_loaded_modules(self.modules.len());
        info!(module = %name, "Module unloaded");
        Ok(())
    }

    /// Drop every registration owned by `owner`, and every piece of state
    /// that only made sense while it was loaded.
    fn release_module(&mut self, owner: &str) {
        let hooks = self.hooks.unsubscribe_all(owner);

        let ids = self.extensions.owned_by(owner);
        let mut purged = 0;
        if !ids.is_empty() {
            for user in self.users.values_mut() {
                purged += user.ext.purge(&ids, &self.extensions);
            }
            for chan in self.channels.values_mut() {
                purged += chan.ext.purge(&ids, &self.extensions);
                for member in chan.members.values_mut() {
                    purged += member.ext.purge(&ids, &self.extensions);
                }
            }
            purged += self.server.ext.purge(&ids, &self.extensions);
            self.extensions.unregister_owner(owner);
        }

        let modes = self.modes.unregister_owner(owner);
        for desc in &modes {
            match desc.target {
                ModeTarget::Channel => {
                    for chan in self.channels.values_mut() {
                        chan.modes.remove(&desc.letter);
                        chan.lists.remove(&desc.letter);
                        for member in chan.members.values_mut() {
                            member.prefixes.remove(&desc.letter);
                        }
                    }
                }
                ModeTarget::User => {
                    for user in self.users.values_mut() {
                        user.modes.remove(&desc.letter);
                    }
                }
            }
        }

        let extbans = self.extbans.unregister_owner(owner);
        let commands = self.commands.unregister_owner(owner);

        info!(
            module = %owner,
            hooks = hooks.len(),
            ext_items = ids.len(),
            ext_values = purged,
            modes = modes.len(),
            extbans = extbans.len(),
            commands = commands.len(),
            "Released module state"
        );
    }
}
