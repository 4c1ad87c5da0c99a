//! Extensions shipped with the daemon.
//!
//! Each one exercises a different seam of the core: list modes and ban
//! checks, extension-store items and extbans, privilege overrides, and
//! message vetoes.

mod account;
mod ban_exception;
mod no_ctcp;
mod oper_override;

pub use account::Account;
pub use ban_exception::BanException;
pub use no_ctcp::NoCtcp;
pub use oper_override::OperOverride;

use super::Module;

/// Names accepted by [`create`].
pub const NAMES: &[&str] = &["account", "ban_exception", "no_ctcp", "oper_override"];

/// Instantiate a bundled module by name.
pub fn create(name: &str) -> Option<Box<dyn Module>> {
    let module: Box<dyn Module> = match name {
        "account" => Box::new(Account),
        "ban_exception" => Box::new(BanException),
        "no_ctcp" => Box::new(NoCtcp),
        "oper_override" => Box::new(OperOverride),
        _ => return None,
    };
    Some(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_creates_its_module() {
        for name in NAMES {
            let module = create(name).unwrap();
            assert_eq!(module.name(), *name);
        }
        assert!(create("nonexistent").is_none());
    }
}
