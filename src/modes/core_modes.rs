//! Modes the daemon provides without any extension loaded.

use super::descriptor::{
    HALFOP_RANK, ModeDescriptor, ModeTarget, OP_RANK, PrefixSpec, VOICE_RANK,
};
use super::registry::ModeRegistry;
use crate::config::Config;
use crate::error::ModuleError;

const MAX_KEY_LEN: usize = 32;

fn validate_key(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err("key must not be empty".into());
    }
    if raw.contains([' ', ',', ':']) {
        return Err("key contains a forbidden character".into());
    }
    Ok(raw.chars().take(MAX_KEY_LEN).collect())
}

fn validate_limit(raw: &str) -> Result<String, String> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n.to_string()),
        _ => Err("limit must be a positive integer".into()),
    }
}

/// Register the built-in channel and user modes.
pub fn register_core_modes(registry: &mut ModeRegistry, config: &Config) -> Result<(), ModuleError> {
    registry.register(ModeDescriptor::list('b'))?;
    for letter in ['i', 'm', 'n', 'p', 's', 't'] {
        registry.register(ModeDescriptor::simple(letter, ModeTarget::Channel))?;
    }
    registry.register(ModeDescriptor::param('k', true).with_validator(validate_key))?;
    registry.register(ModeDescriptor::param('l', false).with_validator(validate_limit))?;

    registry.register(ModeDescriptor::prefix('o', PrefixSpec::new(OP_RANK, '@')))?;
    if config.channels.halfop {
        registry.register(ModeDescriptor::prefix(
            'h',
            PrefixSpec::new(HALFOP_RANK, '%').rank_to_set(OP_RANK),
        ))?;
    }
    registry.register(ModeDescriptor::prefix(
        'v',
        PrefixSpec::new(VOICE_RANK, '+')
            .rank_to_set(HALFOP_RANK)
            .self_removable(),
    ))?;

    registry.register(ModeDescriptor::simple('i', ModeTarget::User))?;
    registry.register(ModeDescriptor::simple('w', ModeTarget::User))?;
    registry.register(ModeDescriptor::simple('o', ModeTarget::User).oper_only())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_table() {
        let mut r = ModeRegistry::new();
        register_core_modes(&mut r, &Config::default()).unwrap();
        assert_eq!(r.isupport_prefix(), "(ohv)@%+");
        assert_eq!(r.isupport_chanmodes(), "b,k,l,imnpst");
        assert_eq!(r.letters().0, "iow");
    }

    #[test]
    fn halfop_can_be_disabled() {
        let mut config = Config::default();
        config.channels.halfop = false;
        let mut r = ModeRegistry::new();
        register_core_modes(&mut r, &config).unwrap();
        assert_eq!(r.isupport_prefix(), "(ov)@+");
    }

    #[test]
    fn validators() {
        assert_eq!(validate_limit("10").as_deref(), Ok("10"));
        assert!(validate_limit("0").is_err());
        assert!(validate_limit("-3").is_err());
        assert!(validate_key("a b").is_err());
        assert_eq!(validate_key(&"x".repeat(40)).map(|k| k.len()), Ok(32));
    }
}
