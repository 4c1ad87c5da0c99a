//! Mode descriptors: what a letter means and who may change it.

use std::fmt;
use std::sync::Arc;

/// Voice rank (`+`).
pub const VOICE_RANK: u32 = 10_000;
/// Halfop rank (`%`).
pub const HALFOP_RANK: u32 = 20_000;
/// Channel operator rank (`@`).
pub const OP_RANK: u32 = 30_000;

/// Owner recorded for modes registered by the daemon itself.
pub const CORE_OWNER: &str = "core";

/// Object kind a mode applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModeTarget {
    User,
    Channel,
}

impl ModeTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
        }
    }
}

impl fmt::Display for ModeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter validator. Returns the normalized parameter or a reason.
pub type Validator = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// Rank data for a prefix mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixSpec {
    pub rank: u32,
    pub symbol: char,
    /// Rank an actor needs to grant or revoke this prefix.
    pub rank_to_set: u32,
    /// Members may always remove this prefix from themselves.
    pub self_remove: bool,
}

impl PrefixSpec {
    pub fn new(rank: u32, symbol: char) -> Self {
        Self {
            rank,
            symbol,
            rank_to_set: rank,
            self_remove: false,
        }
    }

    #[must_use]
    pub fn rank_to_set(mut self, rank: u32) -> Self {
        self.rank_to_set = rank;
        self
    }

    #[must_use]
    pub fn self_removable(mut self) -> Self {
        self.self_remove = true;
        self
    }
}

/// How a mode consumes parameters and stores state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeClass {
    /// On/off flag, no parameter.
    Simple,
    /// Single value; removal may or may not take a parameter.
    Param { unset_takes_param: bool },
    /// Capped list of patterns.
    List,
    /// Per-member rank.
    Prefix(PrefixSpec),
}

/// Everything the engine needs to know about one mode letter.
#[derive(Clone)]
pub struct ModeDescriptor {
    pub letter: char,
    pub target: ModeTarget,
    pub class: ModeClass,
    /// Channel rank needed to change a non-prefix channel mode.
    pub rank_required: u32,
    /// User mode that users cannot add to themselves.
    pub oper_only: bool,
    pub validator: Option<Validator>,
    pub owner: String,
}

impl ModeDescriptor {
    fn base(letter: char, target: ModeTarget, class: ModeClass) -> Self {
        Self {
            letter,
            target,
            class,
            rank_required: HALFOP_RANK,
            oper_only: false,
            validator: None,
            owner: CORE_OWNER.to_string(),
        }
    }

    pub fn simple(letter: char, target: ModeTarget) -> Self {
        Self::base(letter, target, ModeClass::Simple)
    }

    pub fn param(letter: char, unset_takes_param: bool) -> Self {
        Self::base(letter, ModeTarget::Channel, ModeClass::Param { unset_takes_param })
    }

    pub fn list(letter: char) -> Self {
        Self::base(letter, ModeTarget::Channel, ModeClass::List)
    }

    pub fn prefix(letter: char, spec: PrefixSpec) -> Self {
        Self::base(letter, ModeTarget::Channel, ModeClass::Prefix(spec))
    }

    #[must_use]
    pub fn with_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank_required = rank;
        self
    }

    #[must_use]
    pub fn oper_only(mut self) -> Self {
        self.oper_only = true;
        self
    }

    /// Does this item consume a parameter in the given direction?
    pub fn takes_param(&self, adding: bool) -> bool {
        match self.class {
            ModeClass::Simple => false,
            ModeClass::Param { unset_takes_param } => adding || unset_takes_param,
            ModeClass::List | ModeClass::Prefix(_) => true,
        }
    }

    pub fn prefix_spec(&self) -> Option<PrefixSpec> {
        match self.class {
            ModeClass::Prefix(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.class, ModeClass::List)
    }
}

impl fmt::Debug for ModeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeDescriptor")
            .field("letter", &self.letter)
            .field("target", &self.target)
            .field("class", &self.class)
            .field("rank_required", &self.rank_required)
            .field("oper_only", &self.oper_only)
            .field("owner", &self.owner)
            .finish()
    }
}
