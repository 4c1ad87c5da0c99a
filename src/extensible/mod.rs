//! Extension store: typed, named attachment slots on stateful objects.
//!
//! Extensions register a descriptor ([`ExtItem`]) with the
//! [`ExtensionManager`] for one kind of object, then use the handle to read
//! and write values in any object's [`Extensible`] of that kind. Descriptors
//! are owned by the registering extension; unloading it purges every value
//! stored under its descriptors.
//!
//! ```
//! use slircd_core::extensible::{Extensible, ExtensibleKind, ExtensionManager};
//!
//! let mut manager = ExtensionManager::new();
//! let away = manager.register::<String>("away", ExtensibleKind::User, "away_msg").unwrap();
//!
//! let mut user = Extensible::new(ExtensibleKind::User);
//! away.set(&manager, &mut user, "gone fishing".to_string()).unwrap();
//! assert_eq!(away.get(&manager, &user).unwrap().map(String::as_str), Some("gone fishing"));
//! ```

mod item;
mod manager;
mod store;

use std::fmt;

pub use item::ExtItem;
pub use manager::{DescriptorInfo, ExtensionManager};
pub use store::Extensible;

/// Kind of object an attachment can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensibleKind {
    User,
    Channel,
    Membership,
    Server,
}

impl ExtensibleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Membership => "membership",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for ExtensibleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor identity. Never reused, so a stale handle stays detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtId(pub(crate) u64);
