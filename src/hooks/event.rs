//! Event kinds offered to extensions.

use std::fmt;

/// A named point at which extensions may observe or veto a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    // Veto events: first non-PASSTHRU verdict wins.
    PreCommand,
    RawMode,
    PreMode,
    UserPreJoin,
    UserPreMessage,
    CheckBan,

    // Notifications: every subscriber runs, verdicts ignored.
    PostCommand,
    Mode,
    UserConnect,
    UserJoin,
    UserPart,
    UserQuit,
    UserMessage,
    ChannelDelete,
    LoadModule,
    UnloadModule,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        Self::PreCommand,
        Self::RawMode,
        Self::PreMode,
        Self::UserPreJoin,
        Self::UserPreMessage,
        Self::CheckBan,
        Self::PostCommand,
        Self::Mode,
        Self::UserConnect,
        Self::UserJoin,
        Self::UserPart,
        Self::UserQuit,
        Self::UserMessage,
        Self::ChannelDelete,
        Self::LoadModule,
        Self::UnloadModule,
    ];

    /// True for events whose subscribers return a verdict.
    pub const fn is_veto(self) -> bool {
        matches!(
            self,
            Self::PreCommand
                | Self::RawMode
                | Self::PreMode
                | Self::UserPreJoin
                | Self::UserPreMessage
                | Self::CheckBan
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreCommand => "pre_command",
            Self::RawMode => "raw_mode",
            Self::PreMode => "pre_mode",
            Self::UserPreJoin => "user_pre_join",
            Self::UserPreMessage => "user_pre_message",
            Self::CheckBan => "check_ban",
            Self::PostCommand => "post_command",
            Self::Mode => "mode",
            Self::UserConnect => "user_connect",
            Self::UserJoin => "user_join",
            Self::UserPart => "user_part",
            Self::UserQuit => "user_quit",
            Self::UserMessage => "user_message",
            Self::ChannelDelete => "channel_delete",
            Self::LoadModule => "load_module",
            Self::UnloadModule => "unload_module",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn veto_split() {
        let vetoes = EventKind::ALL.iter().filter(|k| k.is_veto()).count();
        assert_eq!(vetoes, 6);
        assert!(!EventKind::Mode.is_veto());
        assert!(EventKind::CheckBan.is_veto());
    }
}
