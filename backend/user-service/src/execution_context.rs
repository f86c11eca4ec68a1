//! Per-command execution context
//!
//! Carries the caller identity propagated over gRPC and the flags that tell
//! downstream collaborators how a command's effects should be treated.

use grpc_identity_propagation::Identity;

/// Execution flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Effects of a freshly handled command; new events are published
    Live,
    /// Effects of rebuilding state from history; nothing is published
    Replay,
}

impl Flag {
    fn bit(self) -> u8 {
        match self {
            Flag::Live => 0b01,
            Flag::Replay => 0b10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    flags: u8,
    identity: Option<Identity>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags |= flag.bit();
        self
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags & flag.bit() != 0
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Identity of the caller that issued the command, if known
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_flags() {
        let ctx = ExecutionContext::new();
        assert!(!ctx.has_flag(Flag::Live));
        assert!(!ctx.has_flag(Flag::Replay));

        let ctx = ctx.with_flag(Flag::Live);
        assert!(ctx.has_flag(Flag::Live));
        assert!(!ctx.has_flag(Flag::Replay));

        let ctx = ctx.with_flag(Flag::Replay);
        assert!(ctx.has_flag(Flag::Live));
        assert!(ctx.has_flag(Flag::Replay));
    }

    #[test]
    fn test_flag_does_not_drop_identity() {
        let identity = Identity::new(Uuid::new_v4(), "a@example.com", vec!["admin".into()]);
        let ctx = ExecutionContext::new()
            .with_identity(identity.clone())
            .with_flag(Flag::Live);

        assert_eq!(ctx.identity(), Some(&identity));
    }
}
