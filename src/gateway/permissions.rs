use serde::{Deserialize, Serialize};

/// Chat platform permission bit set, as found in channel overwrites.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const CONNECT: Self = Self(1 << 20);
    pub const SPEAK: Self = Self(1 << 21);

    /// What the bot needs to join a channel and play into it.
    pub const VOICE: Self = Self(Self::CONNECT.0 | Self::SPEAK.0);

    pub fn contains(self, other: Self) -> bool {
        self.missing(other).is_empty()
    }

    /// Bits of `required` that this set does not grant.
    pub fn missing(self, required: Self) -> Self {
        if self.0 & Self::ADMINISTRATOR.0 != 0 {
            return Self::NONE;
        }
        Self(required.0 & !self.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Debug for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.0 & Self::ADMINISTRATOR.0 != 0 {
            names.push("ADMINISTRATOR");
        }
        if self.0 & Self::CONNECT.0 != 0 {
            names.push("CONNECT");
        }
        if self.0 & Self::SPEAK.0 != 0 {
            names.push("SPEAK");
        }
        let known = Self::ADMINISTRATOR.0 | Self::CONNECT.0 | Self::SPEAK.0;
        if self.0 & !known != 0 {
            return write!(f, "Permissions({:#x})", self.0);
        }
        write!(f, "Permissions({})", names.join(" | "))
    }
}
