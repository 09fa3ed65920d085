//! Module lifecycle state (spec §3, §4.5).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of a module.
///
/// ```text
/// Loaded --construct--> Constructed --start--> Active
///   ^                       |                     |
///   |                       <--------stop---------
///   |                       |
///   <--------destroy--------
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Loaded,
    Constructed,
    Active,
}

impl LifecycleState {
    /// Whether `self` is at least as advanced as `other` in the lifecycle
    /// ordering `Loaded < Constructed < Active` (spec §3 invariant 2: "no
    /// module is Active while any strict provider is not Active").
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Loaded => 0,
            Self::Constructed => 1,
            Self::Active => 2,
        }
    }

    #[must_use]
    pub const fn at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Valid forward/backward single-step transitions.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Loaded, Self::Constructed)
                | (Self::Constructed, Self::Active)
                | (Self::Active, Self::Constructed)
                | (Self::Constructed, Self::Loaded)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Constructed => write!(f, "constructed"),
            Self::Active => write!(f, "active"),
        }
    }
}
