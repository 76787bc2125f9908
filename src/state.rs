//! Pool lifecycle state

use std::fmt;

/// Lifecycle state of a pool
///
/// A pool starts `Active` and becomes `Inactive` exactly once, on a successful
/// shutdown. An inactive pool is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolState {
    /// Accepting acquire, release and destroy
    #[default]
    Active,

    /// Shut down - every operation fails
    Inactive,
}

impl PoolState {
    pub fn is_active(self) -> bool {
        self == PoolState::Active
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Active => f.write_str("ACTIVE"),
            PoolState::Inactive => f.write_str("INACTIVE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_active() {
        assert_eq!(PoolState::default(), PoolState::Active);
        assert!(PoolState::default().is_active());
        assert_eq!(PoolState::Inactive.to_string(), "INACTIVE");
    }
}
