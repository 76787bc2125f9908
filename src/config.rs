//! Pool configuration options

use crate::errors::{PoolError, PoolResult};
use std::time::Duration;

/// Configuration for resource pool behavior
///
/// The configuration is copied into the pool on creation and never changes afterwards.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_max_resources(8)
///     .with_max_waiting_clients(32)
///     .with_acquire_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.max_resources, 8);
/// assert_eq!(config.max_waiting_clients, Some(32));
/// assert_eq!(config.acquire_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfiguration {
    /// Maximum number of resources that can exist at once (idle + lended)
    pub max_resources: usize,

    /// How long `acquire` waits before giving up; `None` waits indefinitely
    pub acquire_timeout: Option<Duration>,

    /// Maximum number of callers allowed to wait in `acquire`; `None` is unbounded
    pub max_waiting_clients: Option<usize>,

    /// Consecutive validation rejections tolerated for one waiting caller; `None` retries forever
    pub max_validation_attempts: Option<usize>,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            max_resources: 10,
            acquire_timeout: None,
            max_waiting_clients: None,
            max_validation_attempts: None,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of live resources
    pub fn with_max_resources(mut self, max: usize) -> Self {
        self.max_resources = max;
        self
    }

    /// Set the acquire timeout
    ///
    /// A zero duration disables the timeout.
    ///
    /// ```
    /// use esox_resourcepool::PoolConfiguration;
    /// use std::time::Duration;
    ///
    /// let config = PoolConfiguration::new().with_acquire_timeout(Duration::ZERO);
    /// assert_eq!(config.acquire_timeout, None);
    /// ```
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Set the waiting-client limit; zero means unbounded
    pub fn with_max_waiting_clients(mut self, max: usize) -> Self {
        self.max_waiting_clients = (max > 0).then_some(max);
        self
    }

    /// Bound the validate-and-retry loop; zero means unbounded
    pub fn with_max_validation_attempts(mut self, attempts: usize) -> Self {
        self.max_validation_attempts = (attempts > 0).then_some(attempts);
        self
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_resources == 0 {
            return Err(PoolError::InvalidConfig(
                "max_resources must be 1 or greater".to_string(),
            ));
        }
        if self.max_waiting_clients == Some(0) {
            return Err(PoolError::InvalidConfig(
                "max_waiting_clients must be None or greater than 0".to_string(),
            ));
        }
        if self.max_validation_attempts == Some(0) {
            return Err(PoolError::InvalidConfig(
                "max_validation_attempts must be None or greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PoolConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.acquire_timeout, None);
        assert_eq!(config.max_waiting_clients, None);
    }

    #[test]
    fn test_zero_max_is_rejected() {
        let config = PoolConfiguration::new().with_max_resources(0);
        assert!(matches!(config.validate(), Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_means_unbounded() {
        let config = PoolConfiguration::new()
            .with_max_waiting_clients(0)
            .with_max_validation_attempts(0);
        assert_eq!(config.max_waiting_clients, None);
        assert_eq!(config.max_validation_attempts, None);
    }

    #[test]
    fn test_struct_literal_zero_limits_are_rejected() {
        let config = PoolConfiguration {
            max_waiting_clients: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
