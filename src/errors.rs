//! Error types for the resource pool

use crate::resource::ResourceId;
use thiserror::Error;

/// Error returned by a [`ResourceFactory`](crate::ResourceFactory) when it cannot build a resource
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("Resource pool must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("Maximum waiting clients exceeded ({0} already waiting)")]
    BackpressureExceeded(usize),

    #[error("Acquire timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Acquire was cancelled")]
    Cancelled,

    #[error("No resource available - the pool was shut down while waiting")]
    NoResourceAvailable,

    #[error("Unknown resource {0} - it is not lended by this pool")]
    UnknownResource(ResourceId),

    #[error("Can't perform actions on an inactive pool")]
    Inactive,

    #[error("Can't shut down the pool while {0} resource(s) are lended")]
    OutstandingLendedResources(usize),

    #[error("Resource factory failed to create a resource: {0}")]
    Factory(String),

    #[error("Resource validation failed")]
    ValidationFailed,
}

impl PoolError {
    /// Whether the caller may retry the operation later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PoolError::BackpressureExceeded(_)
                | PoolError::Timeout(_)
                | PoolError::Cancelled
                | PoolError::Factory(_)
                | PoolError::ValidationFailed
        )
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retryable_kinds() {
        assert!(PoolError::Timeout(Duration::from_millis(5)).is_retryable());
        assert!(PoolError::BackpressureExceeded(3).is_retryable());
        assert!(!PoolError::Inactive.is_retryable());
        assert!(!PoolError::OutstandingLendedResources(1).is_retryable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            PoolError::OutstandingLendedResources(2).to_string(),
            "Can't shut down the pool while 2 resource(s) are lended"
        );
        assert_eq!(PoolError::Inactive.to_string(), "Can't perform actions on an inactive pool");
    }
}
