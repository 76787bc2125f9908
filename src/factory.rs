//! Resource factories: how the pool builds, checks and tears down resources

use crate::errors::FactoryError;

use async_trait::async_trait;

/// Capabilities the pool needs from the caller to manage resources
///
/// Only [`create`](ResourceFactory::create) is required. Validation defaults to
/// accepting every resource and destruction defaults to simply dropping it.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use esox_resourcepool::{FactoryError, ResourceFactory};
///
/// struct Buffers;
///
/// #[async_trait]
/// impl ResourceFactory<Vec<u8>> for Buffers {
///     async fn create(&self) -> Result<Vec<u8>, FactoryError> {
///         Ok(Vec::with_capacity(4096))
///     }
///
///     async fn validate(&self, buffer: &mut Vec<u8>) -> bool {
///         buffer.clear();
///         buffer.capacity() >= 4096
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceFactory<T: Send + 'static>: Send + Sync + 'static {
    /// Build a new resource
    async fn create(&self) -> Result<T, FactoryError>;

    /// Check a resource right before it is lent out; `false` discards it
    async fn validate(&self, _resource: &mut T) -> bool {
        true
    }

    /// Tear down a resource the pool no longer needs
    async fn destroy(&self, _resource: T) {}
}

type CreateFn<T> = Box<dyn Fn() -> Result<T, FactoryError> + Send + Sync>;
type ValidateFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type DestroyFn<T> = Box<dyn Fn(T) + Send + Sync>;

/// Factory built from plain closures
///
/// # Examples
///
/// ```
/// use esox_resourcepool::FnFactory;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let counter = AtomicUsize::new(0);
/// let factory = FnFactory::new(move || counter.fetch_add(1, Ordering::Relaxed) + 1)
///     .with_validation(|value| *value != 1)
///     .with_destroy(|value| println!("destroying {value}"));
/// # let _ = factory;
/// ```
pub struct FnFactory<T> {
    create: CreateFn<T>,
    validate: Option<ValidateFn<T>>,
    destroy: Option<DestroyFn<T>>,
}

impl<T: Send + 'static> FnFactory<T> {
    /// Factory from an infallible constructor
    pub fn new<F>(create: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::try_new(move || Ok(create()))
    }

    /// Factory from a constructor that may fail
    pub fn try_new<F>(create: F) -> Self
    where
        F: Fn() -> Result<T, FactoryError> + Send + Sync + 'static,
    {
        Self {
            create: Box::new(create),
            validate: None,
            destroy: None,
        }
    }

    /// Check resources before they are lent; rejected ones are destroyed
    pub fn with_validation<F>(mut self, validate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(validate));
        self
    }

    /// Run custom teardown instead of simply dropping the resource
    pub fn with_destroy<F>(mut self, destroy: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.destroy = Some(Box::new(destroy));
        self
    }
}

#[async_trait]
impl<T: Send + 'static> ResourceFactory<T> for FnFactory<T> {
    async fn create(&self) -> Result<T, FactoryError> {
        (self.create)()
    }

    async fn validate(&self, resource: &mut T) -> bool {
        self.validate
            .as_ref()
            .is_none_or(|validate| validate(&*resource))
    }

    async fn destroy(&self, resource: T) {
        if let Some(destroy) = &self.destroy {
            destroy(resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fn_factory_defaults() {
        let factory = FnFactory::new(|| 42);
        let mut value = factory.create().await.unwrap();
        assert_eq!(value, 42);
        assert!(factory.validate(&mut value).await);
        factory.destroy(value).await;
    }

    #[tokio::test]
    async fn test_fn_factory_capabilities() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&destroyed);
        let factory = FnFactory::new(|| 1)
            .with_validation(|value| *value > 1)
            .with_destroy(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });

        let mut value = factory.create().await.unwrap();
        assert!(!factory.validate(&mut value).await);
        factory.destroy(value).await;
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallible_factory() {
        let factory: FnFactory<u8> = FnFactory::try_new(|| Err("connection refused".into()));
        let err = factory.create().await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }
}
