// Host service container

use crate::handler::Instance;
use crate::token::TypeToken;
use courier_log::{debug, trace};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Service container errors
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Service not found: {0}")]
    ServiceNotFound(TypeToken),
}

#[derive(Clone)]
enum Service {
    Singleton(Instance),
    Transient(Arc<dyn Fn() -> Instance + Send + Sync>),
}

impl Service {
    fn get(&self) -> Instance {
        match self {
            Service::Singleton(instance) => Arc::clone(instance),
            Service::Transient(factory) => factory(),
        }
    }
}

/// A minimal composition root keyed by type.
///
/// Handlers that depend on other services are registered here and resolved
/// through [`DelegatedInstanceProvider::from_container`](crate::DelegatedInstanceProvider::from_container).
#[derive(Clone, Default)]
pub struct ServiceContainer {
    services: Arc<RwLock<HashMap<TypeId, Service>>>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        debug!("Creating new service container");
        Self::default()
    }

    /// Register a singleton
    pub fn register<T: Any + Send + Sync>(&self, instance: T) {
        let type_name = std::any::type_name::<T>();

        trace!(service = type_name, "Acquiring write lock for registration");
        self.services
            .write()
            .insert(TypeId::of::<T>(), Service::Singleton(Arc::new(instance)));

        debug!(service = type_name, "Singleton registered in service container");
    }

    /// Register a factory invoked on every resolution
    pub fn register_transient<T, F>(&self, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();

        self.services.write().insert(
            TypeId::of::<T>(),
            Service::Transient(Arc::new(move || Arc::new(factory()) as Instance)),
        );

        debug!(service = type_name, "Transient registered in service container");
    }

    /// Resolve a service by type
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        let token = TypeToken::of::<T>();
        self.resolve_instance(&token)?
            .downcast::<T>()
            .map_err(|_| ContainerError::ServiceNotFound(token))
    }

    /// Resolve a type-erased service
    pub fn resolve_instance(&self, ty: &TypeToken) -> Result<Instance, ContainerError> {
        trace!(service = %ty, "Attempting to resolve service");

        // Clone out of the lock so transient factories may resolve their own dependencies.
        let service = self.services.read().get(&ty.id()).cloned();
        match service {
            Some(service) => {
                debug!(service = %ty, "Service resolved successfully");
                Ok(service.get())
            }
            None => {
                debug!(service = %ty, "Service not found in container");
                Err(ContainerError::ServiceNotFound(*ty))
            }
        }
    }

    /// Check if a service is registered
    pub fn has<T: Any>(&self) -> bool {
        let exists = self.services.read().contains_key(&TypeId::of::<T>());
        trace!(service = std::any::type_name::<T>(), exists = exists, "Checked service existence");
        exists
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.len())
            .finish()
    }
}
