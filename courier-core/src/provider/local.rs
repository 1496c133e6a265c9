use super::InstanceProvider;
use crate::describe::{Describe, TypeDescriptor};
use crate::error::{CqrsError, Result};
use crate::handler::Instance;
use crate::token::TypeToken;
use courier_log::{debug, trace};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

type Factory = Arc<dyn Fn() -> Option<Instance> + Send + Sync>;

/// Locally registered singletons and factories.
///
/// Singletons are checked first; a factory runs on every resolution and its
/// output is never cached. Only handler types may be registered.
#[derive(Default)]
pub struct LocalInstanceProvider {
    instances: DashMap<TypeId, Instance>,
    factories: DashMap<TypeId, Factory>,
}

impl LocalInstanceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `instance` as the singleton for `T`.
    pub fn register_instance<T>(&self, instance: T) -> Result<&Self>
    where
        T: Describe + Send + Sync,
    {
        let token = ensure_handler::<T>()?;
        self.instances.insert(token.id(), Arc::new(instance));
        debug!(handler = %token, "Handler instance registered");
        Ok(self)
    }

    /// Register `T::default()` as the singleton for `T`.
    pub fn register_default_instance<T>(&self) -> Result<&Self>
    where
        T: Describe + Default + Send + Sync,
    {
        self.register_instance(T::default())
    }

    /// Register a factory for `T`, invoked on every resolution.
    pub fn register_factory<T, F>(&self, factory: F) -> Result<&Self>
    where
        T: Describe + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert_factory::<T>(Arc::new(move || Some(Arc::new(factory()) as Instance)))
    }

    /// Register `T::default` as the factory for `T`.
    pub fn register_default_factory<T>(&self) -> Result<&Self>
    where
        T: Describe + Default + Send + Sync,
    {
        self.register_factory(T::default)
    }

    /// Register a factory that may yield nothing, reported as
    /// [`CqrsError::FactoryReturnedNull`] at resolution time.
    pub fn register_optional_factory<T, F>(&self, factory: F) -> Result<&Self>
    where
        T: Describe + Send + Sync,
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        self.insert_factory::<T>(Arc::new(move || {
            factory().map(|value| Arc::new(value) as Instance)
        }))
    }

    /// Whether a singleton or factory is registered for `handler`.
    pub fn contains(&self, handler: &TypeToken) -> bool {
        self.instances.contains_key(&handler.id()) || self.factories.contains_key(&handler.id())
    }

    fn insert_factory<T: Describe>(&self, factory: Factory) -> Result<&Self> {
        let token = ensure_handler::<T>()?;
        self.factories.insert(token.id(), factory);
        debug!(handler = %token, "Handler factory registered");
        Ok(self)
    }
}

fn ensure_handler<T: Describe>() -> Result<TypeToken> {
    let descriptor = TypeDescriptor::of::<T>();
    if descriptor.is_handler() {
        Ok(descriptor.token())
    } else {
        Err(CqrsError::NotAHandler {
            ty: descriptor.token(),
        })
    }
}

impl InstanceProvider for LocalInstanceProvider {
    fn get_instance(&self, handler: &TypeDescriptor) -> Result<Instance> {
        let id = handler.token().id();

        if let Some(instance) = self.instances.get(&id) {
            trace!(handler = %handler, "Resolved registered handler instance");
            return Ok(Arc::clone(instance.value()));
        }

        // Release the map guard before running user code.
        let factory = self.factories.get(&id).map(|f| Arc::clone(f.value()));
        match factory {
            Some(factory) => {
                trace!(handler = %handler, "Invoking handler factory");
                factory().ok_or(CqrsError::FactoryReturnedNull {
                    ty: handler.token(),
                })
            }
            None => Err(CqrsError::InstanceNotRegistered {
                handler: handler.token(),
            }),
        }
    }
}

impl std::fmt::Debug for LocalInstanceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalInstanceProvider")
            .field("instances", &self.instances.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}
