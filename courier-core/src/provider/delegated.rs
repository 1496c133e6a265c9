use super::InstanceProvider;
use crate::container::ServiceContainer;
use crate::describe::TypeDescriptor;
use crate::error::{BoxError, CqrsError, Result};
use crate::handler::Instance;
use courier_log::trace;
use std::sync::Arc;

type Resolve = Arc<dyn Fn(&TypeDescriptor) -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// Forwards every resolution to an external lookup.
///
/// Any failure from the lookup surfaces as
/// [`CqrsError::UnregisteredDependency`] with the original error as its source.
#[derive(Clone)]
pub struct DelegatedInstanceProvider {
    resolve: Resolve,
}

impl DelegatedInstanceProvider {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> std::result::Result<Instance, BoxError> + Send + Sync + 'static,
    {
        Self {
            resolve: Arc::new(resolve),
        }
    }

    /// Resolve handlers from a [`ServiceContainer`].
    pub fn from_container(container: ServiceContainer) -> Self {
        Self::new(move |handler| {
            container
                .resolve_instance(&handler.token())
                .map_err(BoxError::from)
        })
    }
}

impl InstanceProvider for DelegatedInstanceProvider {
    fn get_instance(&self, handler: &TypeDescriptor) -> Result<Instance> {
        trace!(handler = %handler, "Delegating handler resolution");
        (self.resolve)(handler).map_err(|source| CqrsError::UnregisteredDependency {
            handler: handler.token(),
            source,
        })
    }
}

impl std::fmt::Debug for DelegatedInstanceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatedInstanceProvider").finish_non_exhaustive()
    }
}
