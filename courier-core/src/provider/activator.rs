use super::InstanceProvider;
use crate::describe::{Construction, TypeDescriptor};
use crate::error::{CqrsError, Result};
use crate::handler::Instance;
use courier_log::trace;

/// Builds a fresh instance on every call through the handler's declared
/// construction path.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActivatorInstanceProvider;

impl ActivatorInstanceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl InstanceProvider for ActivatorInstanceProvider {
    fn get_instance(&self, handler: &TypeDescriptor) -> Result<Instance> {
        trace!(handler = %handler, "Activating handler instance");
        match handler.construction() {
            Construction::Abstract => Err(CqrsError::CannotInstantiateAbstract {
                handler: handler.token(),
            }),
            Construction::Unavailable => Err(CqrsError::ConstructionFailed {
                handler: handler.token(),
            }),
            Construction::Constructor(construct) => {
                construct().ok_or(CqrsError::ConstructionFailed {
                    handler: handler.token(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use std::sync::Arc;

    #[test]
    fn test_fresh_instance_per_call() {
        let provider = ActivatorInstanceProvider::new();
        let handler = TypeDescriptor::of::<CreateUserHandler>();

        let first = provider.get_instance(&handler).unwrap();
        let second = provider.get_instance(&handler).unwrap();
        assert!(first.is::<CreateUserHandler>());
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_custom_constructor() {
        let provider = ActivatorInstanceProvider::new();
        let instance = provider
            .get_instance(&TypeDescriptor::of::<GetUserHandler>())
            .unwrap();
        assert!(instance.downcast::<GetUserHandler>().is_ok());
    }

    #[test]
    fn test_abstract_handler() {
        let provider = ActivatorInstanceProvider::new();
        let err = provider
            .get_instance(&TypeDescriptor::of::<DirectoryHandler>())
            .unwrap_err();
        assert!(matches!(err, CqrsError::CannotInstantiateAbstract { .. }));
    }

    #[test]
    fn test_no_construction_path() {
        let provider = ActivatorInstanceProvider::new();
        let err = provider
            .get_instance(&TypeDescriptor::of::<NoConstructorHandler>())
            .unwrap_err();
        assert!(matches!(err, CqrsError::ConstructionFailed { handler } if handler.is::<NoConstructorHandler>()));

        let err = provider
            .get_instance(&TypeDescriptor::of::<FailingConstructorHandler>())
            .unwrap_err();
        assert!(matches!(err, CqrsError::ConstructionFailed { .. }));
    }
}
