//! Instance providers
//!
//! A provider turns a handler [`TypeDescriptor`] into a handler instance.
//! The registry never caches instances; lifecycle belongs to the provider.

mod activator;
mod delegated;
mod local;

pub use activator::ActivatorInstanceProvider;
pub use delegated::DelegatedInstanceProvider;
pub use local::LocalInstanceProvider;

use crate::describe::TypeDescriptor;
use crate::error::Result;
use crate::handler::Instance;

/// Strategy for producing handler instances at dispatch time.
pub trait InstanceProvider: Send + Sync {
    /// Produce an instance of `handler`.
    ///
    /// The returned value must downcast to the type `handler` describes.
    fn get_instance(&self, handler: &TypeDescriptor) -> Result<Instance>;
}
