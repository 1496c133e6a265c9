//! # Courier Core
//!
//! Typed command and query dispatch.
//!
//! Messages implement one of the taxonomy markers ([`Command`],
//! [`CommandWithResult`], [`Query`]) and handlers implement the matching
//! handler trait. Both list their contracts in a [`Describe`] impl so the
//! [`Registrar`] can validate registrations at runtime. A [`CqrsService`]
//! then routes each message to its registered handler, obtaining instances
//! from an [`InstanceProvider`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use courier_core::*;
//!
//! let registrar = Registrar::new();
//! registrar.register_command_types::<CreateUser, CreateUserHandler>()?;
//!
//! let service = CqrsService::new(
//!     registrar.registry(),
//!     Arc::new(ActivatorInstanceProvider::new()),
//! );
//! let id = service.execute(CreateUser { name: "ada".into() }).await?;
//! ```

pub mod config;
pub mod container;
pub mod describe;
pub mod error;
pub mod handler;
pub mod introspect;
pub mod message;
pub mod options;
pub mod provider;
pub mod registrar;
pub mod registry;
pub mod service;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, CqrsConfig, ProviderKind};
pub use container::{ContainerError, ServiceContainer};
pub use describe::{Capability, CapabilitySet, Describe, HandlerContract, TypeDescriptor};
pub use error::{BoxError, CqrsError};
pub use handler::{CommandHandler, CommandWithResultHandler, Instance, QueryHandler};
pub use introspect::{AmbiguityPolicy, CommandKind, HandlerShape, Introspector};
pub use message::{Command, CommandWithResult, Query};
pub use options::{CqrsOptions, HandlerModule};
pub use provider::{
    ActivatorInstanceProvider, DelegatedInstanceProvider, InstanceProvider, LocalInstanceProvider,
};
pub use registrar::Registrar;
pub use registry::HandlerRegistry;
pub use service::CqrsService;
pub use token::{ResultType, TypeToken};

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
