//! Composition of a ready-to-use [`CqrsService`]

use crate::config::{CqrsConfig, ProviderKind};
use crate::container::ServiceContainer;
use crate::error::Result;
use crate::provider::{
    ActivatorInstanceProvider, DelegatedInstanceProvider, InstanceProvider, LocalInstanceProvider,
};
use crate::registrar::Registrar;
use crate::service::CqrsService;
use courier_log::{debug, info};
use std::sync::Arc;

/// An explicit group of handler registrations.
///
/// # Examples
///
/// ```ignore
/// struct UserModule;
///
/// impl HandlerModule for UserModule {
///     fn register(&self, registrar: &Registrar) -> Result<(), CqrsError> {
///         registrar.register_command_types::<CreateUser, CreateUserHandler>()?;
///         registrar.register_query_types::<GetUserById, GetUserByIdHandler>()
///     }
/// }
/// ```
pub trait HandlerModule: Send + Sync {
    fn register(&self, registrar: &Registrar) -> Result<()>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

type Configure = Box<dyn FnOnce(&Registrar) -> Result<()> + Send>;

enum Step {
    Module(Box<dyn HandlerModule>),
    Configure(Configure),
}

/// Builder wiring a registrar, an instance provider and handler modules into
/// a [`CqrsService`].
///
/// ```ignore
/// let service = CqrsOptions::from_config(CqrsConfig::from_env()?)
///     .container(container)
///     .module(UserModule)
///     .build()?;
/// ```
pub struct CqrsOptions {
    config: CqrsConfig,
    provider: Option<Arc<dyn InstanceProvider>>,
    steps: Vec<Step>,
}

impl CqrsOptions {
    pub fn new() -> Self {
        Self::from_config(CqrsConfig::default())
    }

    pub fn from_config(config: CqrsConfig) -> Self {
        Self {
            config,
            provider: None,
            steps: Vec::new(),
        }
    }

    pub fn config(&self) -> &CqrsConfig {
        &self.config
    }

    /// Use `provider` for every dispatch.
    pub fn instance_provider(mut self, provider: Arc<dyn InstanceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolve handlers from `container`.
    pub fn container(self, container: ServiceContainer) -> Self {
        self.instance_provider(Arc::new(DelegatedInstanceProvider::from_container(container)))
    }

    /// Add a handler module; modules run in insertion order.
    pub fn module<M: HandlerModule + 'static>(mut self, module: M) -> Self {
        self.steps.push(Step::Module(Box::new(module)));
        self
    }

    /// Add ad-hoc registrations.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&Registrar) -> Result<()> + Send + 'static,
    {
        self.steps.push(Step::Configure(Box::new(configure)));
        self
    }

    /// Run every registration step and build the service.
    pub fn build(self) -> Result<CqrsService> {
        let registrar = Registrar::with_policy(self.config.ambiguity);

        for step in self.steps {
            match step {
                Step::Module(module) => {
                    debug!(module = module.name(), "Registering handler module");
                    module.register(&registrar)?;
                }
                Step::Configure(configure) => configure(&registrar)?,
            }
        }

        let provider: Arc<dyn InstanceProvider> = match self.provider {
            Some(provider) => provider,
            None => match self.config.instance_provider {
                ProviderKind::Activator => Arc::new(ActivatorInstanceProvider::new()),
                ProviderKind::Local => Arc::new(LocalInstanceProvider::new()),
            },
        };

        let registry = registrar.registry();
        info!(
            commands = registry.command_count(),
            queries = registry.query_count(),
            "CQRS service ready"
        );
        Ok(CqrsService::new(registry, provider))
    }
}

impl Default for CqrsOptions {
    fn default() -> Self {
        Self::new()
    }
}
