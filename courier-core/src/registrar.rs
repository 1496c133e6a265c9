//! Registration of (message, handler) pairs

use crate::describe::{Describe, TypeDescriptor};
use crate::error::{CqrsError, Result};
use crate::handler::{
    command_invoker, command_with_result_invoker, query_invoker, CommandHandler,
    CommandWithResultHandler, Invoke, QueryHandler,
};
use crate::introspect::{AmbiguityPolicy, Introspector};
use crate::message::{Command, CommandWithResult, Query};
use crate::registry::{HandlerRegistry, HandlerRoute};
use crate::token::{ResultType, TypeToken};
use courier_log::debug;
use std::sync::Arc;

/// Validates handler registrations and commits them to a [`HandlerRegistry`].
///
/// A failed registration leaves the registry untouched. Registering a second
/// handler for the same message replaces the first.
///
/// # Examples
///
/// ```ignore
/// let registrar = Registrar::new();
/// registrar.register_command_types::<CreateUser, CreateUserHandler>()?;
/// registrar.register_query_handler::<GetUserById, User, GetUserByIdHandler>();
///
/// let registry = registrar.registry();
/// ```
pub struct Registrar {
    introspector: Introspector,
    registry: Arc<HandlerRegistry>,
}

impl Registrar {
    pub fn new() -> Self {
        Self::with_policy(AmbiguityPolicy::default())
    }

    pub fn with_policy(policy: AmbiguityPolicy) -> Self {
        Self {
            introspector: Introspector::new(policy),
            registry: Arc::new(HandlerRegistry::new()),
        }
    }

    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }

    /// The registry this registrar writes into.
    pub fn registry(&self) -> Arc<HandlerRegistry> {
        Arc::clone(&self.registry)
    }

    /// Register `handler` for command `message` after checking that
    /// `message` is a command and `handler` declares the matching contract.
    pub fn register_command(&self, message: &TypeDescriptor, handler: &TypeDescriptor) -> Result<()> {
        let kind = self.introspector.classify_command(message)?;
        let result = kind.result();

        let shape = self.introspector.classify_handler(handler);
        if !shape.is_command_handler() {
            return Err(CqrsError::NotCommandHandler {
                handler: handler.token(),
                message: None,
                result: None,
            });
        }

        let contract = shape
            .command_contract(message.token(), result.map(|r| r.token()))
            .ok_or_else(|| CqrsError::NotCommandHandler {
                handler: handler.token(),
                message: Some(message.token()),
                result: result.map(|r| r.token()),
            })?;

        self.commit_command(message.token(), handler.clone(), result, contract.invoker());
        Ok(())
    }

    /// Register `handler` for query `message` after checking the
    /// `QueryHandler<message, result>` contract.
    pub fn register_query(&self, message: &TypeDescriptor, handler: &TypeDescriptor) -> Result<()> {
        let result = self.introspector.classify_query(message)?;

        let shape = self.introspector.classify_handler(handler);
        let contract = shape
            .query_contract(message.token(), result.token())
            .ok_or_else(|| CqrsError::NotQueryHandler {
                handler: handler.token(),
                message: message.token(),
                result: result.token(),
            })?;

        self.commit_query(message.token(), handler.clone(), result, contract.invoker());
        Ok(())
    }

    /// Checked registration by type parameters.
    pub fn register_command_types<M: Describe, H: Describe>(&self) -> Result<()> {
        let message = self.introspector.describe::<M>();
        let handler = self.introspector.describe::<H>();
        self.register_command(&message, &handler)
    }

    /// Checked registration by type parameters.
    pub fn register_query_types<M: Describe, H: Describe>(&self) -> Result<()> {
        let message = self.introspector.describe::<M>();
        let handler = self.introspector.describe::<H>();
        self.register_query(&message, &handler)
    }

    /// Register `H` for plain command `C`. The trait bound is the only check.
    pub fn register_command_handler<C, H>(&self) -> &Self
    where
        C: Command + Describe,
        H: CommandHandler<C> + Describe,
    {
        let result = self.declared_command_result::<C>();
        self.commit_command(
            TypeToken::of::<C>(),
            self.introspector.describe::<H>(),
            result,
            command_invoker::<C, H>(),
        );
        self
    }

    /// Register `H` for command `C` producing `R`. The trait bound is the only check.
    pub fn register_command_with_result_handler<C, R, H>(&self) -> &Self
    where
        C: CommandWithResult<R> + Describe,
        R: Send + 'static,
        H: CommandWithResultHandler<C, R> + Describe,
    {
        let result = self
            .declared_command_result::<C>()
            .filter(|declared| declared.token().is::<R>())
            .unwrap_or_else(ResultType::of::<R>);
        self.commit_command(
            TypeToken::of::<C>(),
            self.introspector.describe::<H>(),
            Some(result),
            command_with_result_invoker::<C, R, H>(),
        );
        self
    }

    /// Register `H` for query `Q` producing `R`. The trait bound is the only check.
    pub fn register_query_handler<Q, R, H>(&self) -> &Self
    where
        Q: Query<R> + Describe,
        R: Send + 'static,
        H: QueryHandler<Q, R> + Describe,
    {
        let message = self.introspector.describe::<Q>();
        let result = self
            .introspector
            .classify_query(&message)
            .ok()
            .filter(|declared| declared.token().is::<R>())
            .unwrap_or_else(ResultType::of::<R>);
        self.commit_query(
            message.token(),
            self.introspector.describe::<H>(),
            result,
            query_invoker::<Q, R, H>(),
        );
        self
    }

    fn declared_command_result<C: Describe>(&self) -> Option<ResultType> {
        let message = self.introspector.describe::<C>();
        self.introspector
            .classify_command(&message)
            .ok()
            .and_then(|kind| kind.result())
    }

    fn commit_command(
        &self,
        message: TypeToken,
        handler: TypeDescriptor,
        result: Option<ResultType>,
        invoker: Arc<dyn Invoke>,
    ) {
        let handler_name = handler.name();
        let route = HandlerRoute {
            handler,
            result,
            invoker,
        };
        match self.registry.insert_command(message, route) {
            Some(previous) => debug!(
                message_type = %message,
                handler = %handler_name,
                previous = %previous.handler,
                "Command handler replaced"
            ),
            None => debug!(
                message_type = %message,
                handler = %handler_name,
                "Command handler registered"
            ),
        }
    }

    fn commit_query(
        &self,
        message: TypeToken,
        handler: TypeDescriptor,
        result: ResultType,
        invoker: Arc<dyn Invoke>,
    ) {
        let handler_name = handler.name();
        let route = HandlerRoute {
            handler,
            result: Some(result),
            invoker,
        };
        match self.registry.insert_query(message, route) {
            Some(previous) => debug!(
                message_type = %message,
                handler = %handler_name,
                previous = %previous.handler,
                "Query handler replaced"
            ),
            None => debug!(
                message_type = %message,
                handler = %handler_name,
                result = %result,
                "Query handler registered"
            ),
        }
    }
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new()
    }
}
