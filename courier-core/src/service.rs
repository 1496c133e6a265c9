//! Dispatch facade
//!
//! Per call: resolve the route for the message's type, obtain a handler
//! instance from the provider, invoke, then apply the null-result policy.
//! The service keeps no per-call state and is cheap to clone.

use crate::error::{BoxError, CqrsError};
use crate::handler::AnyMessage;
use crate::message::{Command, CommandWithResult, Query};
use crate::provider::InstanceProvider;
use crate::registry::{HandlerRegistry, HandlerRoute};
use crate::token::{AnyValue, TypeToken};
use courier_log::trace;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Routes commands and queries to their registered handlers.
///
/// Every method returns `Result<_, BoxError>`. Core failures are boxed
/// [`CqrsError`] values; a handler's own error reaches the caller as the
/// handler produced it:
///
/// ```ignore
/// match service.query(GetUserById { id: "missing".into() }).await {
///     Err(err) if err.downcast_ref::<UserNotFound>().is_some() => { /* domain error */ }
///     other => { /* ... */ }
/// }
/// ```
#[derive(Clone)]
pub struct CqrsService {
    registry: Arc<HandlerRegistry>,
    provider: Arc<dyn InstanceProvider>,
}

impl CqrsService {
    pub fn new(registry: Arc<HandlerRegistry>, provider: Arc<dyn InstanceProvider>) -> Self {
        Self { registry, provider }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Send a command, discarding any result it produces.
    pub async fn send<C: Command>(&self, command: C) -> Result<(), BoxError> {
        self.send_inner(command, None).await
    }

    pub async fn send_with_cancellation<C: Command>(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> Result<(), BoxError> {
        self.send_inner(command, Some(cancellation)).await
    }

    /// Execute a command and return its result.
    pub async fn execute<C, R>(&self, command: C) -> Result<R, BoxError>
    where
        C: CommandWithResult<R>,
        R: Send + 'static,
    {
        self.execute_inner(command, None).await
    }

    pub async fn execute_with_cancellation<C, R>(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> Result<R, BoxError>
    where
        C: CommandWithResult<R>,
        R: Send + 'static,
    {
        self.execute_inner(command, Some(cancellation)).await
    }

    /// Run a query and return its result.
    pub async fn query<Q, R>(&self, query: Q) -> Result<R, BoxError>
    where
        Q: Query<R>,
        R: Send + 'static,
    {
        self.query_inner(query, None).await
    }

    pub async fn query_with_cancellation<Q, R>(
        &self,
        query: Q,
        cancellation: CancellationToken,
    ) -> Result<R, BoxError>
    where
        Q: Query<R>,
        R: Send + 'static,
    {
        self.query_inner(query, Some(cancellation)).await
    }

    async fn send_inner<C: Command>(
        &self,
        command: C,
        cancellation: Option<CancellationToken>,
    ) -> Result<(), BoxError> {
        let message = TypeToken::of::<C>();
        let route = self
            .registry
            .command_route(message.id())
            .ok_or(CqrsError::CommandHandlerNotRegistered { message })?;

        self.invoke(message, &route, Box::new(command), cancellation)
            .await?;
        Ok(())
    }

    async fn execute_inner<C, R>(
        &self,
        command: C,
        cancellation: Option<CancellationToken>,
    ) -> Result<R, BoxError>
    where
        C: CommandWithResult<R>,
        R: Send + 'static,
    {
        let message = TypeToken::of::<C>();
        let route = self
            .registry
            .command_route(message.id())
            .ok_or(CqrsError::CommandHandlerNotRegistered { message })?;

        let output = self
            .invoke(message, &route, Box::new(command), cancellation)
            .await?;
        finish::<R>(message, &route, output)
    }

    async fn query_inner<Q, R>(
        &self,
        query: Q,
        cancellation: Option<CancellationToken>,
    ) -> Result<R, BoxError>
    where
        Q: Query<R>,
        R: Send + 'static,
    {
        let message = TypeToken::of::<Q>();
        let route = self
            .registry
            .query_route(message.id())
            .ok_or(CqrsError::QueryHandlerNotRegistered { message })?;

        let output = self
            .invoke(message, &route, Box::new(query), cancellation)
            .await?;
        finish::<R>(message, &route, output)
    }

    async fn invoke(
        &self,
        message: TypeToken,
        route: &HandlerRoute,
        payload: AnyMessage,
        cancellation: Option<CancellationToken>,
    ) -> Result<Option<AnyValue>, BoxError> {
        let instance = self.provider.get_instance(&route.handler)?;
        trace!(message_type = %message, handler = %route.handler, "Dispatching");
        route.invoker.invoke(instance, payload, cancellation).await
    }
}

/// Null-result policy, then downcast to the caller's result type.
fn finish<R: 'static>(
    message: TypeToken,
    route: &HandlerRoute,
    output: Option<AnyValue>,
) -> Result<R, BoxError> {
    let value = match output {
        Some(value) => value,
        None => absent::<R>(message, route)?,
    };

    value
        .downcast::<R>()
        .map(|value| *value)
        .map_err(|_| {
            CqrsError::ResultTypeMismatch {
                expected: TypeToken::of::<R>(),
            }
            .into()
        })
}

fn absent<R: 'static>(message: TypeToken, route: &HandlerRoute) -> Result<AnyValue, CqrsError> {
    if let Some(value) = route.result.and_then(|result| result.absent_value()) {
        return Ok(value);
    }

    let result = route
        .result
        .map(|result| result.token())
        .unwrap_or_else(TypeToken::of::<R>);
    if result.is_option() {
        // Only reachable through unchecked registration.
        Err(CqrsError::UnmarkedOptionalResult { message, result })
    } else {
        Err(CqrsError::NullHandlerResult { result })
    }
}

impl std::fmt::Debug for CqrsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CqrsService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
