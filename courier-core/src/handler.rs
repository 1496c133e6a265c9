//! Handler contracts and their type-erased invokers

use crate::error::{BoxError, CqrsError};
use crate::message::{Command, CommandWithResult, Query};
use crate::token::{AnyValue, TypeToken};
use async_trait::async_trait;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A handler instance as produced by an [`InstanceProvider`](crate::InstanceProvider).
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased message on its way to an invoker.
pub(crate) type AnyMessage = Box<dyn Any + Send>;

/// Handler for a command with no result.
///
/// # Examples
///
/// ```ignore
/// struct DeleteUser { id: String }
/// impl Command for DeleteUser {}
///
/// struct DeleteUserHandler { store: Arc<UserStore> }
///
/// #[async_trait]
/// impl CommandHandler<DeleteUser> for DeleteUserHandler {
///     type Error = UserStoreError;
///
///     async fn handle(
///         &self,
///         command: DeleteUser,
///         _cancellation: Option<CancellationToken>,
///     ) -> Result<(), UserStoreError> {
///         self.store.delete(&command.id)
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync + 'static {
    /// Error returned to the caller unmodified.
    type Error: Into<BoxError> + Send;

    async fn handle(
        &self,
        command: C,
        cancellation: Option<CancellationToken>,
    ) -> Result<(), Self::Error>;
}

/// Handler for a command producing `R`.
#[async_trait]
pub trait CommandWithResultHandler<C, R>: Send + Sync + 'static
where
    C: CommandWithResult<R>,
    R: Send + 'static,
{
    type Error: Into<BoxError> + Send;

    async fn handle(
        &self,
        command: C,
        cancellation: Option<CancellationToken>,
    ) -> Result<R, Self::Error>;
}

/// Handler for a query producing `R`.
#[async_trait]
pub trait QueryHandler<Q, R>: Send + Sync + 'static
where
    Q: Query<R>,
    R: Send + 'static,
{
    type Error: Into<BoxError> + Send;

    async fn handle(
        &self,
        query: Q,
        cancellation: Option<CancellationToken>,
    ) -> Result<R, Self::Error>;
}

/// Late-bound call into one (handler, message, result) contract.
///
/// Built once per contract when it is declared; dispatch only downcasts.
#[async_trait]
pub(crate) trait Invoke: Send + Sync {
    async fn invoke(
        &self,
        instance: Instance,
        message: AnyMessage,
        cancellation: Option<CancellationToken>,
    ) -> Result<Option<AnyValue>, BoxError>;
}

fn downcast_pair<H, M>(instance: Instance, message: AnyMessage) -> Result<(Arc<H>, M), CqrsError>
where
    H: Send + Sync + 'static,
    M: 'static,
{
    let handler = instance
        .downcast::<H>()
        .map_err(|_| CqrsError::InstanceTypeMismatch {
            expected: TypeToken::of::<H>(),
        })?;
    let message = message
        .downcast::<M>()
        .map_err(|_| CqrsError::MessageTypeMismatch {
            handler: TypeToken::of::<H>(),
            expected: TypeToken::of::<M>(),
        })?;
    Ok((handler, *message))
}

struct CommandInvoker<C, H> {
    _phantom: PhantomData<fn() -> (C, H)>,
}

#[async_trait]
impl<C, H> Invoke for CommandInvoker<C, H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn invoke(
        &self,
        instance: Instance,
        message: AnyMessage,
        cancellation: Option<CancellationToken>,
    ) -> Result<Option<AnyValue>, BoxError> {
        let (handler, command) = downcast_pair::<H, C>(instance, message)?;
        handler
            .handle(command, cancellation)
            .await
            .map_err(Into::<BoxError>::into)?;
        Ok(None)
    }
}

struct CommandWithResultInvoker<C, R, H> {
    _phantom: PhantomData<fn() -> (C, R, H)>,
}

#[async_trait]
impl<C, R, H> Invoke for CommandWithResultInvoker<C, R, H>
where
    C: CommandWithResult<R>,
    R: Send + 'static,
    H: CommandWithResultHandler<C, R>,
{
    async fn invoke(
        &self,
        instance: Instance,
        message: AnyMessage,
        cancellation: Option<CancellationToken>,
    ) -> Result<Option<AnyValue>, BoxError> {
        let (handler, command) = downcast_pair::<H, C>(instance, message)?;
        let value = handler
            .handle(command, cancellation)
            .await
            .map_err(Into::<BoxError>::into)?;
        Ok(Some(Box::new(value)))
    }
}

struct QueryInvoker<Q, R, H> {
    _phantom: PhantomData<fn() -> (Q, R, H)>,
}

#[async_trait]
impl<Q, R, H> Invoke for QueryInvoker<Q, R, H>
where
    Q: Query<R>,
    R: Send + 'static,
    H: QueryHandler<Q, R>,
{
    async fn invoke(
        &self,
        instance: Instance,
        message: AnyMessage,
        cancellation: Option<CancellationToken>,
    ) -> Result<Option<AnyValue>, BoxError> {
        let (handler, query) = downcast_pair::<H, Q>(instance, message)?;
        let value = handler
            .handle(query, cancellation)
            .await
            .map_err(Into::<BoxError>::into)?;
        Ok(Some(Box::new(value)))
    }
}

pub(crate) fn command_invoker<C, H>() -> Arc<dyn Invoke>
where
    C: Command,
    H: CommandHandler<C>,
{
    Arc::new(CommandInvoker::<C, H> {
        _phantom: PhantomData,
    })
}

pub(crate) fn command_with_result_invoker<C, R, H>() -> Arc<dyn Invoke>
where
    C: CommandWithResult<R>,
    R: Send + 'static,
    H: CommandWithResultHandler<C, R>,
{
    Arc::new(CommandWithResultInvoker::<C, R, H> {
        _phantom: PhantomData,
    })
}

pub(crate) fn query_invoker<Q, R, H>() -> Arc<dyn Invoke>
where
    Q: Query<R>,
    R: Send + 'static,
    H: QueryHandler<Q, R>,
{
    Arc::new(QueryInvoker::<Q, R, H> {
        _phantom: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    struct Ping;
    impl Command for Ping {}

    struct Add(u32, u32);
    impl Command for Add {}
    impl CommandWithResult<u32> for Add {}

    struct Echo(String);
    impl Query<String> for Echo {}

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl std::error::Error for Refused {}

    struct Calculator;

    #[async_trait]
    impl CommandHandler<Ping> for Calculator {
        type Error = Refused;

        async fn handle(&self, _: Ping, _: Option<CancellationToken>) -> Result<(), Refused> {
            Err(Refused)
        }
    }

    #[async_trait]
    impl CommandWithResultHandler<Add, u32> for Calculator {
        type Error = BoxError;

        async fn handle(&self, command: Add, _: Option<CancellationToken>) -> Result<u32, BoxError> {
            Ok(command.0 + command.1)
        }
    }

    #[async_trait]
    impl QueryHandler<Echo, String> for Calculator {
        type Error = BoxError;

        async fn handle(
            &self,
            query: Echo,
            cancellation: Option<CancellationToken>,
        ) -> Result<String, BoxError> {
            let cancelled = cancellation.map(|t| t.is_cancelled()).unwrap_or(false);
            Ok(format!("{}:{}", query.0, cancelled))
        }
    }

    fn calculator() -> Instance {
        Arc::new(Calculator)
    }

    #[tokio::test]
    async fn test_command_with_result_invoker() {
        let invoker = command_with_result_invoker::<Add, u32, Calculator>();
        let value = invoker
            .invoke(calculator(), Box::new(Add(2, 3)), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*value.downcast::<u32>().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_query_invoker_threads_cancellation() {
        let invoker = query_invoker::<Echo, String, Calculator>();
        let token = CancellationToken::new();
        token.cancel();
        let value = invoker
            .invoke(calculator(), Box::new(Echo("hi".into())), Some(token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*value.downcast::<String>().unwrap(), "hi:true");
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let invoker = command_invoker::<Ping, Calculator>();
        let err = invoker
            .invoke(calculator(), Box::new(Ping), None)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<Refused>().is_some());
    }

    #[tokio::test]
    async fn test_wrong_instance_type() {
        let invoker = command_invoker::<Ping, Calculator>();
        let err = invoker
            .invoke(Arc::new(42u8), Box::new(Ping), None)
            .await
            .unwrap_err();
        let err = err.downcast::<CqrsError>().unwrap();
        assert!(matches!(*err, CqrsError::InstanceTypeMismatch { expected } if expected.is::<Calculator>()));
    }

    #[tokio::test]
    async fn test_wrong_message_type() {
        let invoker = command_invoker::<Ping, Calculator>();
        let err = invoker
            .invoke(calculator(), Box::new(Add(1, 1)), None)
            .await
            .unwrap_err();
        let err = err.downcast::<CqrsError>().unwrap();
        assert!(matches!(*err, CqrsError::MessageTypeMismatch { .. }));
    }
}
