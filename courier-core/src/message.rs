//! Message taxonomy
//!
//! Three shapes, no behavior:
//!
//! - [`Command`]: an action with no result
//! - [`CommandWithResult<R>`]: an action producing `R`
//! - [`Query<R>`]: a side-effect-free read producing `R`
//!
//! A message is identified by its type alone. Implement the marker that
//! matches the message's shape, then declare it in
//! [`Describe`](crate::Describe) so the registrar can validate handlers
//! against it at runtime.

/// A command with no result.
///
/// Commands represent write operations.
pub trait Command: Send + Sync + 'static {}

/// A command producing a value of type `R`.
///
/// Every command-with-result is also a [`Command`], so both markers are
/// implemented together. Classification still treats such a type as
/// result-bearing only. Sending it through
/// [`CqrsService::send`](crate::CqrsService::send) runs the handler and drops
/// the value.
pub trait CommandWithResult<R>: Command {}

/// A query producing a value of type `R`.
///
/// There is no void query. Use `Option<T>` for queries whose answer may be
/// absent.
pub trait Query<R>: Send + Sync + 'static {}
