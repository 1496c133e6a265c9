//! Handler registry
//!
//! Two independent tables keyed by message type: commands and queries. Each
//! entry remembers the handler descriptor, the message's declared result type
//! and the invoker chosen at registration, so dispatch never re-derives
//! capabilities. Only the [`Registrar`](crate::Registrar) writes.

use crate::describe::TypeDescriptor;
use crate::handler::Invoke;
use crate::token::{ResultType, TypeToken};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// One committed (message -> handler) mapping.
#[derive(Clone)]
pub(crate) struct HandlerRoute {
    pub(crate) handler: TypeDescriptor,
    pub(crate) result: Option<ResultType>,
    pub(crate) invoker: Arc<dyn Invoke>,
}

/// Message-to-handler mapping, safe for concurrent lookup and registration.
#[derive(Default)]
pub struct HandlerRegistry {
    commands: DashMap<TypeId, HandlerRoute>,
    queries: DashMap<TypeId, HandlerRoute>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler registered for command `message`, if any.
    pub fn try_get_command_handler(&self, message: &TypeToken) -> Option<TypeDescriptor> {
        self.commands
            .get(&message.id())
            .map(|route| route.handler.clone())
    }

    /// Handler registered for query `message`, if any.
    pub fn try_get_query_handler(&self, message: &TypeToken) -> Option<TypeDescriptor> {
        self.queries
            .get(&message.id())
            .map(|route| route.handler.clone())
    }

    pub fn contains_command(&self, message: &TypeToken) -> bool {
        self.commands.contains_key(&message.id())
    }

    pub fn contains_query(&self, message: &TypeToken) -> bool {
        self.queries.contains_key(&message.id())
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    pub(crate) fn command_route(&self, message: TypeId) -> Option<HandlerRoute> {
        self.commands.get(&message).map(|route| route.clone())
    }

    pub(crate) fn query_route(&self, message: TypeId) -> Option<HandlerRoute> {
        self.queries.get(&message).map(|route| route.clone())
    }

    /// Commit a command route; returns the route it replaced.
    pub(crate) fn insert_command(&self, message: TypeToken, route: HandlerRoute) -> Option<HandlerRoute> {
        self.commands.insert(message.id(), route)
    }

    /// Commit a query route; returns the route it replaced.
    pub(crate) fn insert_query(&self, message: TypeToken, route: HandlerRoute) -> Option<HandlerRoute> {
        self.queries.insert(message.id(), route)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("commands", &self.commands.len())
            .field("queries", &self.queries.len())
            .finish()
    }
}
