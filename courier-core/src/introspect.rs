//! Capability introspection
//!
//! Answers shape questions about a [`TypeDescriptor`]: is it a command, of
//! which flavor, with which result; is it a query; which handler contracts
//! does it declare. Matching is nominal over declared capabilities.

use crate::describe::{Capability, Describe, HandlerContract, TypeDescriptor};
use crate::error::{CqrsError, Result};
use crate::token::{ResultType, TypeToken};
use courier_log::trace;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::TypeId;

/// What to do when a type declares more than one `Query<_>` or
/// `CommandWithResult<_>` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Fail with [`CqrsError::AmbiguousContract`].
    #[default]
    Reject,
    /// Use the first declared contract.
    FirstDeclared,
}

impl AmbiguityPolicy {
    /// Parse `reject` / `first_declared` (also `first-declared`, `first`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" | "strict" => Some(Self::Reject),
            "first_declared" | "first-declared" | "first" => Some(Self::FirstDeclared),
            _ => None,
        }
    }
}

/// Command flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Plain,
    WithResult(ResultType),
}

impl CommandKind {
    pub fn result(&self) -> Option<ResultType> {
        match self {
            CommandKind::Plain => None,
            CommandKind::WithResult(result) => Some(*result),
        }
    }
}

/// Handler contracts declared by one type.
#[derive(Debug, Clone)]
pub struct HandlerShape {
    handler: TypeToken,
    command_contracts: Vec<HandlerContract>,
    query_contracts: Vec<HandlerContract>,
}

impl HandlerShape {
    pub fn handler(&self) -> TypeToken {
        self.handler
    }

    pub fn is_command_handler(&self) -> bool {
        !self.command_contracts.is_empty()
    }

    pub fn is_query_handler(&self) -> bool {
        !self.query_contracts.is_empty()
    }

    pub fn is_handler(&self) -> bool {
        self.is_command_handler() || self.is_query_handler()
    }

    pub fn command_contracts(&self) -> &[HandlerContract] {
        &self.command_contracts
    }

    pub fn query_contracts(&self) -> &[HandlerContract] {
        &self.query_contracts
    }

    /// Command contract for `message`; `result` is `None` for plain commands.
    pub fn command_contract(
        &self,
        message: TypeToken,
        result: Option<TypeToken>,
    ) -> Option<&HandlerContract> {
        self.command_contracts
            .iter()
            .find(|c| c.matches(message, result))
    }

    pub fn query_contract(&self, message: TypeToken, result: TypeToken) -> Option<&HandlerContract> {
        self.query_contracts
            .iter()
            .find(|c| c.matches(message, Some(result)))
    }
}

/// Classifies descriptors and caches descriptors built from [`Describe`].
pub struct Introspector {
    policy: AmbiguityPolicy,
    descriptors: DashMap<TypeId, TypeDescriptor>,
}

impl Introspector {
    pub fn new(policy: AmbiguityPolicy) -> Self {
        Self {
            policy,
            descriptors: DashMap::new(),
        }
    }

    pub fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    /// Cached descriptor for `T`.
    pub fn describe<T: Describe>(&self) -> TypeDescriptor {
        self.descriptors
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                trace!(ty = std::any::type_name::<T>(), "Building type descriptor");
                TypeDescriptor::of::<T>()
            })
            .clone()
    }

    pub fn classify_command(&self, ty: &TypeDescriptor) -> Result<CommandKind> {
        let mut plain = false;
        let mut results = Vec::new();
        for capability in ty.capabilities() {
            match capability {
                Capability::Command => plain = true,
                Capability::CommandWithResult(result) => push_unique(&mut results, *result),
                _ => {}
            }
        }

        if let Some(result) = self.pick(ty, "CommandWithResult<_>", results)? {
            return Ok(CommandKind::WithResult(marked(ty, result)?));
        }
        if plain {
            Ok(CommandKind::Plain)
        } else {
            Err(CqrsError::NotCommand {
                message: ty.token(),
            })
        }
    }

    /// Result type of a query.
    pub fn classify_query(&self, ty: &TypeDescriptor) -> Result<ResultType> {
        let mut results = Vec::new();
        for capability in ty.capabilities() {
            if let Capability::Query(result) = capability {
                push_unique(&mut results, *result);
            }
        }

        let result = self
            .pick(ty, "Query<_>", results)?
            .ok_or(CqrsError::NotQuery {
                message: ty.token(),
            })?;
        marked(ty, result)
    }

    pub fn classify_handler(&self, ty: &TypeDescriptor) -> HandlerShape {
        let mut command_contracts = Vec::new();
        let mut query_contracts = Vec::new();
        for capability in ty.capabilities() {
            match capability {
                Capability::CommandHandler(contract) => command_contracts.push(contract.clone()),
                Capability::QueryHandler(contract) => query_contracts.push(contract.clone()),
                _ => {}
            }
        }

        HandlerShape {
            handler: ty.token(),
            command_contracts,
            query_contracts,
        }
    }

    fn pick(
        &self,
        ty: &TypeDescriptor,
        contract: &'static str,
        candidates: Vec<ResultType>,
    ) -> Result<Option<ResultType>> {
        if candidates.len() > 1 && self.policy == AmbiguityPolicy::Reject {
            return Err(CqrsError::AmbiguousContract {
                ty: ty.token(),
                contract,
                candidates: candidates.iter().map(ResultType::token).collect(),
            });
        }
        Ok(candidates.first().copied())
    }
}

impl Default for Introspector {
    fn default() -> Self {
        Self::new(AmbiguityPolicy::default())
    }
}

/// `Option<_>` results must be declared optional so an empty answer has a value.
fn marked(ty: &TypeDescriptor, result: ResultType) -> Result<ResultType> {
    if result.is_unmarked_option() {
        return Err(CqrsError::UnmarkedOptionalResult {
            message: ty.token(),
            result: result.token(),
        });
    }
    Ok(result)
}

fn push_unique(results: &mut Vec<ResultType>, result: ResultType) {
    if !results.contains(&result) {
        results.push(result);
    }
}
