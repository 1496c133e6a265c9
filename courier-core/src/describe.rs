//! Declared capabilities
//!
//! Rust has no runtime reflection over trait implementations, so every
//! message and handler type lists what it is in a [`Describe`] impl. Each
//! declaration method is bounded by the trait it declares, so a type can only
//! declare contracts it actually implements:
//!
//! ```ignore
//! impl Describe for GetUserByIdHandler {
//!     fn describe(set: &mut CapabilitySet<Self>) {
//!         set.query_handler::<GetUserById, User>().constructor(|| None);
//!     }
//! }
//! ```
//!
//! The resulting [`TypeDescriptor`] is the runtime type token the registrar,
//! registry and instance providers operate on.

use crate::handler::{
    command_invoker, command_with_result_invoker, query_invoker, CommandHandler,
    CommandWithResultHandler, Instance, Invoke, QueryHandler,
};
use crate::message::{Command, CommandWithResult, Query};
use crate::token::{ResultType, TypeToken};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Declares the capability set of a type.
pub trait Describe: Sized + 'static {
    fn describe(set: &mut CapabilitySet<Self>);
}

/// One declared contract.
#[derive(Clone, Debug)]
pub enum Capability {
    /// Plain command.
    Command,
    /// Command producing the given result type.
    CommandWithResult(ResultType),
    /// Query producing the given result type.
    Query(ResultType),
    /// Handles a command (with or without result).
    CommandHandler(HandlerContract),
    /// Handles a query.
    QueryHandler(HandlerContract),
}

/// A handler contract for one (message, result) pair.
#[derive(Clone)]
pub struct HandlerContract {
    message: TypeToken,
    result: Option<ResultType>,
    invoker: Arc<dyn Invoke>,
}

impl HandlerContract {
    pub fn message(&self) -> TypeToken {
        self.message
    }

    /// `None` for plain command handlers.
    pub fn result(&self) -> Option<ResultType> {
        self.result
    }

    pub(crate) fn invoker(&self) -> Arc<dyn Invoke> {
        Arc::clone(&self.invoker)
    }

    /// Whether this contract covers `message` producing `result`.
    pub fn matches(&self, message: TypeToken, result: Option<TypeToken>) -> bool {
        self.message == message && self.result.map(|r| r.token()) == result
    }
}

impl fmt::Debug for HandlerContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContract")
            .field("message", &self.message)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

type Constructor = Arc<dyn Fn() -> Option<Instance> + Send + Sync>;

/// How an on-demand provider may build a value of the type.
#[derive(Clone)]
pub(crate) enum Construction {
    /// No construction path declared.
    Unavailable,
    /// Trait-object-backed or otherwise abstract; never constructible.
    Abstract,
    Constructor(Constructor),
}

/// Builder handed to [`Describe::describe`].
pub struct CapabilitySet<T> {
    capabilities: Vec<Capability>,
    construction: Construction,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Describe> CapabilitySet<T> {
    fn new() -> Self {
        Self {
            capabilities: Vec::new(),
            construction: Construction::Unavailable,
            _phantom: PhantomData,
        }
    }

    /// Declare `T` a plain command.
    pub fn command(&mut self) -> &mut Self
    where
        T: Command,
    {
        self.capabilities.push(Capability::Command);
        self
    }

    /// Declare `T` a command producing `R`.
    ///
    /// An `Option<_>` result declared here fails classification; use
    /// [`command_with_optional_result`](Self::command_with_optional_result).
    pub fn command_with_result<R>(&mut self) -> &mut Self
    where
        T: CommandWithResult<R>,
        R: Send + 'static,
    {
        self.capabilities
            .push(Capability::CommandWithResult(ResultType::of::<R>()));
        self
    }

    /// Declare `T` a command producing `Option<V>`, absent when the handler
    /// yields nothing.
    pub fn command_with_optional_result<V>(&mut self) -> &mut Self
    where
        T: CommandWithResult<Option<V>>,
        V: Send + 'static,
    {
        self.capabilities
            .push(Capability::CommandWithResult(ResultType::optional::<V>()));
        self
    }

    /// Declare `T` a query producing `R`. `Option<_>` results go through
    /// [`optional_query`](Self::optional_query).
    pub fn query<R>(&mut self) -> &mut Self
    where
        T: Query<R>,
        R: Send + 'static,
    {
        self.capabilities.push(Capability::Query(ResultType::of::<R>()));
        self
    }

    /// Declare `T` a query producing `Option<V>`.
    pub fn optional_query<V>(&mut self) -> &mut Self
    where
        T: Query<Option<V>>,
        V: Send + 'static,
    {
        self.capabilities
            .push(Capability::Query(ResultType::optional::<V>()));
        self
    }

    /// Declare `T` a handler of plain command `C`.
    pub fn command_handler<C>(&mut self) -> &mut Self
    where
        C: Command,
        T: CommandHandler<C>,
    {
        self.capabilities
            .push(Capability::CommandHandler(HandlerContract {
                message: TypeToken::of::<C>(),
                result: None,
                invoker: command_invoker::<C, T>(),
            }));
        self
    }

    /// Declare `T` a handler of command `C` producing `R`.
    pub fn command_with_result_handler<C, R>(&mut self) -> &mut Self
    where
        C: CommandWithResult<R>,
        R: Send + 'static,
        T: CommandWithResultHandler<C, R>,
    {
        self.capabilities
            .push(Capability::CommandHandler(HandlerContract {
                message: TypeToken::of::<C>(),
                result: Some(ResultType::of::<R>()),
                invoker: command_with_result_invoker::<C, R, T>(),
            }));
        self
    }

    /// Declare `T` a handler of query `Q` producing `R`.
    pub fn query_handler<Q, R>(&mut self) -> &mut Self
    where
        Q: Query<R>,
        R: Send + 'static,
        T: QueryHandler<Q, R>,
    {
        self.capabilities.push(Capability::QueryHandler(HandlerContract {
            message: TypeToken::of::<Q>(),
            result: Some(ResultType::of::<R>()),
            invoker: query_invoker::<Q, R, T>(),
        }));
        self
    }

    /// On-demand construction through `Default`.
    pub fn default_constructible(&mut self) -> &mut Self
    where
        T: Default + Send + Sync,
    {
        self.construction =
            Construction::Constructor(Arc::new(|| Some(Arc::new(T::default()) as Instance)));
        self
    }

    /// On-demand construction through `constructor`; `None` means construction failed.
    pub fn constructor(&mut self, constructor: fn() -> Option<T>) -> &mut Self
    where
        T: Send + Sync,
    {
        self.construction = Construction::Constructor(Arc::new(move || {
            constructor().map(|value| Arc::new(value) as Instance)
        }));
        self
    }

    /// Mark `T` abstract. On-demand providers refuse to build it.
    pub fn abstract_type(&mut self) -> &mut Self {
        self.construction = Construction::Abstract;
        self
    }
}

struct DescriptorInner {
    token: TypeToken,
    capabilities: Vec<Capability>,
    construction: Construction,
}

/// Runtime token for a message or handler type, with its declared capabilities.
///
/// Cloning is cheap.
#[derive(Clone)]
pub struct TypeDescriptor {
    inner: Arc<DescriptorInner>,
}

impl TypeDescriptor {
    /// Descriptor built from `T`'s [`Describe`] impl.
    pub fn of<T: Describe>() -> Self {
        let mut set = CapabilitySet::<T>::new();
        T::describe(&mut set);
        Self {
            inner: Arc::new(DescriptorInner {
                token: TypeToken::of::<T>(),
                capabilities: set.capabilities,
                construction: set.construction,
            }),
        }
    }

    /// Descriptor for a type with no declared capabilities.
    pub fn opaque<T: ?Sized + 'static>() -> Self {
        Self {
            inner: Arc::new(DescriptorInner {
                token: TypeToken::of::<T>(),
                capabilities: Vec::new(),
                construction: Construction::Unavailable,
            }),
        }
    }

    pub fn token(&self) -> TypeToken {
        self.inner.token
    }

    /// Short type name.
    pub fn name(&self) -> String {
        self.inner.token.name()
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.inner.capabilities
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.inner.construction, Construction::Abstract)
    }

    pub fn is_constructible(&self) -> bool {
        matches!(self.inner.construction, Construction::Constructor(_))
    }

    /// Whether any command-handler or query-handler contract is declared.
    pub fn is_handler(&self) -> bool {
        self.inner.capabilities.iter().any(|c| {
            matches!(
                c,
                Capability::CommandHandler(_) | Capability::QueryHandler(_)
            )
        })
    }

    pub(crate) fn construction(&self) -> &Construction {
        &self.inner.construction
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.inner.token == other.inner.token
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner.token, f)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("token", &self.inner.token)
            .field("capabilities", &self.inner.capabilities)
            .field("abstract", &self.is_abstract())
            .field("constructible", &self.is_constructible())
            .finish()
    }
}
