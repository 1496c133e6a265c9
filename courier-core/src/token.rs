//! Runtime type identity
//!
//! Every message and handler is identified by a [`TypeToken`]: a `TypeId`
//! paired with the type's name for diagnostics. Tokens compare and hash by
//! `TypeId` alone, so they are usable as map keys regardless of how the name
//! is rendered.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identity of a Rust type.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Token for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name as reported by the compiler.
    pub fn full_name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped, e.g. `Option<User>`.
    pub fn name(&self) -> String {
        short_type_name(self.name)
    }

    /// Whether this token identifies `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Whether this token identifies some `Option<_>`.
    pub fn is_option(&self) -> bool {
        self.name.starts_with(option_prefix())
    }
}

fn option_prefix() -> &'static str {
    let name = type_name::<Option<()>>();
    name.strip_suffix("()>").unwrap_or(name)
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

/// Type-erased result value travelling from a handler back to the caller.
pub(crate) type AnyValue = Box<dyn Any + Send>;

fn absent_value<T: Send + 'static>() -> AnyValue {
    Box::new(Option::<T>::None)
}

/// Result type declared by a command or query contract.
///
/// Nullable result types (`Option<T>`) know how to produce their absent
/// value; everything else is non-nullable.
#[derive(Clone, Copy)]
pub struct ResultType {
    token: TypeToken,
    absent: Option<fn() -> AnyValue>,
}

impl ResultType {
    /// Non-nullable result type `R`.
    pub fn of<R: Send + 'static>() -> Self {
        Self {
            token: TypeToken::of::<R>(),
            absent: None,
        }
    }

    /// Nullable result type `Option<T>`.
    pub fn optional<T: Send + 'static>() -> Self {
        Self {
            token: TypeToken::of::<Option<T>>(),
            absent: Some(absent_value::<T>),
        }
    }

    pub fn token(&self) -> TypeToken {
        self.token
    }

    pub fn is_nullable(&self) -> bool {
        self.absent.is_some()
    }

    /// An `Option<_>` declared through [`ResultType::of`]: it can be empty
    /// but carries no absent value.
    pub fn is_unmarked_option(&self) -> bool {
        !self.is_nullable() && self.token.is_option()
    }

    /// The boxed absent value, for nullable result types only.
    pub(crate) fn absent_value(&self) -> Option<AnyValue> {
        self.absent.map(|absent| absent())
    }
}

impl PartialEq for ResultType {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for ResultType {}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.token, f)
    }
}

impl fmt::Debug for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultType")
            .field("token", &self.token)
            .field("nullable", &self.is_nullable())
            .finish()
    }
}

fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            c if c.is_alphanumeric() || c == '_' => segment.push(c),
            c => {
                out.push_str(&segment);
                segment.clear();
                out.push(c);
            }
        }
    }
    out.push_str(&segment);
    out
}
