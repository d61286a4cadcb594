//! Binding keys.
//!
//! A [`Token`] is a type, a name, a number or a [`Symbol`]. Type tokens are
//! keyed by `TypeId`, so two tokens for the same Rust type are always equal
//! no matter where they were created.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

/// Stable identity of a Rust type, with its name kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path (generic arguments keep theirs).
    pub fn short_name(&self) -> &'static str {
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A unique token. Two symbols never compare equal, even with the same
/// description.
#[derive(Clone)]
pub struct Symbol {
    id: Uuid,
    description: Cow<'static, str>,
}

impl Symbol {
    pub fn new(description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Key of a binding in a [`crate::Container`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Type(TypeKey),
    Name(Cow<'static, str>),
    Number(i64),
    Symbol(Symbol),
}

impl Token {
    /// Token for a type, used for class bindings and `instance`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Name(name.into())
    }

    pub fn number(number: i64) -> Self {
        Self::Number(number)
    }

    /// A fresh, unique symbol token.
    pub fn symbol(description: impl Into<Cow<'static, str>>) -> Self {
        Self::Symbol(Symbol::new(description))
    }

    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            Self::Type(key) => Some(*key),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "{key}"),
            Self::Name(name) => write!(f, "{name:?}"),
            Self::Number(number) => write!(f, "#{number}"),
            Self::Symbol(symbol) => write!(f, "{symbol:?}"),
        }
    }
}

impl From<TypeKey> for Token {
    fn from(value: TypeKey) -> Self {
        Self::Type(value)
    }
}

impl From<&'static str> for Token {
    fn from(value: &'static str) -> Self {
        Self::Name(Cow::Borrowed(value))
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self::Name(Cow::Owned(value))
    }
}

impl From<i64> for Token {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<Symbol> for Token {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}
