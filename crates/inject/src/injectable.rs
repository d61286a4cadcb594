//! Constructor injection.
//!
//! A type opts in by implementing [`Injectable`]. Its [`InjectionMetadata`]
//! lists the token for each constructor parameter, in order; the container
//! resolves them and hands them to [`Injectable::construct`] as
//! [`Arguments`].

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::binding::Instance;
use crate::error::ContainerError;
use crate::token::Token;

/// Explicit token for one parameter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamOverride {
    pub token: Token,
    /// Resolve to nothing instead of failing when the token is unbound.
    pub optional: bool,
}

/// The token the container resolves for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter<'a> {
    pub token: &'a Token,
    pub optional: bool,
}

/// Ordered constructor parameter tokens plus positional overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionMetadata {
    params: Vec<Token>,
    overrides: BTreeMap<usize, ParamOverride>,
}

impl InjectionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter resolved by its type.
    pub fn param<T: ?Sized + 'static>(self) -> Self {
        self.param_token(Token::of::<T>())
    }

    /// Append a parameter resolved by an explicit token.
    pub fn param_token(mut self, token: impl Into<Token>) -> Self {
        self.params.push(token.into());
        self
    }

    /// Replace the token used at `index`.
    pub fn inject(mut self, index: usize, token: impl Into<Token>) -> Self {
        self.overrides.insert(
            index,
            ParamOverride {
                token: token.into(),
                optional: false,
            },
        );
        self
    }

    /// Replace the token used at `index` and tolerate it being unbound.
    pub fn optional(mut self, index: usize, token: impl Into<Token>) -> Self {
        self.overrides.insert(
            index,
            ParamOverride {
                token: token.into(),
                optional: true,
            },
        );
        self
    }

    /// Number of parameter positions, counting override-only positions.
    pub fn len(&self) -> usize {
        let overridden = self
            .overrides
            .keys()
            .next_back()
            .map_or(0, |last| last + 1);
        self.params.len().max(overridden)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token for `index`, with overrides taking precedence.
    pub fn parameter(&self, index: usize) -> Option<Parameter<'_>> {
        if let Some(over) = self.overrides.get(&index) {
            return Some(Parameter {
                token: &over.token,
                optional: over.optional,
            });
        }
        self.params.get(index).map(|token| Parameter {
            token,
            optional: false,
        })
    }
}

/// A type the container can build with [`crate::Container::make`].
pub trait Injectable: Any + Send + Sync + Sized {
    /// Constructor parameter tokens. `None` means arguments are passed through
    /// from the caller untouched.
    fn injection() -> Option<InjectionMetadata> {
        None
    }

    fn construct(args: Arguments) -> Result<Self, ContainerError>;
}

/// Positional constructor arguments, consumed front to back.
pub struct Arguments {
    target: &'static str,
    values: std::vec::IntoIter<Option<Instance>>,
    index: usize,
}

impl Arguments {
    pub fn new(target: &'static str, values: Vec<Option<Instance>>) -> Self {
        Self {
            target,
            values: values.into_iter(),
            index: 0,
        }
    }

    /// Name of the type being constructed.
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Take the next argument, failing if it is absent.
    pub fn required<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>, ContainerError> {
        let index = self.index;
        match self.values.next() {
            Some(Some(value)) => {
                self.index += 1;
                self.downcast(index, value)
            }
            Some(None) => {
                self.index += 1;
                Err(ContainerError::MissingArgument {
                    target: self.target,
                    index,
                })
            }
            None => Err(ContainerError::MissingArgument {
                target: self.target,
                index,
            }),
        }
    }

    /// Take the next argument, which may have been resolved to nothing.
    pub fn optional<T: Any + Send + Sync>(&mut self) -> Result<Option<Arc<T>>, ContainerError> {
        let index = self.index;
        match self.values.next() {
            Some(value) => {
                self.index += 1;
                value.map(|value| self.downcast(index, value)).transpose()
            }
            None => Ok(None),
        }
    }

    /// Take the next argument by value.
    pub fn value<T: Any + Send + Sync + Clone>(&mut self) -> Result<T, ContainerError> {
        self.required::<T>().map(|value| T::clone(&value))
    }

    fn downcast<T: Any + Send + Sync>(
        &self,
        index: usize,
        value: Instance,
    ) -> Result<Arc<T>, ContainerError> {
        value
            .downcast::<T>()
            .map_err(|_| ContainerError::ArgumentType {
                target: self.target,
                index,
                expected: std::any::type_name::<T>(),
            })
    }
}
