//! Declarative description of a module: what it imports, provides and exports.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tessera_inject::{Container, ContainerError, Injectable, Instance, Token, TypeKey};

/// Builds an injectable type through a container.
pub type Constructor = fn(&Container) -> Result<Instance, ContainerError>;

/// One entry of a module's `provides` list.
#[derive(Clone)]
pub enum Provider {
    /// An injectable type, built with the module's container and bound under
    /// its own type.
    Class { key: TypeKey, construct: Constructor },
    /// A ready value bound under an explicit token.
    Value { token: Token, value: Instance },
}

impl Provider {
    pub fn class<T: Injectable>() -> Self {
        Self::Class {
            key: TypeKey::of::<T>(),
            construct: Container::make_instance::<T>,
        }
    }

    pub fn value<T: Any + Send + Sync>(token: impl Into<Token>, value: T) -> Self {
        Self::Value {
            token: token.into(),
            value: Arc::new(value),
        }
    }

    pub fn shared(token: impl Into<Token>, value: Instance) -> Self {
        Self::Value {
            token: token.into(),
            value,
        }
    }

    /// The token this provider binds.
    pub fn token(&self) -> Token {
        match self {
            Self::Class { key, .. } => Token::Type(*key),
            Self::Value { token, .. } => token.clone(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class { key, .. } => f.debug_tuple("Provider::Class").field(key).finish(),
            Self::Value { token, .. } => f.debug_tuple("Provider::Value").field(token).finish(),
        }
    }
}

/// A module type plus its imports, providers and exports.
///
/// Providers are built in declaration order, so a provider can depend on the
/// ones declared before it and on anything already exported globally.
///
/// ```
/// use tessera_inject::{Arguments, ContainerError, Injectable, Token};
/// use tessera_modules::ModuleDescriptor;
///
/// struct CoreModule;
/// struct Clock;
///
/// impl Injectable for CoreModule {
///     fn construct(_: Arguments) -> Result<Self, ContainerError> {
///         Ok(Self)
///     }
/// }
///
/// impl Injectable for Clock {
///     fn construct(_: Arguments) -> Result<Self, ContainerError> {
///         Ok(Self)
///     }
/// }
///
/// let core = ModuleDescriptor::of::<CoreModule>()
///     .provide::<Clock>()
///     .provide_value("frame.rate", 60u32)
///     .export_type::<Clock>();
///
/// assert_eq!(core.provides().len(), 2);
/// assert_eq!(core.exports(), &[Token::of::<Clock>()]);
/// ```
#[derive(Clone)]
pub struct ModuleDescriptor {
    module: TypeKey,
    construct: Constructor,
    imports: Vec<TypeKey>,
    provides: Vec<Provider>,
    exports: Vec<Token>,
}

impl ModuleDescriptor {
    pub fn of<M: Injectable>() -> Self {
        Self {
            module: TypeKey::of::<M>(),
            construct: Container::make_instance::<M>,
            imports: Vec::new(),
            provides: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Require module `M` to be realized before this one.
    pub fn import<M: 'static>(self) -> Self {
        self.import_key(TypeKey::of::<M>())
    }

    pub fn import_key(mut self, key: TypeKey) -> Self {
        self.imports.push(key);
        self
    }

    pub fn provide<P: Injectable>(self) -> Self {
        self.provider(Provider::class::<P>())
    }

    pub fn provide_value<T: Any + Send + Sync>(self, token: impl Into<Token>, value: T) -> Self {
        self.provider(Provider::value(token, value))
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provides.push(provider);
        self
    }

    pub fn export(mut self, token: impl Into<Token>) -> Self {
        self.exports.push(token.into());
        self
    }

    pub fn export_type<T: ?Sized + 'static>(self) -> Self {
        self.export(Token::of::<T>())
    }

    pub fn module(&self) -> TypeKey {
        self.module
    }

    pub fn name(&self) -> &'static str {
        self.module.short_name()
    }

    pub fn imports(&self) -> &[TypeKey] {
        &self.imports
    }

    pub fn provides(&self) -> &[Provider] {
        &self.provides
    }

    pub fn exports(&self) -> &[Token] {
        &self.exports
    }

    pub(crate) fn construct(&self, container: &Container) -> Result<Instance, ContainerError> {
        (self.construct)(container)
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("module", &self.module)
            .field("imports", &self.imports)
            .field("provides", &self.provides)
            .field("exports", &self.exports)
            .finish()
    }
}

/// A module type that carries its own descriptor.
///
/// Implementors still have to be added to a [`crate::ModuleRegistry`] before
/// the factory can realize them by type.
pub trait ModuleDefinition: Injectable {
    fn descriptor() -> ModuleDescriptor;
}
