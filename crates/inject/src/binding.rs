//! Resolution strategies stored in a container.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::container::Container;
use crate::error::ContainerError;
use crate::token::Token;

/// A resolved service. Values are shared by reference between every
/// container and consumer that resolves them.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an instance from the container it is resolved through.
pub type FactoryFn = Arc<dyn Fn(&Container) -> Result<Instance, ContainerError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Value,
    Singleton,
    Factory,
}

/// How a token turns into a value.
///
/// Cloning a binding shares it: a cloned singleton shares its cache.
#[derive(Clone)]
pub enum Binding {
    /// Returned verbatim.
    Value(Instance),
    /// Built on first resolution, cached afterwards.
    Singleton(Arc<SingletonBinding>),
    /// Built fresh on every resolution.
    Factory(FactoryFn),
}

impl Binding {
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::Value(Arc::new(value))
    }

    pub fn singleton(factory: FactoryFn) -> Self {
        Self::Singleton(Arc::new(SingletonBinding::new(factory)))
    }

    pub fn factory(factory: FactoryFn) -> Self {
        Self::Factory(factory)
    }

    pub fn kind(&self) -> BindingKind {
        match self {
            Self::Value(_) => BindingKind::Value,
            Self::Singleton(_) => BindingKind::Singleton,
            Self::Factory(_) => BindingKind::Factory,
        }
    }

    pub(crate) fn resolve(
        &self,
        token: &Token,
        container: &Container,
    ) -> Result<Instance, ContainerError> {
        match self {
            Self::Value(instance) => Ok(Arc::clone(instance)),
            Self::Singleton(singleton) => singleton.resolve(token, container),
            Self::Factory(factory) => (factory.as_ref())(container),
        }
    }

    /// True if both bindings are the same shared binding.
    pub fn same_binding(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => Arc::ptr_eq(a, b),
            (Self::Singleton(a), Self::Singleton(b)) => Arc::ptr_eq(a, b),
            (Self::Factory(a), Self::Factory(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Binding::Value"),
            Self::Singleton(singleton) => f
                .debug_struct("Binding::Singleton")
                .field("resolved", &singleton.is_resolved())
                .finish(),
            Self::Factory(_) => f.write_str("Binding::Factory"),
        }
    }
}

enum SingletonState {
    Empty,
    Resolving,
    Ready(Instance),
}

/// Lazily built, cached instance.
///
/// A factory that fails or panics leaves the singleton empty, so the next
/// resolution runs it again.
pub struct SingletonBinding {
    factory: FactoryFn,
    state: Mutex<SingletonState>,
}

impl SingletonBinding {
    fn new(factory: FactoryFn) -> Self {
        Self {
            factory,
            state: Mutex::new(SingletonState::Empty),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.lock(), SingletonState::Ready(_))
    }

    fn lock(&self) -> MutexGuard<'_, SingletonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, token: &Token, container: &Container) -> Result<Instance, ContainerError> {
        {
            let mut state = self.lock();
            if let SingletonState::Ready(instance) = &*state {
                return Ok(Arc::clone(instance));
            }
            if matches!(*state, SingletonState::Resolving) {
                return Err(ContainerError::CircularDependency(token.clone()));
            }
            *state = SingletonState::Resolving;
        }

        // The lock is released while the factory runs so it can resolve other
        // services through the same container.
        let mut guard = ResolvingGuard {
            binding: self,
            armed: true,
        };
        let result = (self.factory)(container);
        guard.armed = false;

        let mut state = self.lock();
        *state = match &result {
            Ok(instance) => {
                tracing::trace!(token = %token, "Singleton resolved");
                SingletonState::Ready(Arc::clone(instance))
            }
            Err(_) => SingletonState::Empty,
        };
        result
    }
}

/// Returns a singleton to empty if its factory unwinds.
struct ResolvingGuard<'a> {
    binding: &'a SingletonBinding,
    armed: bool,
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.binding.lock() = SingletonState::Empty;
        }
    }
}
