//! Token-keyed service container.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::binding::{Binding, FactoryFn, Instance};
use crate::error::ContainerError;
use crate::injectable::{Arguments, InjectionMetadata, Injectable};
use crate::token::Token;

/// Maps tokens to bindings and builds injectable types.
///
/// The container owns its binding map. [`Container::merge`] and `Clone` copy
/// bindings by reference, so values and singleton caches are shared with the
/// source container.
#[derive(Clone, Default)]
pub struct Container {
    bindings: HashMap<Token, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fixed value, replacing any previous binding for `token`.
    pub fn bind<T: Any + Send + Sync>(&mut self, token: impl Into<Token>, value: T) -> &mut Self {
        self.insert(token.into(), Binding::value(value))
    }

    /// Bind an already shared value.
    pub fn bind_shared<T: Any + Send + Sync>(
        &mut self,
        token: impl Into<Token>,
        value: Arc<T>,
    ) -> &mut Self {
        self.insert(token.into(), Binding::Value(value))
    }

    pub fn bind_instance(&mut self, token: impl Into<Token>, instance: Instance) -> &mut Self {
        self.insert(token.into(), Binding::Value(instance))
    }

    /// Bind a value under its own type.
    pub fn instance<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.bind(Token::of::<T>(), value)
    }

    /// Bind a factory that runs on first resolution; the result is cached.
    pub fn singleton<T, F>(&mut self, token: impl Into<Token>, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.insert(token.into(), Binding::singleton(erase(factory)))
    }

    /// Bind a factory that runs on every resolution.
    pub fn factory<T, F>(&mut self, token: impl Into<Token>, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.insert(token.into(), Binding::factory(erase(factory)))
    }

    /// Store a binding as is. Last write wins.
    pub fn insert(&mut self, token: Token, binding: Binding) -> &mut Self {
        trace!(token = %token, kind = ?binding.kind(), "Binding");
        self.bindings.insert(token, binding);
        self
    }

    pub fn unbind(&mut self, token: &Token) -> Option<Binding> {
        self.bindings.remove(token)
    }

    pub fn binding(&self, token: &Token) -> Option<&Binding> {
        self.bindings.get(token)
    }

    pub fn has(&self, token: &Token) -> bool {
        self.bindings.contains_key(token)
    }

    /// Resolve `token` to its untyped instance.
    pub fn get(&self, token: &Token) -> Result<Instance, ContainerError> {
        let binding = self
            .bindings
            .get(token)
            .ok_or_else(|| ContainerError::UnknownBinding(token.clone()))?;
        binding.resolve(token, self)
    }

    /// Resolve `token` and downcast it to `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, token: &Token) -> Result<Arc<T>, ContainerError> {
        self.get(token)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                token: token.clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolve the binding keyed by `T`'s own type.
    pub fn get_type<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.resolve(&Token::of::<T>())
    }

    /// Build a new `T`, resolving its declared dependencies.
    ///
    /// With metadata of `n` parameters and `k` extra values, the first `n - k`
    /// parameters come from the container and `extra` fills the rest. Without
    /// metadata, `extra` is passed through as is.
    pub fn make<T: Injectable>(&self, extra: Vec<Instance>) -> Result<T, ContainerError> {
        let target = std::any::type_name::<T>();
        let values = match T::injection() {
            None => extra.into_iter().map(Some).collect(),
            Some(metadata) => {
                let resolved = metadata.len().saturating_sub(extra.len());
                let mut values = Vec::with_capacity(resolved + extra.len());
                for index in 0..resolved {
                    values.push(self.resolve_parameter(target, &metadata, index)?);
                }
                values.extend(extra.into_iter().map(Some));
                values
            }
        };

        trace!(target, args = values.len(), "Constructing");
        T::construct(Arguments::new(target, values))
    }

    /// [`Container::make`] without extra arguments, shared as an instance.
    pub fn make_instance<T: Injectable>(&self) -> Result<Instance, ContainerError> {
        self.make::<T>(Vec::new())
            .map(|value| Arc::new(value) as Instance)
    }

    /// Copy every binding of `other` into `self`. Last write wins.
    pub fn merge(&mut self, other: &Container) -> &mut Self {
        for (token, binding) in &other.bindings {
            self.bindings.insert(token.clone(), binding.clone());
        }
        self
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn resolve_parameter(
        &self,
        target: &'static str,
        metadata: &InjectionMetadata,
        index: usize,
    ) -> Result<Option<Instance>, ContainerError> {
        let param = metadata
            .parameter(index)
            .ok_or(ContainerError::UnspecifiedParameter { target, index })?;

        if !self.has(param.token) {
            if param.optional {
                return Ok(None);
            }
            return Err(ContainerError::Injection {
                target,
                index,
                token: param.token.clone(),
            });
        }
        self.get(param.token).map(Some)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.bindings.iter()).finish()
    }
}

fn erase<T, F>(factory: F) -> FactoryFn
where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
{
    Arc::new(move |container: &Container| {
        factory(container).map(|value| Arc::new(value) as Instance)
    })
}
