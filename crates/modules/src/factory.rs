//! Realizes module descriptors on top of the container.
//!
//! Every module gets a private container seeded from the factory's global
//! container. Its providers are built into that private container in
//! declaration order, the declared exports are copied back to the global
//! container, and finally the module type itself is built from the private
//! container.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use tessera_inject::{Binding, Container, ContainerError, Token, TypeKey};

use crate::descriptor::{ModuleDescriptor, Provider};
use crate::error::ModuleError;
use crate::registry::ModuleRegistry;

/// A realized module: its private container and its instance.
pub struct Module {
    key: TypeKey,
    container: Container,
    instance: tessera_inject::Instance,
}

impl Module {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    /// Global bindings at creation time plus the module's own providers.
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn instance(&self) -> &tessera_inject::Instance {
        &self.instance
    }

    pub fn downcast<M: Send + Sync + 'static>(&self) -> Option<Arc<M>> {
        Arc::clone(&self.instance).downcast::<M>().ok()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("key", &self.key)
            .field("bindings", &self.container.len())
            .finish()
    }
}

/// What to realize: a registered module type, or a descriptor given inline.
#[derive(Debug, Clone)]
pub enum ModuleSource {
    Class(TypeKey),
    Descriptor(ModuleDescriptor),
}

impl ModuleSource {
    pub fn class<M: 'static>() -> Self {
        Self::Class(TypeKey::of::<M>())
    }
}

impl From<ModuleDescriptor> for ModuleSource {
    fn from(value: ModuleDescriptor) -> Self {
        Self::Descriptor(value)
    }
}

impl From<TypeKey> for ModuleSource {
    fn from(value: TypeKey) -> Self {
        Self::Class(value)
    }
}

/// Builds modules and keeps the registry of realized ones.
///
/// A module type is realized at most once per factory. Imports are checked,
/// not resolved: [`ModuleFactory::create`] expects its caller to go leaves
/// first, while [`ModuleFactory::create_all`] sorts a batch itself.
pub struct ModuleFactory {
    global: Container,
    registry: ModuleRegistry,
    modules: HashMap<TypeKey, Module>,
    order: Vec<TypeKey>,
}

impl ModuleFactory {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self::with_global(Container::new(), registry)
    }

    /// Start from a pre-populated global container.
    pub fn with_global(global: Container, registry: ModuleRegistry) -> Self {
        Self {
            global,
            registry,
            modules: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Bindings exported by every module created so far.
    pub fn global(&self) -> &Container {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut Container {
        &mut self.global
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// Fail unless every import of `descriptor` is already realized.
    pub fn validate_imports(&self, descriptor: &ModuleDescriptor) -> Result<(), ModuleError> {
        match descriptor
            .imports()
            .iter()
            .find(|import| !self.modules.contains_key(import))
        {
            Some(import) => Err(ModuleError::MissingDependency {
                module: descriptor.name(),
                import: import.short_name(),
            }),
            None => Ok(()),
        }
    }

    /// Copy the bindings for `tokens` from `source` into the global container.
    ///
    /// Nothing is copied if any token is unbound in `source`.
    pub fn export(&mut self, source: &Container, tokens: &[Token]) -> Result<(), ModuleError> {
        let staged = stage_exports("container", source, tokens)?;
        self.commit_exports(staged);
        Ok(())
    }

    /// Realize a module from its descriptor.
    pub fn from_data(&mut self, descriptor: ModuleDescriptor) -> Result<&Module, ModuleError> {
        let key = descriptor.module();
        let name = descriptor.name();

        self.validate_imports(&descriptor)?;
        if self.modules.contains_key(&key) {
            return Err(ModuleError::DuplicateModule(name));
        }

        let mut container = Container::new();
        container.merge(&self.global);

        for (position, provider) in descriptor.provides().iter().enumerate() {
            match provider {
                Provider::Class {
                    key: provider_key,
                    construct,
                } => {
                    let instance = construct(&container).map_err(|source| {
                        provider_error(&descriptor, position, *provider_key, source)
                    })?;
                    debug!(module = name, provider = %provider_key, "Provider created");
                    container.bind_instance(Token::Type(*provider_key), instance);
                }
                Provider::Value { token, value } => {
                    container.bind_instance(token.clone(), Arc::clone(value));
                }
            }
        }

        // Exports are checked before the module is built but only published
        // once it exists, so a failed build leaves the global container alone.
        let staged = stage_exports(name, &container, descriptor.exports())?;
        let instance = descriptor.construct(&container)?;
        let exported = staged.len();
        self.commit_exports(staged);

        info!(
            module = name,
            providers = descriptor.provides().len(),
            exports = exported,
            "Module created"
        );

        self.order.push(key);
        let module = self.modules.entry(key).or_insert(Module {
            key,
            container,
            instance,
        });
        Ok(&*module)
    }

    /// Realize a registered module type.
    pub fn from_class(&mut self, key: TypeKey) -> Result<&Module, ModuleError> {
        let descriptor = self.descriptor_for(ModuleSource::Class(key))?;
        self.from_data(descriptor)
    }

    pub fn create(&mut self, source: impl Into<ModuleSource>) -> Result<&Module, ModuleError> {
        match source.into() {
            ModuleSource::Class(key) => self.from_class(key),
            ModuleSource::Descriptor(descriptor) => self.from_data(descriptor),
        }
    }

    /// Realize a batch of modules, ordering it so imports come first.
    ///
    /// Imports outside the batch must already be realized. Returns the module
    /// keys in the order they were created.
    pub fn create_all<I>(&mut self, sources: I) -> Result<Vec<TypeKey>, ModuleError>
    where
        I: IntoIterator<Item = ModuleSource>,
    {
        let mut pending: Vec<ModuleDescriptor> = Vec::new();
        for source in sources {
            let descriptor = self.descriptor_for(source)?;
            if pending.iter().any(|d| d.module() == descriptor.module()) {
                return Err(ModuleError::DuplicateModule(descriptor.name()));
            }
            pending.push(descriptor);
        }

        let ordered = dependency_order(pending)?;
        let mut created = Vec::with_capacity(ordered.len());
        for descriptor in ordered {
            let key = descriptor.module();
            self.from_data(descriptor)?;
            created.push(key);
        }
        Ok(created)
    }

    /// Realized modules in creation order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.order.iter().filter_map(|key| self.modules.get(key))
    }

    pub fn module(&self, key: &TypeKey) -> Option<&Module> {
        self.modules.get(key)
    }

    /// The instance of realized module `M`.
    pub fn instance_of<M: Send + Sync + 'static>(&self) -> Option<Arc<M>> {
        self.module(&TypeKey::of::<M>())
            .and_then(Module::downcast::<M>)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.modules.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn descriptor_for(&self, source: ModuleSource) -> Result<ModuleDescriptor, ModuleError> {
        match source {
            ModuleSource::Class(key) => self
                .registry
                .lookup(&key)
                .cloned()
                .ok_or(ModuleError::MissingMetadata(key.short_name())),
            ModuleSource::Descriptor(descriptor) => Ok(descriptor),
        }
    }

    fn commit_exports(&mut self, staged: Vec<(Token, Binding)>) {
        for (token, binding) in staged {
            self.global.insert(token, binding);
        }
    }
}

impl std::fmt::Debug for ModuleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleFactory")
            .field("modules", &self.modules().map(Module::name).collect::<Vec<_>>())
            .field("global", &self.global.len())
            .field("registered", &self.registry.len())
            .finish()
    }
}

fn stage_exports(
    module: &'static str,
    source: &Container,
    tokens: &[Token],
) -> Result<Vec<(Token, Binding)>, ModuleError> {
    tokens
        .iter()
        .map(|token| {
            source
                .binding(token)
                .map(|binding| (token.clone(), binding.clone()))
                .ok_or_else(|| ModuleError::UnexportedBinding {
                    module,
                    token: token.clone(),
                })
        })
        .collect()
}

/// Tell a provider declared too early apart from a plain construction failure.
fn provider_error(
    descriptor: &ModuleDescriptor,
    position: usize,
    provider: TypeKey,
    source: ContainerError,
) -> ModuleError {
    if let Some(missing) = source.missing_token() {
        let declared_later = descriptor.provides()[position + 1..]
            .iter()
            .any(|later| &later.token() == missing);
        if declared_later {
            return ModuleError::ProviderOrder {
                module: descriptor.name(),
                provider: provider.short_name(),
                dependency: missing.clone(),
            };
        }
    }
    ModuleError::Provider {
        module: descriptor.name(),
        provider: provider.short_name(),
        source,
    }
}

/// Stable topological order of a batch by imports within the batch.
fn dependency_order(
    mut pending: Vec<ModuleDescriptor>,
) -> Result<Vec<ModuleDescriptor>, ModuleError> {
    let batch: HashSet<TypeKey> = pending.iter().map(ModuleDescriptor::module).collect();
    let mut placed: HashSet<TypeKey> = HashSet::with_capacity(pending.len());
    let mut ordered = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending.iter().position(|descriptor| {
            descriptor
                .imports()
                .iter()
                .all(|import| !batch.contains(import) || placed.contains(import))
        });
        let Some(index) = ready else {
            return Err(ModuleError::ImportCycle(
                pending.iter().map(ModuleDescriptor::name).collect(),
            ));
        };

        let descriptor = pending.remove(index);
        placed.insert(descriptor.module());
        ordered.push(descriptor);
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use tessera_inject::{Arguments, Injectable};

    use super::*;

    macro_rules! unit_module {
        ($name:ident) => {
            struct $name;

            impl Injectable for $name {
                fn construct(_: Arguments) -> Result<Self, ContainerError> {
                    Ok(Self)
                }
            }
        };
    }

    unit_module!(Core);
    unit_module!(Render);
    unit_module!(Ui);

    #[test]
    fn dependency_order_puts_imports_first_and_keeps_input_order() {
        let ui = ModuleDescriptor::of::<Ui>().import::<Render>().import::<Core>();
        let render = ModuleDescriptor::of::<Render>().import::<Core>();
        let core = ModuleDescriptor::of::<Core>();

        let ordered = dependency_order(vec![ui, render, core]).expect("acyclic");
        let names: Vec<_> = ordered.iter().map(ModuleDescriptor::name).collect();

        assert_eq!(names, vec!["Core", "Render", "Ui"]);
    }

    #[test]
    fn dependency_order_ignores_imports_outside_the_batch() {
        let render = ModuleDescriptor::of::<Render>().import::<Core>();
        let ui = ModuleDescriptor::of::<Ui>();

        let ordered = dependency_order(vec![render, ui]).expect("acyclic");
        let names: Vec<_> = ordered.iter().map(ModuleDescriptor::name).collect();

        assert_eq!(names, vec!["Render", "Ui"]);
    }

    #[test]
    fn dependency_order_reports_cycles() {
        let render = ModuleDescriptor::of::<Render>().import::<Ui>();
        let ui = ModuleDescriptor::of::<Ui>().import::<Render>();
        let core = ModuleDescriptor::of::<Core>();

        let err = dependency_order(vec![render, core, ui]).expect_err("cycle");
        assert_eq!(err, ModuleError::ImportCycle(vec!["Render", "Ui"]));
    }

    #[test]
    fn export_copies_bindings_by_reference() {
        let mut factory = ModuleFactory::new(ModuleRegistry::new());
        let mut source = Container::new();
        source.bind("volume", 0.5f32);

        factory
            .export(&source, &[Token::name("volume")])
            .expect("bound");

        let global = factory.global().binding(&Token::name("volume")).expect("exported");
        assert!(global.same_binding(source.binding(&Token::name("volume")).expect("source")));
    }

    #[test]
    fn export_is_all_or_nothing() {
        let mut factory = ModuleFactory::new(ModuleRegistry::new());
        let mut source = Container::new();
        source.bind("volume", 0.5f32);

        let err = factory
            .export(&source, &[Token::name("volume"), Token::name("pitch")])
            .expect_err("pitch is unbound");

        assert!(matches!(err, ModuleError::UnexportedBinding { .. }));
        assert!(factory.global().is_empty());
    }
}
