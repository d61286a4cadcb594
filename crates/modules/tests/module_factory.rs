//! Module factory behaviour across whole module graphs.
//!
//! Tests cover:
//! - Each module type is realized once per factory
//! - Only exported bindings reach the global container
//! - Imports must be realized first (leaves-first creation)
//! - Providers see earlier providers and global exports
//! - Failed builds leave no module and no exports behind
//! - Batch creation sorts by imports and rejects cycles

use std::sync::Arc;

use tessera_inject::{
    Arguments, ContainerError, Injectable, InjectionMetadata, Token, TypeKey,
};
use tessera_modules::{
    ModuleDefinition, ModuleDescriptor, ModuleError, ModuleFactory, ModuleRegistry, ModuleSource,
};

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

unit_module!(Module1);
unit_module!(Module2);
unit_module!(LeafModule);
unit_module!(StemModule);
unit_module!(RootModule);

struct Clock {
    frame: u64,
}

impl Injectable for Clock {
    fn construct(_: Arguments) -> Result<Self, ContainerError> {
        Ok(Self { frame: 1 })
    }
}

struct Scheduler {
    clock: Arc<Clock>,
}

impl Injectable for Scheduler {
    fn injection() -> Option<InjectionMetadata> {
        Some(InjectionMetadata::new().param::<Clock>())
    }

    fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
        Ok(Self {
            clock: args.required()?,
        })
    }
}

struct Broken;

impl Injectable for Broken {
    fn construct(_: Arguments) -> Result<Self, ContainerError> {
        Err(ContainerError::construction::<Self>("device unavailable"))
    }
}

/// Module whose own constructor injects one of its providers.
struct TimeModule {
    scheduler: Arc<Scheduler>,
}

impl Injectable for TimeModule {
    fn injection() -> Option<InjectionMetadata> {
        Some(InjectionMetadata::new().param::<Scheduler>())
    }

    fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
        Ok(Self {
            scheduler: args.required()?,
        })
    }
}

impl ModuleDefinition for TimeModule {
    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor::of::<Self>()
            .provide::<Clock>()
            .provide::<Scheduler>()
            .export_type::<Clock>()
    }
}

fn factory() -> ModuleFactory {
    ModuleFactory::new(ModuleRegistry::new())
}

#[test]
fn test_realizing_a_module_twice_fails_and_keeps_the_first() {
    let mut factory = factory();
    factory
        .create(ModuleDescriptor::of::<Module1>())
        .expect("first realization");

    let err = factory
        .create(ModuleDescriptor::of::<Module1>())
        .expect_err("second realization");

    assert_eq!(err, ModuleError::DuplicateModule("Module1"));
    let names: Vec<_> = factory.modules().map(|m| m.name()).collect();
    assert_eq!(names, vec!["Module1"]);
}

#[test]
fn test_export_without_provider_fails_the_build() {
    let mut factory = factory();
    let descriptor = ModuleDescriptor::of::<Module1>().export("audio.volume");

    let err = factory.create(descriptor).expect_err("nothing provides the export");

    assert_eq!(
        err,
        ModuleError::UnexportedBinding {
            module: "Module1",
            token: Token::name("audio.volume"),
        }
    );
    assert!(!factory.contains(&TypeKey::of::<Module1>()));
}

#[test]
fn test_unexported_provider_stays_private() {
    let mut factory = factory();
    let descriptor = ModuleDescriptor::of::<Module1>()
        .provide_value("public", 1u32)
        .provide_value("private", 2u32)
        .export("public");

    let module = factory.create(descriptor).expect("module builds");
    assert_eq!(
        *module
            .container()
            .resolve::<u32>(&Token::name("private"))
            .expect("private binding"),
        2
    );

    assert!(factory.global().has(&Token::name("public")));
    assert!(matches!(
        factory.global().get(&Token::name("private")),
        Err(ContainerError::UnknownBinding(_))
    ));
}

#[test]
fn test_imports_must_be_created_first() {
    let mut factory = factory();
    let module1 = ModuleDescriptor::of::<Module1>();
    let module2 = ModuleDescriptor::of::<Module2>().import::<Module1>();

    let err = factory
        .create(module2.clone())
        .expect_err("Module1 is not realized yet");
    assert!(err.to_string().starts_with("Missing dependency"));
    assert!(factory.is_empty());

    factory.create(module1).expect("leaf");
    factory.create(module2).expect("dependent");
    assert_eq!(factory.len(), 2);
}

#[test]
fn test_sibling_sees_exports_of_earlier_modules() {
    let mut factory = factory();
    let core = ModuleDescriptor::of::<Module1>()
        .provide::<Clock>()
        .export_type::<Clock>();
    let scheduling = ModuleDescriptor::of::<Module2>()
        .import::<Module1>()
        .provide::<Scheduler>()
        .export_type::<Scheduler>();

    factory.create(core).expect("core");
    factory.create(scheduling).expect("scheduling");

    let scheduler = factory
        .global()
        .get_type::<Scheduler>()
        .expect("exported scheduler");
    let clock = factory.global().get_type::<Clock>().expect("exported clock");
    assert!(Arc::ptr_eq(&scheduler.clock, &clock));
}

#[test]
fn test_module_constructor_injects_its_own_providers() {
    let mut registry = ModuleRegistry::new();
    registry.register::<TimeModule>();
    let mut factory = ModuleFactory::new(registry);

    factory
        .create(ModuleSource::class::<TimeModule>())
        .expect("registered module");

    let time = factory.instance_of::<TimeModule>().expect("realized");
    assert_eq!(time.scheduler.clock.frame, 1);
    assert!(factory.global().has(&Token::of::<Clock>()));
    assert!(!factory.global().has(&Token::of::<Scheduler>()));
}

#[test]
fn test_unregistered_class_is_missing_metadata() {
    let mut factory = factory();

    let err = factory
        .create(ModuleSource::class::<TimeModule>())
        .expect_err("never registered");

    assert_eq!(err, ModuleError::MissingMetadata("TimeModule"));
}

#[test]
fn test_provider_declared_too_early_is_reported() {
    let mut factory = factory();
    let descriptor = ModuleDescriptor::of::<Module1>()
        .provide::<Scheduler>()
        .provide::<Clock>();

    let err = factory.create(descriptor).expect_err("scheduler needs the clock");

    assert_eq!(
        err,
        ModuleError::ProviderOrder {
            module: "Module1",
            provider: "Scheduler",
            dependency: Token::of::<Clock>(),
        }
    );
}

#[test]
fn test_provider_with_unknown_dependency_is_a_provider_error() {
    let mut factory = factory();
    let descriptor = ModuleDescriptor::of::<Module1>().provide::<Scheduler>();

    let err = factory.create(descriptor).expect_err("no clock anywhere");

    assert!(matches!(
        err,
        ModuleError::Provider {
            module: "Module1",
            provider: "Scheduler",
            source: ContainerError::Injection { .. },
        }
    ));
}

#[test]
fn test_failed_build_leaves_no_module_and_no_exports() {
    let mut factory = factory();
    let descriptor = ModuleDescriptor::of::<Module1>()
        .provide::<Clock>()
        .provide::<Broken>()
        .export_type::<Clock>();

    let err = factory.create(descriptor).expect_err("broken provider");
    assert!(matches!(err, ModuleError::Provider { provider: "Broken", .. }));
    assert!(factory.is_empty());
    assert!(!factory.global().has(&Token::of::<Clock>()));

    // The same type can be realized once its configuration is fixed.
    factory
        .create(
            ModuleDescriptor::of::<Module1>()
                .provide::<Clock>()
                .export_type::<Clock>(),
        )
        .expect("fixed module");
    assert!(factory.global().has(&Token::of::<Clock>()));
}

#[test]
fn test_failed_module_constructor_does_not_publish_exports() {
    let mut factory = factory();
    let descriptor = ModuleDescriptor::of::<TimeModule>()
        .provide::<Clock>()
        .export_type::<Clock>();

    let err = factory
        .create(descriptor)
        .expect_err("TimeModule needs a scheduler");

    assert!(matches!(
        err,
        ModuleError::Container(ContainerError::Injection { .. })
    ));
    assert!(factory.global().is_empty());
    assert!(factory.instance_of::<TimeModule>().is_none());
}

#[test]
fn test_create_all_orders_leaves_first() {
    let mut factory = factory();
    let root = ModuleDescriptor::of::<RootModule>()
        .import::<StemModule>()
        .import::<LeafModule>();
    let stem = ModuleDescriptor::of::<StemModule>().import::<LeafModule>();
    let leaf = ModuleDescriptor::of::<LeafModule>();

    let created = factory
        .create_all([root, stem, leaf].map(ModuleSource::from))
        .expect("acyclic batch");

    assert_eq!(
        created,
        vec![
            TypeKey::of::<LeafModule>(),
            TypeKey::of::<StemModule>(),
            TypeKey::of::<RootModule>(),
        ]
    );
    let names: Vec<_> = factory.modules().map(|m| m.name()).collect();
    assert_eq!(names, vec!["LeafModule", "StemModule", "RootModule"]);
}

#[test]
fn test_create_all_rejects_cycles_before_building_anything() {
    let mut factory = factory();
    let stem = ModuleDescriptor::of::<StemModule>().import::<RootModule>();
    let root = ModuleDescriptor::of::<RootModule>().import::<StemModule>();
    let leaf = ModuleDescriptor::of::<LeafModule>();

    let err = factory
        .create_all([leaf, stem, root].map(ModuleSource::from))
        .expect_err("cycle");

    assert_eq!(
        err,
        ModuleError::ImportCycle(vec!["StemModule", "RootModule"])
    );
    assert!(factory.is_empty());
}

#[test]
fn test_create_all_rejects_duplicates_in_a_batch() {
    let mut factory = factory();
    let sources = [
        ModuleDescriptor::of::<LeafModule>(),
        ModuleDescriptor::of::<LeafModule>(),
    ];

    let err = factory
        .create_all(sources.map(ModuleSource::from))
        .expect_err("duplicate");

    assert_eq!(err, ModuleError::DuplicateModule("LeafModule"));
}
