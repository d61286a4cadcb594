//! Tessera Modules - groups of services realized on top of the container.
//!
//! A module is described by a [`ModuleDescriptor`]: the modules it imports,
//! the providers it builds into its private container, and the tokens it
//! exports to the factory's global container. The [`ModuleFactory`] realizes
//! descriptors, each module type at most once.
//!
//! ```
//! use tessera_inject::{Arguments, ContainerError, Injectable, Token};
//! use tessera_modules::{ModuleDescriptor, ModuleError, ModuleFactory, ModuleRegistry};
//!
//! struct CoreModule;
//! struct AudioModule;
//!
//! impl Injectable for CoreModule {
//!     fn construct(_: Arguments) -> Result<Self, ContainerError> {
//!         Ok(Self)
//!     }
//! }
//!
//! impl Injectable for AudioModule {
//!     fn construct(_: Arguments) -> Result<Self, ContainerError> {
//!         Ok(Self)
//!     }
//! }
//!
//! let core = ModuleDescriptor::of::<CoreModule>()
//!     .provide_value("sample.rate", 48_000u32)
//!     .export("sample.rate");
//! let audio = ModuleDescriptor::of::<AudioModule>().import::<CoreModule>();
//!
//! let mut factory = ModuleFactory::new(ModuleRegistry::new());
//! assert!(factory.create(audio.clone()).is_err());
//!
//! factory.create(core)?;
//! factory.create(audio)?;
//! assert!(factory.global().has(&Token::name("sample.rate")));
//! # Ok::<(), ModuleError>(())
//! ```

mod descriptor;
mod error;
mod factory;
mod registry;

pub use descriptor::{Constructor, ModuleDefinition, ModuleDescriptor, Provider};
pub use error::ModuleError;
pub use factory::{Module, ModuleFactory, ModuleSource};
pub use registry::ModuleRegistry;
