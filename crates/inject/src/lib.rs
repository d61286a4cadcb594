//! Tessera Inject - service container with constructor injection.
//!
//! Services are registered against a [`Token`] (a type, a name, a number or a
//! unique [`Symbol`]) with one of three strategies:
//!
//! - **value**: returned verbatim ([`Container::bind`], [`Container::instance`])
//! - **singleton**: built on first use and cached ([`Container::singleton`])
//! - **factory**: built on every use ([`Container::factory`])
//!
//! Types implementing [`Injectable`] declare their constructor dependencies as
//! [`InjectionMetadata`] and are built with [`Container::make`].
//!
//! ```
//! use std::sync::Arc;
//! use tessera_inject::{Arguments, Container, ContainerError, Injectable, InjectionMetadata, Token};
//!
//! struct Gravity(f32);
//!
//! struct World {
//!     gravity: Arc<Gravity>,
//! }
//!
//! impl Injectable for World {
//!     fn injection() -> Option<InjectionMetadata> {
//!         Some(InjectionMetadata::new().param::<Gravity>())
//!     }
//!
//!     fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
//!         Ok(Self { gravity: args.required()? })
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.instance(Gravity(9.8));
//!
//! let world = container.make::<World>(Vec::new())?;
//! assert_eq!(world.gravity.0, 9.8);
//! assert!(container.get(&Token::name("missing")).is_err());
//! # Ok::<(), ContainerError>(())
//! ```

mod binding;
mod container;
mod error;
mod injectable;
mod token;

pub use binding::{Binding, BindingKind, FactoryFn, Instance, SingletonBinding};
pub use container::Container;
pub use error::ContainerError;
pub use injectable::{Arguments, InjectionMetadata, Injectable, ParamOverride, Parameter};
pub use token::{Symbol, Token, TypeKey};
