//! Module configuration errors.

use thiserror::Error;

use tessera_inject::{ContainerError, Token};

/// Unified error type for module realization.
///
/// All variants are wiring mistakes found at bootstrap. Callers are expected
/// to abort start-up on any of them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModuleError {
    /// The module class was already realized by this factory.
    #[error("Module {0} already exists")]
    DuplicateModule(&'static str),

    /// A declared import has not been realized yet.
    #[error("Missing dependency: {module} imports {import}, which has not been created")]
    MissingDependency {
        module: &'static str,
        import: &'static str,
    },

    /// An export names a token the module's container never bound.
    #[error("Cannot export {token} from {module}: it is not provided")]
    UnexportedBinding { module: &'static str, token: Token },

    /// The type was never registered as a module.
    #[error("{0} is not a registered module")]
    MissingMetadata(&'static str),

    /// A provider depends on one declared after it in the same module.
    #[error("Provider {provider} in {module} needs {dependency}, which is declared after it")]
    ProviderOrder {
        module: &'static str,
        provider: &'static str,
        dependency: Token,
    },

    /// A provider's constructor failed.
    #[error("Failed to create provider {provider} in {module}: {source}")]
    Provider {
        module: &'static str,
        provider: &'static str,
        #[source]
        source: ContainerError,
    },

    /// Modules in a batch import each other.
    #[error("Import cycle between modules: {}", .0.join(", "))]
    ImportCycle(Vec<&'static str>),

    #[error(transparent)]
    Container(#[from] ContainerError),
}
