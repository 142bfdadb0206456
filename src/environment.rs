//! Generator environment: namespace registry and factory.
//!
//! An [`Environment`] maps colon-delimited namespaces to generator
//! factories, derives namespaces from file paths, and instantiates
//! generators on demand. A process-wide instance is available through
//! [`Environment::shared`] for convenience; run contexts default to an
//! isolated instance so concurrent tests cannot observe each other's
//! registrations.

use crate::error::EnvironmentError;
use crate::generator::{GeneratorArgs, GeneratorFactory, GeneratorInstance, GeneratorOptions};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

mod namespace;

/// Namespace assumed when a generator is instantiated from a factory
/// directly, bypassing registry lookup.
pub const GENERATOR_TEST_NAMESPACE: &str = "gen:test";

/// Instantiation parameters for [`Environment::create`] and
/// [`Environment::instantiate`].
#[derive(Debug, Default)]
pub struct InstantiateOptions {
    pub arguments: Option<GeneratorArgs>,
    pub options: GeneratorOptions,
}

impl InstantiateOptions {
    pub fn with_arguments(mut self, arguments: impl Into<GeneratorArgs>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }
}

/// An auxiliary generator to pre-register before a run.
///
/// Generators are statically linked in Rust, so the path form carries its
/// factory alongside the path; the namespace is still derived from the path
/// exactly as it would be for on-disk discovery.
#[derive(Debug, Clone)]
pub enum GeneratorDependency {
    Path {
        path: PathBuf,
        factory: GeneratorFactory,
    },
    Named {
        factory: GeneratorFactory,
        namespace: String,
    },
}

impl GeneratorDependency {
    pub fn from_path(path: impl Into<PathBuf>, factory: GeneratorFactory) -> Self {
        Self::Path {
            path: path.into(),
            factory,
        }
    }

    pub fn named(factory: GeneratorFactory, namespace: impl Into<String>) -> Self {
        Self::Named {
            factory,
            namespace: namespace.into(),
        }
    }
}

/// Registry of generator factories, keyed by namespace.
pub struct Environment {
    registry: HashMap<String, GeneratorFactory>,
    prefixes: Vec<String>,
}

impl Environment {
    /// An empty, isolated environment recognizing the `generator-` package
    /// prefix.
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
            prefixes: vec!["generator-".to_string()],
        }
    }

    /// The process-wide shared environment.
    ///
    /// Shared mutable state: concurrent registrations under the same
    /// namespace race (last write wins). Prefer isolated environments in
    /// tests.
    pub fn shared() -> Arc<Mutex<Environment>> {
        static SHARED: OnceLock<Arc<Mutex<Environment>>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(Mutex::new(Environment::new())))
            .clone()
    }

    /// Recognize an additional package-name prefix during namespace
    /// derivation.
    pub fn add_namespace_prefix(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    /// Derive the namespace for a generator file path.
    ///
    /// Pure and deterministic: identical paths always yield identical
    /// namespaces.
    pub fn namespace(&self, filepath: impl AsRef<Path>) -> Result<String, EnvironmentError> {
        namespace::derive(&self.prefixes, filepath.as_ref())
    }

    /// Register `factory` under `namespace`, replacing any prior entry.
    pub fn register(&mut self, factory: GeneratorFactory, namespace: impl Into<String>) {
        let namespace = namespace.into();
        tracing::debug!(%namespace, "registering generator");
        self.registry.insert(namespace, factory);
    }

    /// Register `factory` under the namespace derived from `path`.
    pub fn register_path(
        &mut self,
        path: impl AsRef<Path>,
        factory: GeneratorFactory,
    ) -> Result<String, EnvironmentError> {
        let namespace = self.namespace(path.as_ref())?;
        self.register(factory, namespace.clone());
        Ok(namespace)
    }

    /// Look up `namespace` and construct an instance from the registered
    /// factory.
    pub fn create(
        &self,
        namespace: &str,
        options: InstantiateOptions,
    ) -> Result<GeneratorInstance, EnvironmentError> {
        let factory = self
            .registry
            .get(namespace)
            .ok_or_else(|| EnvironmentError::UnknownNamespace(namespace.to_string()))?
            .clone();
        construct(&factory, namespace, options)
    }

    /// Construct an instance directly from a factory, bypassing lookup.
    /// The instance runs under the [`GENERATOR_TEST_NAMESPACE`] sentinel.
    pub fn instantiate(
        &self,
        factory: &GeneratorFactory,
        options: InstantiateOptions,
    ) -> Result<GeneratorInstance, EnvironmentError> {
        construct(factory, GENERATOR_TEST_NAMESPACE, options)
    }

    /// Namespaces currently registered, unordered.
    pub fn namespaces(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn construct(
    factory: &GeneratorFactory,
    namespace: &str,
    options: InstantiateOptions,
) -> Result<GeneratorInstance, EnvironmentError> {
    let args = options.arguments.unwrap_or_default().into_vec();
    let behavior =
        factory
            .construct(args, options.options)
            .map_err(|source| EnvironmentError::Construction {
                namespace: namespace.to_string(),
                source,
            })?;
    Ok(GeneratorInstance::new(namespace, behavior))
}

/// Register a list of dependency descriptors into `environment`.
///
/// Later entries for the same namespace replace earlier ones; order has no
/// other observable effect.
pub fn register_dependencies(
    environment: &mut Environment,
    dependencies: impl IntoIterator<Item = GeneratorDependency>,
) -> Result<(), EnvironmentError> {
    for dependency in dependencies {
        match dependency {
            GeneratorDependency::Path { path, factory } => {
                environment.register_path(path, factory)?;
            }
            GeneratorDependency::Named { factory, namespace } => {
                environment.register(factory, namespace);
            }
        }
    }
    Ok(())
}
