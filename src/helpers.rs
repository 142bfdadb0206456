//! Convenience entry points for test suites.
//!
//! `helpers::run` is the usual way into the harness; the rest covers
//! one-off instance creation and bare test-directory setup.

use crate::environment::{self, Environment, GeneratorDependency, InstantiateOptions};
use crate::error::{EnvironmentError, RunError};
use crate::generator::{
    Generator, GeneratorArgs, GeneratorFactory, GeneratorInstance, GeneratorOptions,
    GeneratorRuntime,
};
use crate::run::{dir, RunContext, RunSettings, RunTarget};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Create a run context for `target` with default settings (isolated
/// temporary directory).
pub fn run(target: impl Into<RunTarget>) -> RunContext {
    RunContext::new(target, RunSettings::default())
}

/// Create a run context with explicit settings.
pub fn run_with_settings(target: impl Into<RunTarget>, settings: RunSettings) -> RunContext {
    RunContext::new(target, settings)
}

/// A generator that accepts anything and scaffolds nothing.
struct DummyGenerator;

#[async_trait]
impl Generator for DummyGenerator {
    async fn run(&mut self, _runtime: &mut GeneratorRuntime<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Factory for a simple no-op generator, handy as a stand-in dependency.
pub fn create_dummy_generator() -> GeneratorFactory {
    GeneratorFactory::new(|_args, _options| Ok(Box::new(DummyGenerator) as Box<dyn Generator>))
}

/// Build a generator instance in one call: an isolated environment is
/// created, `dependencies` registered into it, and `namespace` resolved
/// with the given arguments and options. The namespace must be provided by
/// one of the dependencies.
pub fn create_generator(
    namespace: &str,
    dependencies: Vec<GeneratorDependency>,
    args: impl Into<GeneratorArgs>,
    options: GeneratorOptions,
) -> Result<GeneratorInstance, EnvironmentError> {
    let mut env = Environment::new();
    environment::register_dependencies(&mut env, dependencies)?;
    env.create(
        namespace,
        InstantiateOptions::default()
            .with_arguments(args)
            .with_options(options),
    )
}

/// Clean `path` (creating it if needed), make it the working directory,
/// and hand the resolved absolute path to `callback` for fixture seeding.
pub fn test_directory(
    path: impl Into<PathBuf>,
    callback: impl FnOnce(&Path),
) -> Result<PathBuf, RunError> {
    let prepared = dir::prepare_dir(&path.into())?;
    let entered = dir::enter(&prepared)?;
    callback(&entered);
    Ok(entered)
}
