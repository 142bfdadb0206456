//! Genharness: a test harness for scaffolding generators.
//!
//! Resolves generators through a namespace registry, injects deterministic
//! mock prompts and configuration, runs each generator in an isolated
//! working directory, and reports completion both as lifecycle events and
//! as an awaitable result.

pub mod environment;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod logging;
pub mod mocks;
pub mod run;

pub use environment::{Environment, GeneratorDependency, InstantiateOptions};
pub use error::{ConfigReadError, EnvironmentError, PromptError, RunError};
pub use generator::{Generator, GeneratorArgs, GeneratorFactory, GeneratorInstance, GeneratorOptions, GeneratorRuntime};
pub use run::{RunContext, RunResult, RunSettings, RunTarget};
