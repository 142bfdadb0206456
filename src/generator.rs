//! Generator collaborator contract.
//!
//! The harness drives anything that satisfies three capabilities: it can be
//! constructed from CLI-style arguments and options ([`GeneratorFactory`]),
//! it can be executed to completion ([`Generator::run`]), and its
//! interactive surfaces are overridable seams on the instance (prompting and
//! config reads, see [`prompt`] and [`config`]).

use crate::error::{ConfigReadError, PromptError};
use crate::run::events::{EventBus, RunEvent};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub mod config;
pub mod prompt;

use config::{ConfigSource, FileConfigSource, LocalConfig};
use prompt::{Answers, Prompter, Question, TerminalPrompter};

/// Options passed to a generator constructor, keyed by option name.
pub type GeneratorOptions = serde_json::Map<String, Value>;

/// Ordered CLI-style arguments for a generator.
///
/// Accepted either as a single space-delimited string or as a sequence;
/// both normalize to the same ordered form before reaching a constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorArgs(Vec<String>);

impl GeneratorArgs {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for GeneratorArgs {
    fn from(raw: &str) -> Self {
        Self(raw.split_whitespace().map(str::to_string).collect())
    }
}

impl From<String> for GeneratorArgs {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<Vec<String>> for GeneratorArgs {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl From<Vec<&str>> for GeneratorArgs {
    fn from(args: Vec<&str>) -> Self {
        Self(args.into_iter().map(str::to_string).collect())
    }
}

/// The execution half of the generator contract.
///
/// `run` is the trigger and its return value the completion signal the
/// harness observes. Failures propagate verbatim.
#[async_trait]
pub trait Generator: Send {
    async fn run(&mut self, runtime: &mut GeneratorRuntime<'_>) -> anyhow::Result<()>;
}

/// Cloneable constructor for a generator.
#[derive(Clone)]
pub struct GeneratorFactory {
    construct:
        Arc<dyn Fn(Vec<String>, GeneratorOptions) -> anyhow::Result<Box<dyn Generator>> + Send + Sync>,
}

impl GeneratorFactory {
    pub fn new<F>(construct: F) -> Self
    where
        F: Fn(Vec<String>, GeneratorOptions) -> anyhow::Result<Box<dyn Generator>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            construct: Arc::new(construct),
        }
    }

    pub(crate) fn construct(
        &self,
        args: Vec<String>,
        options: GeneratorOptions,
    ) -> anyhow::Result<Box<dyn Generator>> {
        (self.construct)(args, options)
    }
}

impl fmt::Debug for GeneratorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GeneratorFactory")
    }
}

/// A constructed generator, ready to run.
///
/// Owns the behavior returned by the factory plus the two overridable seams:
/// the prompter and the config source. Mock injection replaces a seam and
/// saves the previous one so it can be restored.
pub struct GeneratorInstance {
    namespace: String,
    behavior: Box<dyn Generator>,
    prompter: Box<dyn Prompter>,
    saved_prompters: Vec<Box<dyn Prompter>>,
    config: Box<dyn ConfigSource>,
}

impl GeneratorInstance {
    pub(crate) fn new(namespace: impl Into<String>, behavior: Box<dyn Generator>) -> Self {
        Self {
            namespace: namespace.into(),
            behavior,
            prompter: Box::new(TerminalPrompter),
            saved_prompters: Vec::new(),
            config: Box::new(FileConfigSource::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Install a prompter, returning the one it replaces.
    pub fn replace_prompter(&mut self, prompter: Box<dyn Prompter>) -> Box<dyn Prompter> {
        std::mem::replace(&mut self.prompter, prompter)
    }

    /// Install a config source, returning the one it replaces.
    pub fn replace_config_source(&mut self, config: Box<dyn ConfigSource>) -> Box<dyn ConfigSource> {
        std::mem::replace(&mut self.config, config)
    }

    pub(crate) fn push_saved_prompter(&mut self, prompter: Box<dyn Prompter>) {
        self.saved_prompters.push(prompter);
    }

    pub(crate) fn pop_saved_prompter(&mut self) -> Option<Box<dyn Prompter>> {
        self.saved_prompters.pop()
    }

    /// Drive the generator, routing its capability calls through the
    /// currently installed seams.
    pub(crate) async fn run(&mut self, events: &mut EventBus, dir: &Path) -> anyhow::Result<()> {
        let Self {
            behavior,
            prompter,
            config,
            ..
        } = self;
        let mut runtime = GeneratorRuntime {
            prompter: prompter.as_mut(),
            config: config.as_mut(),
            events,
            dir,
        };
        behavior.run(&mut runtime).await
    }

    /// Run outside a [`RunContext`](crate::run::RunContext): current
    /// directory, no event forwarding. Mainly useful for exercising a
    /// mocked instance directly.
    pub async fn run_standalone(&mut self) -> anyhow::Result<()> {
        let mut events = EventBus::new();
        let dir = std::env::current_dir()?;
        self.run(&mut events, &dir).await
    }
}

impl fmt::Debug for GeneratorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorInstance")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Per-run capability handle passed to [`Generator::run`].
pub struct GeneratorRuntime<'a> {
    prompter: &'a mut dyn Prompter,
    config: &'a mut dyn ConfigSource,
    events: &'a mut EventBus,
    dir: &'a Path,
}

impl GeneratorRuntime<'_> {
    /// Ask the installed prompter to answer `questions`.
    pub fn prompt(&mut self, questions: &[Question]) -> Result<Answers, PromptError> {
        tracing::debug!(count = questions.len(), "prompting");
        self.prompter.prompt(questions)
    }

    /// Read one persisted config value through the installed source.
    pub fn config_get(&mut self, key: &str) -> Result<Option<Value>, ConfigReadError> {
        self.config.get(key)
    }

    /// Read the full persisted config through the installed source.
    pub fn config_all(&mut self) -> Result<LocalConfig, ConfigReadError> {
        self.config.get_all()
    }

    /// Forward a generator-specific event to the run's listeners.
    pub fn emit(&mut self, name: impl Into<String>, data: Value) {
        self.events.emit(RunEvent::Generator {
            name: name.into(),
            data,
        });
    }

    /// The working directory established for this run.
    pub fn dir(&self) -> &Path {
        self.dir
    }
}
