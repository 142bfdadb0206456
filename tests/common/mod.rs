//! Shared test utilities for integration tests.
//!
//! The harness changes the process working directory while a run executes,
//! so cwd-sensitive tests serialize on a global mutex and restore the
//! original directory afterward. Probe factories expose what a generator
//! observed to the asserting test.

// Not every test binary uses every helper here.
#![allow(dead_code)]

use async_trait::async_trait;
use genharness::generator::config::LocalConfig;
use genharness::generator::prompt::{Answers, Question};
use genharness::generator::{Generator, GeneratorFactory, GeneratorOptions, GeneratorRuntime};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Serializes cwd-sensitive tests and restores the original working
/// directory on drop.
pub struct CwdGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl CwdGuard {
    pub fn acquire() -> Self {
        let lock = CWD_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            original: std::env::current_dir().unwrap(),
            _lock: lock,
        }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Everything a probe generator observed during construction and runs.
#[derive(Default)]
pub struct Probe {
    pub constructed_args: Mutex<Vec<Vec<String>>>,
    pub constructed_options: Mutex<Vec<GeneratorOptions>>,
    pub constructed_tags: Mutex<Vec<&'static str>>,
    pub runs: AtomicUsize,
    pub started_at: Mutex<Vec<Instant>>,
    pub answers: Mutex<Vec<Answers>>,
    pub config_values: Mutex<Vec<LocalConfig>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

struct RecordingGenerator {
    probe: Arc<Probe>,
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn run(&mut self, _runtime: &mut GeneratorRuntime<'_>) -> anyhow::Result<()> {
        self.probe.started_at.lock().unwrap().push(Instant::now());
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records constructor inputs and run timing, scaffolds nothing.
pub fn recording_factory(probe: Arc<Probe>) -> GeneratorFactory {
    GeneratorFactory::new(move |args, options| {
        probe.constructed_args.lock().unwrap().push(args);
        probe.constructed_options.lock().unwrap().push(options);
        Ok(Box::new(RecordingGenerator {
            probe: probe.clone(),
        }) as Box<dyn Generator>)
    })
}

/// Records a tag at construction time; used for last-write-wins checks.
pub fn tagged_factory(probe: Arc<Probe>, tag: &'static str) -> GeneratorFactory {
    GeneratorFactory::new(move |_args, _options| {
        probe.constructed_tags.lock().unwrap().push(tag);
        Ok(Box::new(RecordingGenerator {
            probe: probe.clone(),
        }) as Box<dyn Generator>)
    })
}

struct FailingGenerator {
    message: &'static str,
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn run(&mut self, _runtime: &mut GeneratorRuntime<'_>) -> anyhow::Result<()> {
        anyhow::bail!(self.message)
    }
}

/// Fails every run with `message`.
pub fn failing_factory(message: &'static str) -> GeneratorFactory {
    GeneratorFactory::new(move |_args, _options| {
        Ok(Box::new(FailingGenerator { message }) as Box<dyn Generator>)
    })
}

struct PromptingGenerator {
    probe: Arc<Probe>,
    questions: Vec<Question>,
}

#[async_trait]
impl Generator for PromptingGenerator {
    async fn run(&mut self, runtime: &mut GeneratorRuntime<'_>) -> anyhow::Result<()> {
        let answers = runtime.prompt(&self.questions)?;
        self.probe.answers.lock().unwrap().push(answers);
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Asks `questions` through the installed prompter and records the answers.
pub fn prompting_factory(probe: Arc<Probe>, questions: Vec<Question>) -> GeneratorFactory {
    GeneratorFactory::new(move |_args, _options| {
        Ok(Box::new(PromptingGenerator {
            probe: probe.clone(),
            questions: questions.clone(),
        }) as Box<dyn Generator>)
    })
}

struct ConfigReadingGenerator {
    probe: Arc<Probe>,
}

#[async_trait]
impl Generator for ConfigReadingGenerator {
    async fn run(&mut self, runtime: &mut GeneratorRuntime<'_>) -> anyhow::Result<()> {
        let config = runtime.config_all()?;
        self.probe.config_values.lock().unwrap().push(config);
        Ok(())
    }
}

/// Reads the full persisted config through the installed source.
pub fn config_reading_factory(probe: Arc<Probe>) -> GeneratorFactory {
    GeneratorFactory::new(move |_args, _options| {
        Ok(Box::new(ConfigReadingGenerator {
            probe: probe.clone(),
        }) as Box<dyn Generator>)
    })
}

struct ScaffoldingGenerator {
    filename: &'static str,
}

#[async_trait]
impl Generator for ScaffoldingGenerator {
    async fn run(&mut self, runtime: &mut GeneratorRuntime<'_>) -> anyhow::Result<()> {
        std::fs::write(runtime.dir().join(self.filename), "scaffolded\n")?;
        runtime.emit("fileWritten", serde_json::json!({ "file": self.filename }));
        Ok(())
    }
}

/// Writes one file into the working directory and forwards an event.
pub fn scaffolding_factory(filename: &'static str) -> GeneratorFactory {
    GeneratorFactory::new(move |_args, _options| {
        Ok(Box::new(ScaffoldingGenerator { filename }) as Box<dyn Generator>)
    })
}
