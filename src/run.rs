//! Run context: the state machine driving one generator test run.
//!
//! A [`RunContext`] sequences directory preparation, dependency
//! registration, mock injection, and generator execution, then reports
//! completion through two views of one internal record: lifecycle events
//! and an awaitable result. Configuration calls chain and record pending
//! actions; nothing executes until the context is driven.
//!
//! ```no_run
//! use genharness::helpers;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = helpers::run("mocha:app").to_promise().await.map_err(|e| e.to_string())?;
//! println!("scaffolded into {}", dir.display());
//! # Ok(())
//! # }
//! ```

use crate::environment::{self, Environment, GeneratorDependency, InstantiateOptions};
use crate::error::RunError;
use crate::generator::config::LocalConfig;
use crate::generator::prompt::Answers;
use crate::generator::{GeneratorArgs, GeneratorFactory, GeneratorOptions};
use crate::mocks;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::future::{Future, IntoFuture};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Notify;

pub(crate) mod dir;
pub mod events;

use events::{EventBus, RunEvent};

/// Outcome of a run: the established working directory, or the error that
/// terminated the run. The `Arc` is shared with the `Error` event payload.
pub type RunResult = Result<PathBuf, Arc<RunError>>;

/// What a run context should execute.
#[derive(Debug, Clone)]
pub enum RunTarget {
    /// Resolved through the environment registry.
    Namespace(String),
    /// Instantiated directly; runs under the `gen:test` sentinel namespace.
    Factory(GeneratorFactory),
}

impl From<&str> for RunTarget {
    fn from(namespace: &str) -> Self {
        Self::Namespace(namespace.to_string())
    }
}

impl From<String> for RunTarget {
    fn from(namespace: String) -> Self {
        Self::Namespace(namespace)
    }
}

impl From<GeneratorFactory> for RunTarget {
    fn from(factory: GeneratorFactory) -> Self {
        Self::Factory(factory)
    }
}

/// Run context settings.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Automatically prepare an isolated temporary directory before the
    /// run. An explicit `in_dir`/`in_tmp_dir`/`cd` call overrides it.
    pub tmpdir: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { tmpdir: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Configuring,
    Preparing,
    Running,
    Succeeded,
    Failed,
}

type DirCallback = Box<dyn FnOnce(&Path) + Send>;

/// One recorded configuration intention, executed in call order when the
/// run is driven.
enum SetupAction {
    Arguments(GeneratorArgs),
    Options(GeneratorOptions),
    Prompts(Answers),
    LocalConfig(LocalConfig),
    Generators(Vec<GeneratorDependency>),
    TmpDir(Option<DirCallback>),
    Dir(PathBuf, Option<DirCallback>),
    Cd(PathBuf),
}

#[derive(Default)]
struct RunPlan {
    args: Vec<String>,
    options: GeneratorOptions,
    answers: Answers,
    local_config: Option<LocalConfig>,
    dependencies: Vec<GeneratorDependency>,
}

struct Holds {
    pending: AtomicUsize,
    notify: Notify,
}

impl Holds {
    fn new() -> Self {
        Self {
            pending: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    fn acquire(self: &Arc<Self>) -> ReleaseHold {
        self.pending.fetch_add(1, Ordering::AcqRel);
        ReleaseHold {
            holds: self.clone(),
        }
    }

    fn release(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
        self.notify.notify_waiters();
    }

    async fn wait_clear(&self) {
        loop {
            let notified = self.notify.notified();
            if self.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Handle releasing one `async_hold`. The run stays suspended until every
/// outstanding handle has been released; a handle that is dropped without
/// `release` leaves the run pending forever.
#[must_use = "the run will not start until this hold is released"]
pub struct ReleaseHold {
    holds: Arc<Holds>,
}

impl ReleaseHold {
    pub fn release(self) {
        self.holds.release();
    }
}

struct CompletionState {
    result: Mutex<Option<RunResult>>,
    notify: Notify,
}

/// Observer handle over a run's single completion record. Cloneable;
/// every clone reports the same outcome.
#[derive(Clone)]
pub struct CompletionHandle {
    state: Arc<CompletionState>,
}

impl CompletionHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(CompletionState {
                result: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// The outcome, if the run has reached a terminal state.
    pub fn peek(&self) -> Option<RunResult> {
        self.state.result.lock().clone()
    }

    /// Wait for the terminal outcome. Resolves immediately once settled.
    pub async fn wait(&self) -> RunResult {
        loop {
            let notified = self.state.notify.notified();
            if let Some(result) = self.peek() {
                return result;
            }
            notified.await;
        }
    }

    fn settle(&self, result: RunResult) -> bool {
        let mut slot = self.state.result.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(result);
        drop(slot);
        self.state.notify.notify_waiters();
        true
    }
}

/// Future view of a run: drives the context and yields its [`RunResult`].
pub struct RunPromise {
    inner: BoxFuture<'static, RunResult>,
}

impl Future for RunPromise {
    type Output = RunResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

/// Stateful orchestrator for one generator test run.
///
/// Owns the run from configuration through terminal signaling. The target
/// generator executes at most once; configuration calls after the run has
/// started are ignored with a warning.
pub struct RunContext {
    target: RunTarget,
    environment: Arc<Mutex<Environment>>,
    phase: Phase,
    actions: Vec<SetupAction>,
    auto_dir_scheduled: bool,
    holds: Arc<Holds>,
    bus: EventBus,
    completion: CompletionHandle,
    dir: Option<PathBuf>,
}

impl RunContext {
    /// Create a context in the `CONFIGURING` state. With
    /// `settings.tmpdir` (the default) an isolated temporary-directory
    /// step is scheduled ahead of any other setup action.
    pub fn new(target: impl Into<RunTarget>, settings: RunSettings) -> Self {
        let mut context = Self {
            target: target.into(),
            environment: Arc::new(Mutex::new(Environment::new())),
            phase: Phase::Configuring,
            actions: Vec::new(),
            auto_dir_scheduled: false,
            holds: Arc::new(Holds::new()),
            bus: EventBus::new(),
            completion: CompletionHandle::new(),
            dir: None,
        };
        if settings.tmpdir {
            context.actions.push(SetupAction::TmpDir(None));
            context.auto_dir_scheduled = true;
        }
        context
    }

    /// Resolve and register generators through `environment` instead of an
    /// isolated one.
    pub fn with_environment(&mut self, environment: Arc<Mutex<Environment>>) -> &mut Self {
        if self.configurable("with_environment") {
            self.environment = environment;
        }
        self
    }

    /// Append CLI-style arguments (space-delimited string or sequence).
    pub fn with_arguments(&mut self, args: impl Into<GeneratorArgs>) -> &mut Self {
        let args = args.into();
        if self.configurable("with_arguments") {
            self.actions.push(SetupAction::Arguments(args));
        }
        self
    }

    /// Merge CLI-style options.
    pub fn with_options(&mut self, options: GeneratorOptions) -> &mut Self {
        if self.configurable("with_options") {
            self.actions.push(SetupAction::Options(options));
        }
        self
    }

    /// Merge mock prompt answers.
    pub fn with_prompts(&mut self, answers: Answers) -> &mut Self {
        if self.configurable("with_prompts") {
            self.actions.push(SetupAction::Prompts(answers));
        }
        self
    }

    /// Declare dependent generators to register before the run.
    pub fn with_generators(&mut self, dependencies: Vec<GeneratorDependency>) -> &mut Self {
        if self.configurable("with_generators") {
            self.actions.push(SetupAction::Generators(dependencies));
        }
        self
    }

    /// Mock the generator's persisted configuration.
    pub fn with_local_config(&mut self, local_config: LocalConfig) -> &mut Self {
        if self.configurable("with_local_config") {
            self.actions.push(SetupAction::LocalConfig(local_config));
        }
        self
    }

    /// Clean `path`, then make it the working directory for the run.
    pub fn in_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        let path = path.into();
        if self.configurable("in_dir") {
            self.override_auto_dir();
            self.actions.push(SetupAction::Dir(path, None));
        }
        self
    }

    /// Like [`in_dir`](Self::in_dir); `callback` receives the resolved
    /// absolute path once the directory is current, the one sanctioned spot
    /// for seeding fixture files before the generator runs.
    pub fn in_dir_with(
        &mut self,
        path: impl Into<PathBuf>,
        callback: impl FnOnce(&Path) + Send + 'static,
    ) -> &mut Self {
        let path = path.into();
        if self.configurable("in_dir") {
            self.override_auto_dir();
            self.actions
                .push(SetupAction::Dir(path, Some(Box::new(callback))));
        }
        self
    }

    /// Prepare a fresh temporary directory and make it the working
    /// directory. Scheduled automatically by default; call explicitly when
    /// the callback form is needed.
    pub fn in_tmp_dir(&mut self) -> &mut Self {
        if self.configurable("in_tmp_dir") {
            self.override_auto_dir();
            self.actions.push(SetupAction::TmpDir(None));
        }
        self
    }

    /// Like [`in_tmp_dir`](Self::in_tmp_dir), with a fixture callback.
    pub fn in_tmp_dir_with(&mut self, callback: impl FnOnce(&Path) + Send + 'static) -> &mut Self {
        if self.configurable("in_tmp_dir") {
            self.override_auto_dir();
            self.actions
                .push(SetupAction::TmpDir(Some(Box::new(callback))));
        }
        self
    }

    /// Change the working directory without deleting its contents.
    pub fn cd(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        let path = path.into();
        if self.configurable("cd") {
            self.override_auto_dir();
            self.actions.push(SetupAction::Cd(path));
        }
        self
    }

    /// Suspend the transition to `RUNNING` until the returned hold is
    /// released. Every outstanding hold must be released; an unreleased
    /// hold leaves the run pending forever (no timeout is imposed).
    pub fn async_hold(&self) -> ReleaseHold {
        self.holds.acquire()
    }

    /// Register a lifecycle-event listener.
    pub fn on(&mut self, listener: impl FnMut(&RunEvent) + Send + 'static) -> &mut Self {
        self.bus.listen(listener);
        self
    }

    /// Subscribe to lifecycle events over a channel.
    pub fn subscribe(&mut self) -> Receiver<RunEvent> {
        self.bus.subscribe()
    }

    /// Observer handle over the run's completion record.
    pub fn completion(&self) -> CompletionHandle {
        self.completion.clone()
    }

    /// The directory established by `in_dir`/`in_tmp_dir`, once prepared.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Remove the contents of the established test directory, keeping the
    /// directory itself.
    pub fn clean_test_directory(&self) -> Result<(), RunError> {
        if let Some(dir) = &self.dir {
            dir::clean_dir(dir).map_err(|source| RunError::Setup {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Drive the run to its terminal state. The generator executes at most
    /// once: calling this again returns the recorded outcome.
    pub async fn run_to_end(&mut self) -> RunResult {
        if self.phase != Phase::Configuring {
            return self.completion.wait().await;
        }
        self.phase = Phase::Preparing;

        match self.prepare_and_execute().await {
            Ok(dir) => {
                self.phase = Phase::Succeeded;
                self.completion.settle(Ok(dir.clone()));
                self.bus.emit(RunEvent::End { dir: dir.clone() });
                tracing::info!(dir = %dir.display(), "run succeeded");
                Ok(dir)
            }
            Err(error) => {
                self.phase = Phase::Failed;
                let error = Arc::new(error);
                self.completion.settle(Err(error.clone()));
                self.bus.emit(RunEvent::Error {
                    error: error.clone(),
                });
                tracing::info!(%error, "run failed");
                Err(error)
            }
        }
    }

    /// Consume the context into a promise over the run's outcome.
    pub fn to_promise(mut self) -> RunPromise {
        RunPromise {
            inner: Box::pin(async move { self.run_to_end().await }),
        }
    }

    async fn prepare_and_execute(&mut self) -> Result<PathBuf, RunError> {
        let mut plan = RunPlan::default();

        for action in std::mem::take(&mut self.actions) {
            match action {
                SetupAction::Arguments(args) => plan.args.extend(args.into_vec()),
                SetupAction::Options(options) => plan.options.extend(options),
                SetupAction::Prompts(answers) => plan.answers.extend(answers),
                SetupAction::LocalConfig(config) => plan
                    .local_config
                    .get_or_insert_with(LocalConfig::new)
                    .extend(config),
                SetupAction::Generators(deps) => plan.dependencies.extend(deps),
                SetupAction::TmpDir(callback) => {
                    let prepared = dir::prepare_tmp_dir()?;
                    let entered = dir::enter(&prepared)?;
                    self.dir = Some(entered.clone());
                    if let Some(callback) = callback {
                        callback(&entered);
                    }
                }
                SetupAction::Dir(path, callback) => {
                    let prepared = dir::prepare_dir(&path)?;
                    let entered = dir::enter(&prepared)?;
                    self.dir = Some(entered.clone());
                    if let Some(callback) = callback {
                        callback(&entered);
                    }
                }
                SetupAction::Cd(path) => {
                    dir::enter(&path)?;
                }
            }
        }

        self.holds.wait_clear().await;

        let options = InstantiateOptions {
            arguments: Some(GeneratorArgs::from(plan.args)),
            options: plan.options,
        };
        let mut instance = match &self.target {
            RunTarget::Namespace(namespace) => self.environment.lock().create(namespace, options)?,
            RunTarget::Factory(factory) => self.environment.lock().instantiate(factory, options)?,
        };

        environment::register_dependencies(&mut self.environment.lock(), plan.dependencies)?;

        mocks::mock_prompt(&mut instance, plan.answers);
        if let Some(local_config) = plan.local_config {
            mocks::mock_local_config(&mut instance, local_config);
        }

        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| RunError::Setup {
                path: PathBuf::from("."),
                source,
            })?,
        };

        tracing::info!(namespace = instance.namespace(), "starting generator");
        self.bus.emit(RunEvent::Run {
            namespace: instance.namespace().to_string(),
        });
        self.phase = Phase::Running;

        instance
            .run(&mut self.bus, &dir)
            .await
            .map_err(RunError::Generator)?;
        Ok(dir)
    }

    fn configurable(&self, call: &str) -> bool {
        if self.phase == Phase::Configuring {
            true
        } else {
            tracing::warn!(call, "configuration ignored: run already started");
            false
        }
    }

    fn override_auto_dir(&mut self) {
        if self.auto_dir_scheduled {
            // The automatic step sits at the head of the queue.
            self.actions.remove(0);
            self.auto_dir_scheduled = false;
        }
    }
}

impl IntoFuture for RunContext {
    type Output = RunResult;
    type IntoFuture = RunPromise;

    fn into_future(self) -> Self::IntoFuture {
        self.to_promise()
    }
}
