//! Execution of hook commands through a runtime configured backend.
use std::sync::Arc;

use anyhow::Context as AnyhowContext;
use anyhow::Result;

use replimend_context::Context;

/// Run hook commands and report their exit status.
#[derive(Clone)]
pub struct ProcessRunner(Arc<dyn ProcessRunnerBackend>);

impl ProcessRunner {
    /// Run a single command to completion and return its exit status.
    ///
    /// Errors are reserved for commands that could not run at all; commands
    /// that ran and failed report their non-zero status.
    pub async fn run(&self, context: &Context, command: &str) -> Result<i32> {
        self.0.run(context, command).await
    }

    /// A runner executing commands through the system shell.
    pub fn shell() -> ProcessRunner {
        ProcessRunner(Arc::new(ShellRunner))
    }
}

impl<T> From<T> for ProcessRunner
where
    T: ProcessRunnerBackend + 'static,
{
    fn from(value: T) -> Self {
        ProcessRunner(Arc::new(value))
    }
}

/// Operations implemented by process runners supported by the hook pipeline.
#[async_trait::async_trait]
pub trait ProcessRunnerBackend: Send + Sync {
    /// Run a single command to completion and return its exit status.
    async fn run(&self, context: &Context, command: &str) -> Result<i32>;
}

/// Backend running commands with `sh -c`, waiting for completion.
struct ShellRunner;

#[async_trait::async_trait]
impl ProcessRunnerBackend for ShellRunner {
    async fn run(&self, _: &Context, command: &str) -> Result<i32> {
        let mut shell = tokio::process::Command::new("sh");
        shell.arg("-c").arg(command);
        let status = shell
            .status()
            .await
            .with_context(|| format!("failed to run hook command '{}'", command))?;
        // Commands killed by a signal carry no exit code.
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::RunnerFixture;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::MutexGuard;

    use anyhow::Result;

    use replimend_context::Context;

    use super::ProcessRunner;
    use super::ProcessRunnerBackend;

    /// Process runner recording commands instead of executing them.
    #[derive(Clone)]
    pub struct RunnerFixture {
        inner: Arc<Mutex<RunnerFixtureState>>,
    }

    struct RunnerFixtureState {
        commands: Vec<String>,
        failures: Vec<(String, i32)>,
    }

    impl RunnerFixture {
        pub fn new() -> RunnerFixture {
            let inner = RunnerFixtureState {
                commands: Vec::new(),
                failures: Vec::new(),
            };
            RunnerFixture {
                inner: Arc::new(Mutex::new(inner)),
            }
        }

        fn access(&self) -> MutexGuard<'_, RunnerFixtureState> {
            self.inner
                .lock()
                .expect("RunnerFixture::inner state lock poisoned")
        }

        /// Every command "run" so far, in execution order.
        pub fn commands(&self) -> Vec<String> {
            self.access().commands.clone()
        }

        /// Script commands containing `fragment` to exit with `status`.
        pub fn fail_matching<S>(&self, fragment: S, status: i32) -> &Self
        where
            S: Into<String>,
        {
            self.access().failures.push((fragment.into(), status));
            self
        }

        /// A [`ProcessRunner`] recording into this fixture.
        pub fn runner(&self) -> ProcessRunner {
            ProcessRunner::from(self.clone())
        }
    }

    impl Default for RunnerFixture {
        fn default() -> Self {
            RunnerFixture::new()
        }
    }

    #[async_trait::async_trait]
    impl ProcessRunnerBackend for RunnerFixture {
        async fn run(&self, _: &Context, command: &str) -> Result<i32> {
            let mut state = self.access();
            state.commands.push(command.to_string());
            let status = state
                .failures
                .iter()
                .find(|(fragment, _)| command.contains(fragment))
                .map(|(_, status)| *status)
                .unwrap_or(0);
            Ok(status)
        }
    }
}
