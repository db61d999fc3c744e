//! Operator hook pipeline for the Replimend recovery core.
//!
//! Recoveries notify operators by running lists of shell commands at each
//! phase (failure detection, pre-failover, post-failover). Commands are
//! opaque strings with `{placeholder}` markers expanded from the analysis
//! entry and, once known, the promoted successor.
mod errors;
mod pipeline;
mod placeholders;
mod runner;

pub use self::errors::HookFailed;
pub use self::pipeline::run_processes;
pub use self::placeholders::expand_placeholders;
pub use self::runner::ProcessRunner;
pub use self::runner::ProcessRunnerBackend;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::runner::RunnerFixture;
