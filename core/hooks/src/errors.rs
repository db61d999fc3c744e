//! Errors returned by the replimend-hooks crate.

/// A hook command ran and reported a non-zero exit status.
#[derive(Debug, thiserror::Error)]
#[error("{phase} hook '{command}' exited with status {status}")]
pub struct HookFailed {
    /// Which hook phase the command belongs to.
    pub phase: String,

    /// The expanded command that was run.
    pub command: String,

    /// The non-zero exit status the command reported.
    pub status: i32,
}

impl HookFailed {
    pub fn new<P, C>(phase: P, command: C, status: i32) -> HookFailed
    where
        P: Into<String>,
        C: Into<String>,
    {
        HookFailed {
            phase: phase.into(),
            command: command.into(),
            status,
        }
    }
}
