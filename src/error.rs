use std::io;

use thiserror::Error;

use crate::git::ExecutionMode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The git program could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed (exit code: {}): {stderr}", exit_code(.code))]
    CommandFailed {
        command: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },

    #[error("{operation} is not supported in {mode} mode")]
    UnsupportedMode {
        operation: &'static str,
        mode: ExecutionMode,
    },

    #[error("entry `{name}` not found in archive")]
    EntryNotFound { name: String },

    #[error("failed to read archive stream: {0}")]
    Archive(#[source] io::Error),

    #[error("{what} was not valid UTF-8")]
    NonUtf8 { what: String },
}

impl Error {
    /// True for failures of the git invocation itself: it could not be
    /// started, or it exited unsuccessfully.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Error::Spawn { .. } | Error::CommandFailed { .. })
    }
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or("signal".to_string(), |c| c.to_string())
}
