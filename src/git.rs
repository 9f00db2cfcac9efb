use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use crate::archive;
use crate::error::{Error, Result};

/// How a query waits for the git process it spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Block the calling thread until git exits.
    Blocking,
    /// Yield to the async runtime while git runs.
    Suspending,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => write!(f, "blocking"),
            Self::Suspending => write!(f, "suspending"),
        }
    }
}

/// Arguments for one invocation of git.
///
/// Arguments reach the process as a vector, never through a shell, so
/// committishes and paths need no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GitCommand {
    args: Vec<String>,
}

impl GitCommand {
    pub(crate) fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git")?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Where and how git is launched. Shared by both execution strategies.
#[derive(Debug, Clone)]
pub(crate) struct Git {
    program: OsString,
    dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl Default for Git {
    fn default() -> Self {
        Self {
            program: OsString::from("git"),
            dir: None,
            envs: Vec::new(),
        }
    }
}

impl Git {
    pub(crate) fn set_program(&mut self, program: OsString) {
        self.program = program;
    }

    pub(crate) fn set_dir(&mut self, dir: PathBuf) {
        self.dir = Some(dir);
    }

    pub(crate) fn push_env(&mut self, key: OsString, value: OsString) {
        self.envs.push((key, value));
    }

    pub(crate) fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn std_command(&self, command: &GitCommand) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(command.args());
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn tokio_command(&self, command: &GitCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::from(self.std_command(command));
        cmd.kill_on_drop(true);
        cmd
    }

    #[instrument(level = "debug", skip(self, command), fields(command = %command))]
    pub(crate) fn run_blocking(&self, command: &GitCommand) -> Result<String> {
        debug!("spawning git (blocking)");
        let output = self
            .std_command(command)
            .output()
            .map_err(|source| spawn_error(command, source))?;
        finish(command, output)
    }

    #[instrument(level = "debug", skip(self, command), fields(command = %command))]
    pub(crate) async fn run(&self, command: &GitCommand) -> Result<String> {
        debug!("spawning git");
        let output = self
            .tokio_command(command)
            .output()
            .await
            .map_err(|source| spawn_error(command, source))?;
        finish(command, output)
    }

    /// Runs a command whose stdout is a tar stream and returns the text of
    /// `entry`, reading the archive while git is still writing it.
    #[instrument(level = "debug", skip(self, command), fields(command = %command))]
    pub(crate) async fn run_archive(&self, command: &GitCommand, entry: &str) -> Result<String> {
        debug!("spawning git with streamed stdout");
        let mut child = self
            .tokio_command(command)
            .spawn()
            .map_err(|source| spawn_error(command, source))?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            Error::Archive(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "git stdout was not captured",
            ))
        })?;
        let stderr = child.stderr.take();

        let collect_stderr = async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                stderr.read_to_end(&mut buf).await?;
            }
            Ok::<_, io::Error>(buf)
        };
        let extract = async {
            let extracted = archive::extract(&mut stdout, entry).await;
            // git blocks on a full pipe, so read whatever it still has to say.
            let drained = tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await;
            (extracted, drained)
        };
        let ((extracted, drained), stderr) = tokio::join!(extract, collect_stderr);

        let status = child
            .wait()
            .await
            .map_err(|source| spawn_error(command, source))?;
        if !status.success() {
            let stderr = stderr.unwrap_or_default();
            return Err(command_failed(command, status.code(), &stderr));
        }
        drained.map_err(Error::Archive)?;
        extracted
    }
}

fn finish(command: &GitCommand, output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(command_failed(command, output.status.code(), &output.stderr));
    }

    let stdout = String::from_utf8(output.stdout).map_err(|_| Error::NonUtf8 {
        what: format!("output of `{}`", command),
    })?;
    Ok(stdout.trim_end().to_string())
}

fn command_failed(command: &GitCommand, code: Option<i32>, stderr: &[u8]) -> Error {
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    debug!(?code, %stderr, "git exited unsuccessfully");
    Error::CommandFailed {
        command: command.to_string(),
        code,
        stderr,
    }
}

fn spawn_error(command: &GitCommand, source: io::Error) -> Error {
    Error::Spawn {
        command: command.to_string(),
        source,
    }
}

/// The capability every query body is written against: run a git command
/// and hand back its trimmed stdout.
pub(crate) trait Execute {
    fn mode(&self) -> ExecutionMode;

    async fn run(&self, command: &GitCommand) -> Result<String>;

    async fn run_archive(&self, command: &GitCommand, entry: &str) -> Result<String>;
}

/// Runs git on the calling thread; its futures complete on first poll.
pub(crate) struct Blocking<'a>(pub(crate) &'a Git);

/// Runs git on the tokio runtime.
pub(crate) struct Suspending<'a>(pub(crate) &'a Git);

impl Execute for Blocking<'_> {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Blocking
    }

    async fn run(&self, command: &GitCommand) -> Result<String> {
        self.0.run_blocking(command)
    }

    async fn run_archive(&self, _command: &GitCommand, _entry: &str) -> Result<String> {
        Err(Error::UnsupportedMode {
            operation: "download_file",
            mode: ExecutionMode::Blocking,
        })
    }
}

impl Execute for Suspending<'_> {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Suspending
    }

    async fn run(&self, command: &GitCommand) -> Result<String> {
        self.0.run(command).await
    }

    async fn run_archive(&self, command: &GitCommand, entry: &str) -> Result<String> {
        self.0.run_archive(command, entry).await
    }
}
