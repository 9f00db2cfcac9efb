//! Each query written once, against the [`Execute`] capability. The
//! blocking and async front-ends only choose the strategy.

use std::path::PathBuf;

use tracing::debug;

use crate::diff::{self, Change};
use crate::error::{Error, Result};
use crate::git::{Execute, ExecutionMode, GitCommand};

pub(crate) async fn commit<E: Execute>(exec: &E, committish: &str) -> Result<String> {
    exec.run(&GitCommand::new(["rev-parse", "-q", committish]))
        .await
}

pub(crate) async fn has_commit<E: Execute>(exec: &E, committish: &str) -> bool {
    let verify = GitCommand::new(["rev-parse", "-q", "--verify", committish]);
    match exec.run(&verify).await {
        Ok(id) => !id.is_empty(),
        Err(e) => {
            debug!(committish, error = %e, "committish does not resolve");
            false
        }
    }
}

pub(crate) async fn is_merging<E: Execute>(exec: &E) -> bool {
    has_commit(exec, "MERGE_HEAD").await
}

/// A clean exit means no unmerged paths; any failure counts as conflicts.
pub(crate) async fn has_conflicts<E: Execute>(exec: &E, subpath: Option<&str>) -> bool {
    let mut cmd = GitCommand::new(["diff", "--name-only", "--diff-filter=U", "--exit-code"]);
    if let Some(path) = subpath {
        cmd = cmd.arg(path);
    }
    match exec.run(&cmd).await {
        Ok(_) => false,
        Err(e) => {
            debug!(error = %e, "treating diff failure as conflicts");
            true
        }
    }
}

pub(crate) async fn branch<E: Execute>(exec: &E, committish: &str) -> Result<String> {
    exec.run(&GitCommand::new(["rev-parse", "--abbrev-ref", committish]))
        .await
}

pub(crate) async fn root_directory<E: Execute>(exec: &E) -> Result<PathBuf> {
    let root = exec
        .run(&GitCommand::new(["rev-parse", "--show-toplevel"]))
        .await?;
    Ok(PathBuf::from(root))
}

pub(crate) async fn config<E: Execute>(exec: &E, key: &str) -> Result<String> {
    exec.run(&GitCommand::new(["config", key])).await
}

pub(crate) async fn remote_url<E: Execute>(exec: &E, name: &str) -> Result<String> {
    exec.run(&GitCommand::new(["remote", "get-url", name])).await
}

pub(crate) async fn remote_commit<E: Execute>(
    exec: &E,
    url: &str,
    committish: &str,
) -> Result<String> {
    let listing = exec
        .run(&GitCommand::new(["ls-remote", url, committish]))
        .await?;
    Ok(first_token(&listing).to_string())
}

pub(crate) async fn differences<E: Execute>(exec: &E, committish: &str) -> Result<Vec<Change>> {
    let merge_base = GitCommand::new(["merge-base", committish, "HEAD"]);
    let base = match exec.run(&merge_base).await {
        Ok(base) => base,
        // Unrelated histories: merge-base exits 1 and prints nothing.
        Err(Error::CommandFailed {
            code: Some(1),
            stderr,
            ..
        }) if stderr.is_empty() => String::new(),
        Err(e) => return Err(e),
    };
    if base.is_empty() {
        return Ok(Vec::new());
    }

    let report = exec
        .run(&GitCommand::new([
            "diff-tree",
            "--name-status",
            "-r",
            base.as_str(),
            "HEAD",
        ]))
        .await?;
    Ok(diff::parse_name_status(&report))
}

pub(crate) async fn changed_files<E: Execute>(exec: &E, committish: &str) -> Result<Vec<String>> {
    let changes = differences(exec, committish).await?;
    Ok(diff::changed_files(changes))
}

pub(crate) async fn download_file<E: Execute>(
    exec: &E,
    url: &str,
    committish: &str,
    file: &str,
) -> Result<String> {
    if exec.mode() == ExecutionMode::Blocking {
        return Err(Error::UnsupportedMode {
            operation: "download_file",
            mode: ExecutionMode::Blocking,
        });
    }

    let remote = format!("--remote={}", url);
    let cmd = GitCommand::new(["archive", remote.as_str(), committish, "--", file]);
    exec.run_archive(&cmd, file).await
}

fn first_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}
