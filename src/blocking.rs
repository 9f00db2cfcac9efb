//! Blocking counterpart of [`crate::Repository`].
//!
//! Methods run the same query bodies as the async API, with a strategy that
//! waits for git on the calling thread. No async runtime is needed, and
//! these can be called from inside one (at the cost of blocking a worker).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures::executor::block_on;

use crate::diff::Change;
use crate::error::Result;
use crate::git::{Blocking, Git};
use crate::ops;

#[derive(Debug, Clone, Default)]
pub struct Repository {
    git: Git,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let mut git = Git::default();
        git.set_dir(dir.into());
        Self { git }
    }

    pub fn program(mut self, program: impl Into<OsString>) -> Self {
        self.git.set_program(program.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.git.push_env(key.into(), value.into());
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.git.dir()
    }

    pub fn into_async(self) -> crate::Repository {
        crate::Repository::from_git(self.git)
    }

    pub(crate) fn from_git(git: Git) -> Self {
        Self { git }
    }

    fn exec(&self) -> Blocking<'_> {
        Blocking(&self.git)
    }

    pub fn commit(&self, committish: &str) -> Result<String> {
        block_on(ops::commit(&self.exec(), committish))
    }

    pub fn current_commit(&self) -> Result<String> {
        self.commit("HEAD")
    }

    pub fn has_commit(&self, committish: &str) -> bool {
        block_on(ops::has_commit(&self.exec(), committish))
    }

    pub fn is_merging(&self) -> bool {
        block_on(ops::is_merging(&self.exec()))
    }

    pub fn has_conflicts(&self, subpath: Option<&str>) -> bool {
        block_on(ops::has_conflicts(&self.exec(), subpath))
    }

    pub fn branch(&self, committish: &str) -> Result<String> {
        block_on(ops::branch(&self.exec(), committish))
    }

    pub fn current_branch(&self) -> Result<String> {
        self.branch("HEAD")
    }

    pub fn root_directory(&self) -> Result<PathBuf> {
        block_on(ops::root_directory(&self.exec()))
    }

    pub fn config(&self, key: &str) -> Result<String> {
        block_on(ops::config(&self.exec(), key))
    }

    pub fn remote_url(&self, name: &str) -> Result<String> {
        block_on(ops::remote_url(&self.exec(), name))
    }

    pub fn remote_commit(&self, url: &str, committish: &str) -> Result<String> {
        block_on(ops::remote_commit(&self.exec(), url, committish))
    }

    pub fn differences(&self, committish: &str) -> Result<Vec<Change>> {
        block_on(ops::differences(&self.exec(), committish))
    }

    pub fn changed_files(&self, committish: &str) -> Result<Vec<String>> {
        block_on(ops::changed_files(&self.exec(), committish))
    }

    /// Always fails with [`crate::Error::UnsupportedMode`]: the archive has
    /// to be read while git is still writing it. Use the async
    /// [`crate::Repository::download_file`].
    pub fn download_file(&self, url: &str, committish: &str, file: &str) -> Result<String> {
        block_on(ops::download_file(&self.exec(), url, committish, file))
    }
}
