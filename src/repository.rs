use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::blocking;
use crate::diff::Change;
use crate::error::Result;
use crate::git::{Git, Suspending};
use crate::ops;

/// Async handle on a repository. Every query spawns git on the tokio
/// runtime and yields while it runs.
///
/// ```no_run
/// # async fn demo() -> git_query::Result<()> {
/// let repo = git_query::Repository::open("/path/to/checkout");
/// let head = repo.current_commit().await?;
/// let changed = repo.changed_files("main").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Repository {
    git: Git,
}

impl Repository {
    /// Runs git in the process's current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs git inside `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let mut git = Git::default();
        git.set_dir(dir.into());
        Self { git }
    }

    /// Uses `program` instead of the `git` found on `PATH`.
    pub fn program(mut self, program: impl Into<OsString>) -> Self {
        self.git.set_program(program.into());
        self
    }

    /// Sets an extra environment variable for every git invocation.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.git.push_env(key.into(), value.into());
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.git.dir()
    }

    /// The same repository, queried with blocking calls.
    pub fn blocking(&self) -> blocking::Repository {
        blocking::Repository::from_git(self.git.clone())
    }

    pub(crate) fn from_git(git: Git) -> Self {
        Self { git }
    }

    fn exec(&self) -> Suspending<'_> {
        Suspending(&self.git)
    }

    pub async fn commit(&self, committish: &str) -> Result<String> {
        ops::commit(&self.exec(), committish).await
    }

    pub async fn current_commit(&self) -> Result<String> {
        self.commit("HEAD").await
    }

    /// Never fails: a committish that does not resolve is `false`.
    pub async fn has_commit(&self, committish: &str) -> bool {
        ops::has_commit(&self.exec(), committish).await
    }

    pub async fn is_merging(&self) -> bool {
        ops::is_merging(&self.exec()).await
    }

    /// `true` when unmerged paths exist, optionally limited to `subpath`.
    /// Any git failure is reported as `true`.
    pub async fn has_conflicts(&self, subpath: Option<&str>) -> bool {
        ops::has_conflicts(&self.exec(), subpath).await
    }

    pub async fn branch(&self, committish: &str) -> Result<String> {
        ops::branch(&self.exec(), committish).await
    }

    pub async fn current_branch(&self) -> Result<String> {
        self.branch("HEAD").await
    }

    pub async fn root_directory(&self) -> Result<PathBuf> {
        ops::root_directory(&self.exec()).await
    }

    pub async fn config(&self, key: &str) -> Result<String> {
        ops::config(&self.exec(), key).await
    }

    pub async fn remote_url(&self, name: &str) -> Result<String> {
        ops::remote_url(&self.exec(), name).await
    }

    pub async fn remote_commit(&self, url: &str, committish: &str) -> Result<String> {
        ops::remote_commit(&self.exec(), url, committish).await
    }

    /// Changes between the merge base of `committish` and `HEAD`, and `HEAD`.
    pub async fn differences(&self, committish: &str) -> Result<Vec<Change>> {
        ops::differences(&self.exec(), committish).await
    }

    /// Paths from [`Repository::differences`] that were not deleted.
    pub async fn changed_files(&self, committish: &str) -> Result<Vec<String>> {
        ops::changed_files(&self.exec(), committish).await
    }

    /// Fetches the text of `file` at `committish` from the remote at `url`
    /// with `git archive --remote`, without a clone.
    pub async fn download_file(&self, url: &str, committish: &str, file: &str) -> Result<String> {
        ops::download_file(&self.exec(), url, committish, file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::FileStatus;
    use crate::testutil::{is_commit_id, TestEnv};
    use crate::Error;
    use serial_test::serial;

    #[tokio::test]
    async fn commit_of_head_is_a_sha() {
        let env = TestEnv::new();
        let repo = Repository::open(env.create_repo("test-repo"));
        let id = repo.commit("HEAD").await.unwrap();
        assert!(is_commit_id(&id), "{}", id);
        assert_eq!(repo.current_commit().await.unwrap(), id);
    }

    #[tokio::test]
    async fn commit_of_unknown_ref_fails() {
        let env = TestEnv::new();
        let repo = Repository::open(env.create_repo("test-repo"));
        let err = repo.commit("non-existing-branch").await.unwrap_err();
        assert!(err.is_command_failure(), "got {:?}", err);
    }

    #[tokio::test]
    async fn has_commit_never_fails() {
        let env = TestEnv::new();
        let repo = Repository::open(env.create_repo("test-repo"));
        assert!(repo.has_commit("HEAD").await);
        assert!(!repo.has_commit("non-existing-branch").await);
    }

    #[tokio::test]
    async fn merge_state_and_conflicts() {
        let env = TestEnv::new();
        let path = env.create_repo("test-repo");
        let repo = Repository::open(&path);
        assert!(!repo.is_merging().await);
        assert!(!repo.has_conflicts(None).await);

        env.start_conflicting_merge(&path);
        assert!(repo.is_merging().await);
        assert!(repo.has_conflicts(None).await);
        assert!(repo.has_conflicts(Some("README.md")).await);
    }

    #[tokio::test]
    async fn branch_names() {
        let env = TestEnv::new();
        let repo = Repository::open(env.create_repo_with_branch("test-repo", "feature/x"));
        assert_eq!(repo.branch("HEAD").await.unwrap(), "feature/x");
        assert_eq!(repo.current_branch().await.unwrap(), "feature/x");
        assert_eq!(repo.branch("main").await.unwrap(), "main");
    }

    #[tokio::test]
    async fn root_directory_from_subdirectory() {
        let env = TestEnv::new();
        let path = env.create_repo("test-repo");
        env.commit_file(&path, "nested/deep/file.txt", "x", "nested");
        let repo = Repository::open(path.join("nested/deep"));
        let root = repo.root_directory().await.unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            path.canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn config_values() {
        let env = TestEnv::new();
        let path = env.create_repo("test-repo");
        let repo = Repository::open(&path);
        let bare = repo.config("core.bare").await.unwrap();
        assert_eq!(bare, "false");

        // init only records core.ignorecase on case-insensitive filesystems;
        // when it is absent git config exits 1.
        match repo.config("core.ignorecase").await {
            Ok(ignorecase) => assert!(
                ignorecase == "true" || ignorecase == "false",
                "{}",
                ignorecase
            ),
            Err(err) => assert!(
                matches!(err, Error::CommandFailed { code: Some(1), .. }),
                "got {:?}",
                err
            ),
        }
        env.set_config(&path, "core.ignorecase", "false");
        assert_eq!(repo.config("core.ignorecase").await.unwrap(), "false");
        assert_eq!(repo.config("test.value").await.unwrap(), "configured");
        assert!(repo.config("test.unset").await.is_err());
    }

    #[tokio::test]
    async fn remote_url_and_remote_commit() {
        let env = TestEnv::new();
        let upstream = env.create_repo("upstream");
        let path = env.clone_repo(&upstream, "downstream");
        let repo = Repository::open(&path);

        let url = repo.remote_url("origin").await.unwrap();
        assert!(url.contains("upstream"), "{}", url);
        assert!(repo.remote_url("nope").await.is_err());

        let remote_id = repo.remote_commit(&url, "main").await.unwrap();
        assert!(is_commit_id(&remote_id), "{}", remote_id);
        assert_eq!(remote_id, Repository::open(&upstream).current_commit().await.unwrap());
    }

    #[tokio::test]
    async fn differences_against_base_branch() {
        let env = TestEnv::new();
        let path = env.create_repo_with_branch("test-repo", "feature");
        env.commit_file(&path, "added.txt", "new", "add");
        env.commit_file(&path, "README.md", "changed\n", "modify");
        env.remove_file(&path, "LICENSE", "remove");

        let repo = Repository::open(&path);
        let mut changes = repo.differences("main").await.unwrap();
        changes.sort_by(|a, b| a.name.cmp(&b.name));
        let summary: Vec<(FileStatus, &str)> =
            changes.iter().map(|c| (c.status, c.name.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (FileStatus::Deleted, "LICENSE"),
                (FileStatus::Modified, "README.md"),
                (FileStatus::Added, "added.txt"),
            ]
        );

        let mut files = repo.changed_files("main").await.unwrap();
        files.sort();
        assert_eq!(files, ["README.md", "added.txt"]);
    }

    #[tokio::test]
    async fn differences_without_common_history_is_empty() {
        let env = TestEnv::new();
        let path = env.create_repo("test-repo");
        env.checkout_orphan(&path, "lonely");

        let repo = Repository::open(&path);
        assert_eq!(repo.differences("main").await.unwrap(), Vec::new());
        assert!(repo.changed_files("main").await.unwrap().is_empty());
        assert!(repo.differences("no-such-ref").await.is_err());
    }

    #[tokio::test]
    async fn differences_on_base_itself_is_empty() {
        let env = TestEnv::new();
        let repo = Repository::open(env.create_repo("test-repo"));
        assert!(repo.differences("main").await.unwrap().is_empty());
        assert!(repo.changed_files("HEAD").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn queries_are_idempotent() {
        let env = TestEnv::new();
        let repo = Repository::open(env.create_repo("test-repo"));
        assert_eq!(
            repo.current_commit().await.unwrap(),
            repo.current_commit().await.unwrap()
        );
        assert_eq!(
            repo.differences("main").await.unwrap(),
            repo.differences("main").await.unwrap()
        );
    }

    #[tokio::test]
    async fn download_file_from_remote() {
        let env = TestEnv::new();
        let upstream = env.create_repo("upstream");
        env.commit_file(&upstream, "package.json", "{\"name\":\"demo\"}\n", "add manifest");
        let repo = Repository::open(env.create_repo("local"));

        let url = upstream.display().to_string();
        let content = repo.download_file(&url, "main", "package.json").await.unwrap();
        assert_eq!(content, "{\"name\":\"demo\"}\n");
    }

    #[tokio::test]
    async fn download_file_missing_path_fails() {
        let env = TestEnv::new();
        let upstream = env.create_repo("upstream");
        let repo = Repository::open(env.create_repo("local"));

        let url = upstream.display().to_string();
        let err = repo
            .download_file(&url, "main", "does-not-exist.txt")
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::CommandFailed { .. } | Error::EntryNotFound { .. }),
            "got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn missing_git_binary_is_a_command_failure() {
        let env = TestEnv::new();
        let repo = Repository::open(env.create_repo("test-repo")).program("no-such-git-binary");
        assert!(matches!(
            repo.current_commit().await.unwrap_err(),
            Error::Spawn { .. }
        ));
        assert!(!repo.has_commit("HEAD").await);
        assert!(repo.has_conflicts(None).await);
    }

    #[tokio::test]
    #[serial]
    async fn new_uses_current_directory() {
        let env = TestEnv::new();
        let path = env.create_repo("test-repo");
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(&path).unwrap();

        let from_cwd = Repository::new().current_commit().await;
        std::env::set_current_dir(previous).unwrap();

        assert_eq!(
            from_cwd.unwrap(),
            Repository::open(&path).current_commit().await.unwrap()
        );
    }
}
