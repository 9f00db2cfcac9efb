#![cfg(test)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// A repository on `main` with two commits touching `README.md` and
    /// `LICENSE`, and `test.value = configured` in its local config.
    pub fn create_repo(&self, name: &str) -> PathBuf {
        let repo_path = self.dir.path().join(name);
        std::fs::create_dir_all(&repo_path).unwrap();

        run(&repo_path, &["init", "-q"]);
        run(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run(&repo_path, &["config", "test.value", "configured"]);
        self.commit_file(&repo_path, "README.md", "hello\n", "initial");
        self.commit_file(&repo_path, "LICENSE", "MIT\n", "license");

        repo_path
    }

    pub fn create_repo_with_branch(&self, name: &str, branch: &str) -> PathBuf {
        let repo_path = self.create_repo(name);
        run(&repo_path, &["checkout", "-q", "-b", branch]);
        repo_path
    }

    pub fn clone_repo(&self, source: &Path, name: &str) -> PathBuf {
        let dest = self.dir.path().join(name);
        run(
            self.dir.path(),
            &[
                "clone",
                "-q",
                source.to_str().unwrap(),
                dest.to_str().unwrap(),
            ],
        );
        dest
    }

    pub fn commit_file(&self, repo: &Path, path: &str, content: &str, message: &str) {
        let file = repo.join(path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&file, content).unwrap();
        run(repo, &["add", path]);
        run(repo, &["commit", "-q", "-m", message]);
    }

    pub fn set_config(&self, repo: &Path, key: &str, value: &str) {
        run(repo, &["config", key, value]);
    }

    pub fn remove_file(&self, repo: &Path, path: &str, message: &str) {
        run(repo, &["rm", "-q", path]);
        run(repo, &["commit", "-q", "-m", message]);
    }

    /// Switches `repo` to a new branch with no history in common with `main`.
    pub fn checkout_orphan(&self, repo: &Path, branch: &str) {
        run(repo, &["checkout", "-q", "--orphan", branch]);
        run(repo, &["rm", "-rq", "--cached", "."]);
        run(repo, &["commit", "-q", "--allow-empty", "-m", "unrelated root"]);
    }

    /// Leaves `repo` mid-merge with `README.md` unmerged.
    pub fn start_conflicting_merge(&self, repo: &Path) {
        run(repo, &["checkout", "-q", "-b", "conflicting"]);
        self.commit_file(repo, "README.md", "theirs\n", "theirs");
        run(repo, &["checkout", "-q", "main"]);
        self.commit_file(repo, "README.md", "ours\n", "ours");

        let output = git_command(repo)
            .args(["merge", "--no-edit", "conflicting"])
            .output()
            .expect("failed to run git merge");
        assert!(
            !output.status.success(),
            "merge unexpectedly succeeded: {}",
            String::from_utf8_lossy(&output.stdout)
        );
    }
}

pub fn is_commit_id(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

fn git_command(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@test.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@test.com")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd
}

fn run(dir: &Path, args: &[&str]) {
    let output = git_command(dir)
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}
