//! Query a local git repository by running the `git` command line and
//! parsing what it prints.
//!
//! [`Repository`] is the async API; [`blocking::Repository`] offers the same
//! queries as plain blocking calls. Both run one shared definition of each
//! query and differ only in how they wait for git.

pub mod archive;
pub mod blocking;
mod diff;
mod error;
mod git;
mod ops;
mod repository;
mod testutil;

pub use diff::{changed_files, parse_name_status, Change, FileStatus};
pub use error::{Error, Result};
pub use git::ExecutionMode;
pub use repository::Repository;
