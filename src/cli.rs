use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-query", about = "Query a git repository through the git CLI")]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run as if started in <DIR>
    #[arg(short = 'C', value_name = "DIR", global = true)]
    pub dir: Option<PathBuf>,

    /// git executable to run
    #[arg(long, value_name = "PROGRAM", env = "GIT_QUERY_GIT", global = true)]
    pub git: Option<String>,

    /// Wait for git on the calling thread instead of the async runtime
    #[arg(long, global = true)]
    pub blocking: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Commit id a committish resolves to
    Commit {
        #[arg(default_value = "HEAD")]
        committish: String,
    },
    /// Whether a committish resolves
    HasCommit { committish: String },
    /// Whether a merge is in progress
    IsMerging,
    /// Whether unmerged paths exist
    HasConflicts {
        /// Limit the check to this path
        path: Option<String>,
    },
    /// Abbreviated ref name of a committish
    Branch {
        #[arg(default_value = "HEAD")]
        committish: String,
    },
    /// Top-level directory of the working tree
    Root,
    /// Value of a config key
    Config { key: String },
    /// URL of a named remote
    RemoteUrl {
        #[arg(default_value = "origin")]
        name: String,
    },
    /// Commit id of a ref on a remote
    RemoteCommit { url: String, committish: String },
    /// Changes since the merge base with a committish
    Diff { committish: String },
    /// Paths changed (not deleted) since the merge base with a committish
    Changed { committish: String },
    /// Print a file from a remote without cloning it
    Download {
        url: String,
        committish: String,
        file: String,
    },
}
