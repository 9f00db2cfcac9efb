mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use git_query::{blocking, Change, Repository};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Answer {
    Text(String),
    Flag(bool),
    Changes(Vec<Change>),
    Paths(Vec<String>),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("GIT_QUERY_LOG")
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut repo = match &cli.dir {
        Some(dir) => Repository::open(dir),
        None => Repository::new(),
    };
    if let Some(git) = &cli.git {
        repo = repo.program(git);
    }

    let answer = if cli.blocking {
        query_blocking(&repo.blocking(), cli.command)?
    } else {
        query(&repo, cli.command).await?
    };
    output(&answer, cli.json, format_human)
}

async fn query(repo: &Repository, command: Command) -> Result<Answer> {
    let answer = match command {
        Command::Commit { committish } => Answer::Text(
            repo.commit(&committish)
                .await
                .with_context(|| format!("cannot resolve {:?}", committish))?,
        ),
        Command::HasCommit { committish } => Answer::Flag(repo.has_commit(&committish).await),
        Command::IsMerging => Answer::Flag(repo.is_merging().await),
        Command::HasConflicts { path } => Answer::Flag(repo.has_conflicts(path.as_deref()).await),
        Command::Branch { committish } => Answer::Text(repo.branch(&committish).await?),
        Command::Root => Answer::Text(repo.root_directory().await?.display().to_string()),
        Command::Config { key } => Answer::Text(
            repo.config(&key)
                .await
                .with_context(|| format!("config key {:?} is not set", key))?,
        ),
        Command::RemoteUrl { name } => Answer::Text(repo.remote_url(&name).await?),
        Command::RemoteCommit { url, committish } => {
            Answer::Text(repo.remote_commit(&url, &committish).await?)
        }
        Command::Diff { committish } => Answer::Changes(repo.differences(&committish).await?),
        Command::Changed { committish } => Answer::Paths(repo.changed_files(&committish).await?),
        Command::Download {
            url,
            committish,
            file,
        } => Answer::Text(
            repo.download_file(&url, &committish, &file)
                .await
                .with_context(|| format!("failed to download {} from {}", file, url))?,
        ),
    };
    Ok(answer)
}

fn query_blocking(repo: &blocking::Repository, command: Command) -> Result<Answer> {
    let answer = match command {
        Command::Commit { committish } => Answer::Text(
            repo.commit(&committish)
                .with_context(|| format!("cannot resolve {:?}", committish))?,
        ),
        Command::HasCommit { committish } => Answer::Flag(repo.has_commit(&committish)),
        Command::IsMerging => Answer::Flag(repo.is_merging()),
        Command::HasConflicts { path } => Answer::Flag(repo.has_conflicts(path.as_deref())),
        Command::Branch { committish } => Answer::Text(repo.branch(&committish)?),
        Command::Root => Answer::Text(repo.root_directory()?.display().to_string()),
        Command::Config { key } => Answer::Text(
            repo.config(&key)
                .with_context(|| format!("config key {:?} is not set", key))?,
        ),
        Command::RemoteUrl { name } => Answer::Text(repo.remote_url(&name)?),
        Command::RemoteCommit { url, committish } => {
            Answer::Text(repo.remote_commit(&url, &committish)?)
        }
        Command::Diff { committish } => Answer::Changes(repo.differences(&committish)?),
        Command::Changed { committish } => Answer::Paths(repo.changed_files(&committish)?),
        Command::Download {
            url,
            committish,
            file,
        } => Answer::Text(
            repo.download_file(&url, &committish, &file)
                .with_context(|| format!("failed to download {} from {}", file, url))?,
        ),
    };
    Ok(answer)
}

fn format_human(answer: &Answer) -> String {
    match answer {
        Answer::Text(text) => text.clone(),
        Answer::Flag(flag) => flag.to_string(),
        Answer::Changes(changes) => changes
            .iter()
            .map(Change::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        Answer::Paths(paths) => paths.join("\n"),
    }
}

fn output<T: Serialize>(result: &T, json: bool, human_fn: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let text = human_fn(result);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
