use std::fmt;

use serde::{Serialize, Serializer};

/// Change codes reported by `git diff-tree --name-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Added,
    Copied,
    Deleted,
    Modified,
    Renamed,
    TypeChanged,
    Unmerged,
    Unknown,
    Broken,
    Other(char),
}

impl FileStatus {
    pub fn from_char(code: char) -> Self {
        match code {
            'A' => Self::Added,
            'C' => Self::Copied,
            'D' => Self::Deleted,
            'M' => Self::Modified,
            'R' => Self::Renamed,
            'T' => Self::TypeChanged,
            'U' => Self::Unmerged,
            'X' => Self::Unknown,
            'B' => Self::Broken,
            other => Self::Other(other),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Copied => 'C',
            Self::Deleted => 'D',
            Self::Modified => 'M',
            Self::Renamed => 'R',
            Self::TypeChanged => 'T',
            Self::Unmerged => 'U',
            Self::Unknown => 'X',
            Self::Broken => 'B',
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for FileStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

/// One line of a name-status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub name: String,
    pub status: FileStatus,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.status, self.name)
    }
}

/// Parses `<status><whitespace><path>` lines. Blank lines are ignored and
/// the path keeps any inner whitespace.
pub fn parse_name_status(report: &str) -> Vec<Change> {
    report
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let line = line.trim_start();
            let (status, name) = match line.split_once(char::is_whitespace) {
                Some((status, name)) => (status, name.trim_start()),
                None => (line, ""),
            };
            let code = status.chars().next()?;
            Some(Change {
                name: name.to_string(),
                status: FileStatus::from_char(code),
            })
        })
        .collect()
}

/// Paths that still exist after the changes: everything but deletions.
pub fn changed_files(changes: Vec<Change>) -> Vec<String> {
    changes
        .into_iter()
        .filter(|change| change.status != FileStatus::Deleted)
        .map(|change| change.name)
        .collect()
}
