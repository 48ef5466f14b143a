//! Error types for the build pipeline.

use std::fmt;
use std::path::PathBuf;

/// Which pipeline stage an external tool belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Link,
    PostLink,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => write!(f, "compile"),
            Stage::Link => write!(f, "link"),
            Stage::PostLink => write!(f, "post-link"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// An external tool ran and exited with a nonzero status.
    #[error("{stage} step failed: '{program}' exited with {}", describe_code(.code))]
    ToolFailed {
        stage: Stage,
        program: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
    },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no source files to compile")]
    NoSources,

    #[error(
        "'{}' and '{}' would both compile to '{}'",
        .first.display(),
        .second.display(),
        .artifact.display()
    )]
    ArtifactCollision {
        artifact: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("source path '{}' is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// The stage that failed, if the failure came from an external tool.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BuildError::ToolFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "a signal".to_string(),
    }
}

pub type BuildResult<T> = Result<T, BuildError>;
