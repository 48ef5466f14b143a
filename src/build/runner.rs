//! External tool invocation.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A program plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sources reaching here were checked for UTF-8 during enumeration;
    /// config-supplied paths come from TOML strings.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// The value following `-o`, if any.
    pub fn output_path(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+:,@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Exit status of a finished tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ToolExit {
    pub const SUCCESS: ToolExit = ToolExit { code: Some(0) };

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external tools. Implementations block until the tool exits.
pub trait ToolRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<ToolExit>;
}

/// Spawns real processes in the project directory, inheriting stdio so
/// compiler diagnostics go straight to the terminal.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    working_dir: PathBuf,
}

impl SystemRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<ToolExit> {
        tracing::debug!("exec: {}", invocation);
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&self.working_dir)
            .status()?;
        Ok(ToolExit {
            code: status.code(),
        })
    }
}
