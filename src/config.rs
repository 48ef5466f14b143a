//! Pipeline configuration (`ccpipe.toml`).
//!
//! Every field has a default, so an absent or partial file still yields a
//! complete configuration. The defaults are the stock flag lists for a
//! small C++20 program linked against udev and pthread.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "ccpipe.toml";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub toolchain: ToolchainConfig,
    pub sources: SourcesConfig,
    pub output: OutputConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_link: Vec<PostLinkStep>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    pub compiler: String,
    pub linker: String,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "g++".to_string(),
            linker: "g++".to_string(),
            cflags: to_strings(&["-O0", "-g3", "-Wall", "-std=c++20", "-iquote", "Lib"]),
            ldflags: to_strings(&["-ludev", "-lpthread"]),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Fixed source list. In discover mode this seeds the result.
    pub files: Vec<PathBuf>,
    /// Extensions (without the dot) that are handed to the compiler.
    pub compile_extensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discover: Option<DiscoverConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            files: vec![PathBuf::from("main.cpp")],
            compile_extensions: to_strings(&["cpp"]),
            discover: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverConfig {
    pub root: PathBuf,
    pub extensions: Vec<String>,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: to_strings(&["cpp"]),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub temp_dir: PathBuf,
    pub executable: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("temp_files"),
            executable: PathBuf::from("main.elf"),
        }
    }
}

/// An extra command run after a successful link, e.g. objcopy.
/// `{output}` in an argument is replaced by the executable path.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PostLinkStep {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl PipelineConfig {
    pub fn is_discover_mode(&self) -> bool {
        self.sources.discover.is_some()
    }

    fn validate(&self) -> BuildResult<()> {
        if self.toolchain.compiler.trim().is_empty() {
            return Err(BuildError::Config("toolchain.compiler is empty".into()));
        }
        if self.toolchain.linker.trim().is_empty() {
            return Err(BuildError::Config("toolchain.linker is empty".into()));
        }
        if self.output.temp_dir.as_os_str().is_empty() {
            return Err(BuildError::Config("output.temp_dir is empty".into()));
        }
        if self.output.executable.as_os_str().is_empty() {
            return Err(BuildError::Config("output.executable is empty".into()));
        }
        if let Some(step) = self.post_link.iter().find(|s| s.program.trim().is_empty()) {
            return Err(BuildError::Config(format!(
                "post_link step with args {:?} has no program",
                step.args
            )));
        }
        Ok(())
    }
}

pub fn parse_config(contents: &str) -> BuildResult<PipelineConfig> {
    let config: PipelineConfig = toml::from_str(contents)
        .map_err(|e| BuildError::Config(e.to_string().trim_end().to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist. Without one, `ccpipe.toml` in `dir` is used
/// when present and the built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> BuildResult<PipelineConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let implicit = dir.join(CONFIG_FILE);
            if !implicit.exists() {
                tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                return Ok(PipelineConfig::default());
            }
            implicit
        }
    };

    let contents = fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
    tracing::debug!("loaded configuration from {}", path.display());
    parse_config(&contents)
        .map_err(|e| BuildError::Config(format!("{}: {}", path.display(), strip_prefix(&e))))
}

fn strip_prefix(err: &BuildError) -> String {
    match err {
        BuildError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// Starter file written by `ccpipe init`.
pub fn starter_config(discover: bool) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    if discover {
        config.sources.files = Vec::new();
        config.sources.discover = Some(DiscoverConfig::default());
    }
    config
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
