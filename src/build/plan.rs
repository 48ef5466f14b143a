//! Turning a source list into the concrete tool invocations of a build.

use super::runner::Invocation;
use super::sources::has_extension;
use crate::config::PipelineConfig;
use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};

/// A source handed to the compiler and the object file it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub source: PathBuf,
    pub artifact: PathBuf,
}

/// Everything a build will execute, in order.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub units: Vec<CompileUnit>,
    pub compile: Vec<Invocation>,
    pub link: Invocation,
    pub post_link: Vec<Invocation>,
    pub temp_dir: PathBuf,
    pub output: PathBuf,
}

impl BuildPlan {
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.units.iter().map(|u| u.artifact.as_path())
    }
}

/// `<temp_dir>/<stem>.o` where the stem is the file name up to its first dot,
/// so `usb.device.cpp` becomes `usb.o`.
pub fn artifact_path(source: &Path, temp_dir: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match file_name.split('.').next() {
        Some(s) if !s.is_empty() => s.to_string(),
        // Dotfiles like `.main.cpp` have an empty first segment.
        _ => source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name),
    };
    temp_dir.join(format!("{}.o", stem))
}

/// Select the sources that get compiled and assign each its artifact.
pub fn compile_units(
    sources: &[PathBuf],
    compile_extensions: &[String],
    temp_dir: &Path,
) -> BuildResult<Vec<CompileUnit>> {
    let mut units: Vec<CompileUnit> = Vec::new();
    for source in sources {
        if !has_extension(source, compile_extensions) {
            tracing::debug!("not compiling {}", source.display());
            continue;
        }
        let artifact = artifact_path(source, temp_dir);
        if let Some(existing) = units.iter().find(|u| u.artifact == artifact) {
            return Err(BuildError::ArtifactCollision {
                artifact,
                first: existing.source.clone(),
                second: source.clone(),
            });
        }
        units.push(CompileUnit {
            source: source.clone(),
            artifact,
        });
    }
    Ok(units)
}

/// `<compiler> <cflags...> -c <source> -o <artifact>`
pub fn compile_invocation(config: &PipelineConfig, unit: &CompileUnit) -> Invocation {
    Invocation::new(&config.toolchain.compiler)
        .args(&config.toolchain.cflags)
        .arg("-c")
        .path_arg(&unit.source)
        .arg("-o")
        .path_arg(&unit.artifact)
}

/// `<linker> <artifacts...> -o <output> <ldflags...>`
///
/// Libraries come after the objects so single-pass linkers resolve them.
pub fn link_invocation(config: &PipelineConfig, units: &[CompileUnit]) -> Invocation {
    let mut inv = Invocation::new(&config.toolchain.linker);
    for unit in units {
        inv = inv.path_arg(&unit.artifact);
    }
    inv.arg("-o")
        .path_arg(&config.output.executable)
        .args(&config.toolchain.ldflags)
}

pub fn post_link_invocations(config: &PipelineConfig) -> Vec<Invocation> {
    let output = config.output.executable.to_string_lossy();
    config
        .post_link
        .iter()
        .map(|step| {
            Invocation::new(&step.program)
                .args(step.args.iter().map(|a| a.replace("{output}", &output)))
        })
        .collect()
}

/// Build the full plan. Fails with [`BuildError::NoSources`] when nothing
/// would be compiled, so the linker is never handed an empty object list.
pub fn plan_build(config: &PipelineConfig, sources: &[PathBuf]) -> BuildResult<BuildPlan> {
    let temp_dir = &config.output.temp_dir;
    let units = compile_units(sources, &config.sources.compile_extensions, temp_dir)?;
    if units.is_empty() {
        return Err(BuildError::NoSources);
    }

    let compile = units
        .iter()
        .map(|unit| compile_invocation(config, unit))
        .collect();
    let link = link_invocation(config, &units);

    Ok(BuildPlan {
        compile,
        link,
        post_link: post_link_invocations(config),
        temp_dir: temp_dir.clone(),
        output: config.output.executable.clone(),
        units,
    })
}
