use super::plan::{BuildPlan, plan_build};
use super::runner::{Invocation, SystemRunner, ToolRunner};
use super::sources::enumerate_sources;
use crate::config::PipelineConfig;
use crate::error::{BuildError, BuildResult, Stage};
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Leave the temp directory populated after a successful build.
    pub keep_artifacts: bool,
    /// Suppress progress output on stdout.
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub compiled: usize,
    pub output: PathBuf,
    /// Entries removed from the temp directory; `None` if cleanup was skipped.
    pub cleaned: Option<usize>,
    pub elapsed: Duration,
}

/// Console progress: `Compilation: . . . complete!`
struct Progress {
    quiet: bool,
}

impl Progress {
    fn print(&self, text: &str) {
        if !self.quiet {
            print!("{}", text);
            let _ = io::stdout().flush();
        }
    }

    fn line(&self, text: impl std::fmt::Display) {
        if !self.quiet {
            println!("{}", text);
        }
    }
}

// --- CORE: Build Project ---
pub fn build_project(
    config: &PipelineConfig,
    project_dir: &Path,
    options: &BuildOptions,
) -> BuildResult<BuildReport> {
    let plan = prepare_plan(config, project_dir)?;
    let mut runner = SystemRunner::new(project_dir);
    run_pipeline(&plan, project_dir, &mut runner, options)
}

/// Enumerate sources and compute the plan without touching the filesystem
/// beyond the discovery walk.
pub fn prepare_plan(config: &PipelineConfig, project_dir: &Path) -> BuildResult<BuildPlan> {
    let skip = [config.output.temp_dir.clone()];
    let sources = enumerate_sources(&config.sources, project_dir, &skip)?;
    tracing::debug!("{} source file(s) enumerated", sources.len());
    plan_build(config, &sources)
}

/// Execute a plan: compile, link, post-link, then cleanup.
///
/// Each stage only starts once the previous one fully succeeded. On any
/// failure the temp directory is left as-is for inspection.
pub fn run_pipeline<R: ToolRunner>(
    plan: &BuildPlan,
    project_dir: &Path,
    runner: &mut R,
    options: &BuildOptions,
) -> BuildResult<BuildReport> {
    let start_time = Instant::now();
    let progress = Progress {
        quiet: options.quiet,
    };

    prepare_dirs(plan, project_dir)?;

    progress.print("Compilation: ");
    let compiled = match compile_all(plan, runner, &progress) {
        Ok(n) => n,
        Err(e) => {
            progress.line("");
            return Err(e);
        }
    };
    progress.line("complete!".green());

    link(plan, runner)?;
    progress.line(format!(
        "   {} Linked {}",
        "🔗".cyan(),
        plan.output.display()
    ));

    run_post_link(plan, runner)?;

    let cleaned = if options.keep_artifacts {
        None
    } else {
        Some(cleanup(plan, project_dir)?)
    };

    let elapsed = start_time.elapsed();
    progress.line(format!("{} Build finished in {:.2?}", "✓".green(), elapsed));

    Ok(BuildReport {
        compiled,
        output: plan.output.clone(),
        cleaned,
        elapsed,
    })
}

fn prepare_dirs(plan: &BuildPlan, project_dir: &Path) -> BuildResult<()> {
    let temp_dir = project_dir.join(&plan.temp_dir);
    fs::create_dir_all(&temp_dir).map_err(|e| BuildError::io(&temp_dir, e))?;

    if let Some(parent) = plan.output.parent()
        && !parent.as_os_str().is_empty()
    {
        let out_dir = project_dir.join(parent);
        fs::create_dir_all(&out_dir).map_err(|e| BuildError::io(&out_dir, e))?;
    }
    Ok(())
}

fn execute<R: ToolRunner>(
    runner: &mut R,
    invocation: &Invocation,
    stage: Stage,
) -> BuildResult<()> {
    let exit = runner.run(invocation).map_err(|source| BuildError::Spawn {
        program: invocation.program.clone(),
        source,
    })?;
    if exit.success() {
        Ok(())
    } else {
        tracing::debug!("{} step failed: {}", stage, invocation);
        Err(BuildError::ToolFailed {
            stage,
            program: invocation.program.clone(),
            code: exit.code,
        })
    }
}

/// Compile every unit in order, stopping at the first failure.
/// Returns the number of units compiled.
pub fn compile_all<R: ToolRunner>(
    plan: &BuildPlan,
    runner: &mut R,
    progress: &impl ProgressSink,
) -> BuildResult<usize> {
    for (unit, invocation) in plan.units.iter().zip(&plan.compile) {
        progress.dot();
        execute(runner, invocation, Stage::Compile).inspect_err(|_| {
            tracing::warn!("compilation of {} failed", unit.source.display());
        })?;
    }
    Ok(plan.compile.len())
}

/// Link all artifacts into the output executable. Single attempt.
pub fn link<R: ToolRunner>(plan: &BuildPlan, runner: &mut R) -> BuildResult<()> {
    execute(runner, &plan.link, Stage::Link)
}

pub fn run_post_link<R: ToolRunner>(plan: &BuildPlan, runner: &mut R) -> BuildResult<()> {
    for invocation in &plan.post_link {
        execute(runner, invocation, Stage::PostLink)?;
    }
    Ok(())
}

/// Remove everything inside the temp directory, keeping the directory
/// itself and the output executable if it lives there (at any depth).
pub fn cleanup(plan: &BuildPlan, project_dir: &Path) -> BuildResult<usize> {
    let temp_dir = project_dir.join(&plan.temp_dir);
    let keep = project_dir.join(&plan.output);
    if !temp_dir.is_dir() {
        return Ok(0);
    }
    let removed = remove_contents_except(&temp_dir, &keep)?;
    tracing::debug!("removed {} entries from {}", removed, temp_dir.display());
    Ok(removed)
}

/// Empty `dir`, descending into (rather than deleting) any directory on the
/// way to `keep`.
fn remove_contents_except(dir: &Path, keep: &Path) -> BuildResult<usize> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        if path == keep {
            continue;
        }
        let is_dir = entry
            .file_type()
            .map_err(|e| BuildError::io(&path, e))?
            .is_dir();
        if is_dir && keep.starts_with(&path) {
            removed += remove_contents_except(&path, keep)?;
            continue;
        }
        let result = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| BuildError::io(&path, e))?;
        removed += 1;
    }
    Ok(removed)
}

/// Receives one tick per compile invocation.
pub trait ProgressSink {
    fn dot(&self);
}

impl ProgressSink for Progress {
    fn dot(&self) {
        self.print(". ");
    }
}

/// A sink that prints nothing.
pub struct Silent;

impl ProgressSink for Silent {
    fn dot(&self) {}
}

// --- COMMAND: Build & Run ---
/// Build, then run the executable from the project directory.
/// Returns the program's exit code.
pub fn build_and_run(
    config: &PipelineConfig,
    project_dir: &Path,
    options: &BuildOptions,
    run_args: &[String],
) -> anyhow::Result<i32> {
    let report = build_project(config, project_dir, options)?;

    let bin_path = project_dir.join(&report.output);
    if !options.quiet {
        println!("{} Running {}...\n", "▶".green(), report.output.display());
    }
    let status = Command::new(&bin_path)
        .args(run_args)
        .current_dir(project_dir)
        .status()
        .map_err(|source| BuildError::Spawn {
            program: bin_path.to_string_lossy().into_owned(),
            source,
        })?;
    Ok(status.code().unwrap_or(1))
}
