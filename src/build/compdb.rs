//! `compile_commands.json` generation for editor tooling.

use super::plan::BuildPlan;
use crate::error::{BuildError, BuildResult};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPDB_FILE: &str = "compile_commands.json";

pub fn compile_commands(plan: &BuildPlan, project_dir: &Path) -> serde_json::Value {
    let directory = project_dir.to_string_lossy();
    let entries: Vec<serde_json::Value> = plan
        .units
        .iter()
        .zip(&plan.compile)
        .map(|(unit, invocation)| {
            json!({
                "directory": directory,
                "command": invocation.to_string(),
                "file": unit.source.to_string_lossy(),
                "output": unit.artifact.to_string_lossy(),
            })
        })
        .collect();
    serde_json::Value::Array(entries)
}

/// Write the database next to the project and return its path.
pub fn write_compile_commands(plan: &BuildPlan, project_dir: &Path) -> BuildResult<PathBuf> {
    let path = project_dir.join(COMPDB_FILE);
    let json_str = serde_json::to_string_pretty(&compile_commands(plan, project_dir))
        .map_err(|e| BuildError::io(&path, e.into()))?;
    fs::write(&path, json_str).map_err(|e| BuildError::io(&path, e))?;
    Ok(path)
}
