//! Artifact cleanup for `ccpipe clean`.
//!
//! Unlike the post-build cleanup, this removes the temp directory itself.

use crate::config::PipelineConfig;
use crate::error::{BuildError, BuildResult};
use colored::*;
use std::fs;
use std::path::Path;

/// Returns `true` if anything was removed.
pub fn clean(config: &PipelineConfig, project_dir: &Path, quiet: bool) -> BuildResult<bool> {
    let temp_dir = project_dir.join(&config.output.temp_dir);
    let cleaned = if temp_dir.exists() {
        fs::remove_dir_all(&temp_dir).map_err(|e| BuildError::io(&temp_dir, e))?;
        true
    } else {
        false
    };

    if !quiet {
        if cleaned {
            println!(
                "{} Removed {}",
                "✓".green(),
                config.output.temp_dir.display()
            );
        } else {
            println!("{} Nothing to clean", "!".yellow());
        }
    }
    Ok(cleaned)
}
