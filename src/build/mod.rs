mod clean;
mod compdb;
mod pipeline;
pub mod plan;
pub mod runner;
pub mod sources;

pub use clean::clean;
pub use compdb::{COMPDB_FILE, compile_commands, write_compile_commands};
pub use pipeline::{
    BuildOptions, BuildReport, ProgressSink, Silent, build_and_run, build_project, cleanup,
    compile_all, link, prepare_plan, run_pipeline, run_post_link,
};
pub use plan::{BuildPlan, CompileUnit, plan_build};
pub use runner::{Invocation, SystemRunner, ToolExit, ToolRunner};
pub use sources::enumerate_sources;
