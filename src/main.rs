//! # ccpipe CLI Entry Point
//!
//! Parses arguments with clap and routes to the build handlers. Running
//! `ccpipe` with no subcommand is the same as `ccpipe build`.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ccpipe::build::{self, BuildOptions};
use ccpipe::config::{self, CONFIG_FILE, PipelineConfig};
use ccpipe::logging;

#[derive(Parser)]
#[command(name = "ccpipe")]
#[command(about = "Compile, link and clean up a small C/C++ program", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file [default: ./ccpipe.toml if present]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log every tool invocation
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and link the program (default)
    Build(BuildArgs),
    /// Build, then run the output executable
    Run {
        /// Leave object files in the temp directory
        #[arg(long)]
        keep_artifacts: bool,
        /// Arguments passed to the program
        #[arg(num_args = 0.., allow_hyphen_values = true, last = true)]
        args: Vec<String>,
    },
    /// Remove the temp artifact directory
    Clean,
    /// Write a starter ccpipe.toml
    Init {
        /// Discover sources by walking the project instead of a fixed list
        #[arg(long)]
        discover: bool,
        /// Overwrite an existing ccpipe.toml
        #[arg(long)]
        force: bool,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

#[derive(Args, Default)]
struct BuildArgs {
    /// Print the commands that would run without running them
    #[arg(long)]
    dry_run: bool,
    /// Leave object files in the temp directory
    #[arg(long)]
    keep_artifacts: bool,
    /// Write compile_commands.json for editor tooling
    #[arg(long)]
    compile_commands: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "x".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let project_dir = std::env::current_dir().context("Failed to read current directory")?;

    match cli.command.unwrap_or(Commands::Build(BuildArgs::default())) {
        Commands::Build(args) => {
            let config = load(cli.config.as_deref(), &project_dir)?;
            handle_build(&config, &project_dir, &args, cli.quiet)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            keep_artifacts,
            args,
        } => {
            let config = load(cli.config.as_deref(), &project_dir)?;
            let options = BuildOptions {
                keep_artifacts,
                quiet: cli.quiet,
            };
            let code = build::build_and_run(&config, &project_dir, &options, &args)?;
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
        }
        Commands::Clean => {
            let config = load(cli.config.as_deref(), &project_dir)?;
            build::clean(&config, &project_dir, cli.quiet)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { discover, force } => {
            handle_init(&project_dir, discover, force)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ccpipe", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load(explicit: Option<&Path>, project_dir: &Path) -> Result<PipelineConfig> {
    config::load_config(explicit, project_dir).context("Failed to load configuration")
}

fn handle_build(
    config: &PipelineConfig,
    project_dir: &Path,
    args: &BuildArgs,
    quiet: bool,
) -> Result<()> {
    let plan = build::prepare_plan(config, project_dir)?;

    if args.compile_commands {
        let path = build::write_compile_commands(&plan, project_dir)?;
        if !quiet {
            println!("{} Wrote {}", "✓".green(), path.display());
        }
    }

    if args.dry_run {
        println!("{} DRY RUN - nothing will be executed", "!".yellow());
        for invocation in plan
            .compile
            .iter()
            .chain(std::iter::once(&plan.link))
            .chain(&plan.post_link)
        {
            println!("   Would execute: {}", invocation);
        }
        if !args.keep_artifacts {
            println!("   Would clean: {}", plan.temp_dir.display());
        }
        return Ok(());
    }

    let options = BuildOptions {
        keep_artifacts: args.keep_artifacts,
        quiet,
    };
    let mut runner = build::SystemRunner::new(project_dir);
    build::run_pipeline(&plan, project_dir, &mut runner, &options)?;
    Ok(())
}

fn handle_init(project_dir: &Path, discover: bool, force: bool) -> Result<()> {
    let path = project_dir.join(CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", CONFIG_FILE);
    }
    let contents = toml::to_string_pretty(&config::starter_config(discover))
        .context("Failed to serialize starter configuration")?;
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Created {}", "✓".green(), CONFIG_FILE);
    Ok(())
}
