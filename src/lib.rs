//! # ccpipe - compile, link, clean
//!
//! ccpipe drives a system C/C++ toolchain through a fixed three-step
//! pipeline: compile every source to an object file in a temp directory,
//! link the objects into one executable, then empty the temp directory.
//! Each step only runs when the previous one fully succeeded.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter ccpipe.toml (optional, defaults work without it)
//! ccpipe init
//!
//! # Build
//! ccpipe build
//! ```
//!
//! ## Module Organization
//!
//! - [`build`] - Source enumeration, planning and the pipeline itself
//! - [`config`] - Configuration parsing (`ccpipe.toml`)
//! - [`error`] - Build error taxonomy
//! - [`logging`] - Diagnostic log setup

/// Source enumeration and the compile/link/cleanup pipeline.
pub mod build;

/// Configuration file parsing (`ccpipe.toml`).
pub mod config;

pub mod error;

/// `tracing` subscriber setup.
pub mod logging;

pub use error::{BuildError, BuildResult, Stage};
