//! ebdeploy: Elastic Beanstalk deploy and cleanup reconciliation
//!
//! Layers, innermost first:
//! - `domain`: entities, validation, remote error taxonomy, platform selection
//! - `application`: per-resource services, the step pipeline, the workflows
//! - `infrastructure`: I/O traits, the `aws` CLI adapter, scratch dirs, DI
//! - `cli`: arguments, dispatch, exit codes, terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
