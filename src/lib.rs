//! Pagepack library
//!
//! Resolves a multi-page frontend project into a build plan for an
//! external bundler: which pages exist, which chunks they load, how output
//! files are named, and which transform chain each file type goes through.

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod pages;
pub mod output;
pub mod entries;
pub mod transform;
pub mod optimize;
pub mod plan;
pub mod bundler;
pub mod watch;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use env::Environment;
pub use error::PlanError;
pub use plan::{BuildPlan, Planner};
