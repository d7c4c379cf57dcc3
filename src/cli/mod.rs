//! Command-line interface for Pagepack
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `plan`: Resolve and print the build plan
//! - `build`: Resolve and hand the plan to the bundler
//! - `watch`: Keep the handed-off plan current while files change
//! - `explain`: Show the transform chain applied to files
//! - `init`: Project scaffolding

mod build;
mod explain;
mod init;
mod plan;
mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use crate::config::CONFIG_FILE;
use crate::env::Environment;

pub use build::BuildCommand;
pub use explain::ExplainCommand;
pub use init::InitCommand;
pub use plan::PlanCommand;
pub use watch::WatchCommand;

/// Pagepack - build-plan resolution for multi-page frontend projects
#[derive(Parser, Debug)]
#[command(name = "pagepack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to pagepack.toml config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    pub config: String,

    /// Build environment; defaults to NODE_ENV ("development" or anything else for production)
    #[arg(short, long, global = true, value_enum)]
    pub mode: Option<Environment>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the build plan and print it as JSON
    Plan(PlanCommand),

    /// Resolve the build plan and hand it to the bundler
    Build(BuildCommand),

    /// Re-resolve and hand off the plan whenever the project changes
    Watch(WatchCommand),

    /// Show which transform chain handles the given files
    Explain(ExplainCommand),

    /// Initialize a new project
    Init(InitCommand),
}

impl Cli {
    /// The environment for this run, resolved once
    pub fn environment(&self) -> Environment {
        self.mode.unwrap_or_else(Environment::resolve)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        let env = self.environment();
        debug!("Environment: {}", env);

        match &self.command {
            Commands::Plan(cmd) => cmd.execute(&self.config, env),
            Commands::Build(cmd) => cmd.execute(&self.config, env).await,
            Commands::Watch(cmd) => cmd.execute(&self.config, env).await,
            Commands::Explain(cmd) => cmd.execute(&self.config, env),
            Commands::Init(cmd) => cmd.execute(),
        }
    }
}

/// Print the Pagepack banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "▣".cyan(),
        "Pagepack".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
