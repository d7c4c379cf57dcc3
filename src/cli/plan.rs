//! Plan command implementation

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::config::Config;
use crate::env::Environment;
use crate::plan::Planner;

/// Resolve the build plan and print it as JSON
#[derive(Args, Debug)]
pub struct PlanCommand {
    /// Write the plan to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl PlanCommand {
    pub fn execute(&self, config_path: &str, env: Environment) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Config::load(config_path)?;

        let plan = Planner::new(&config).resolve(env)?;

        let json = if self.compact {
            serde_json::to_string(&plan)?
        } else {
            plan.to_json()?
        };

        match &self.out {
            Some(path) => {
                fs::write(path, json)
                    .with_context(|| format!("Failed to write plan: {}", path.display()))?;
                eprintln!(
                    "{} Wrote {} plan to {}",
                    "✓".green().bold(),
                    env,
                    path.display().to_string().cyan()
                );
            }
            None => println!("{}", json),
        }

        Ok(())
    }
}
