//! Build command implementation

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::{self, Bundler, PlanFile};
use crate::config::Config;
use crate::env::Environment;
use crate::plan::Planner;
use crate::utils::format_duration;

/// Resolve the build plan and hand it to the bundler
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Only write the plan file; do not run the configured bundler command
    #[arg(long)]
    pub plan_only: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str, env: Environment) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let config = Config::load(config_path)?;

        eprintln!("{} Resolving {} build plan...", "→".blue(), env.to_string().cyan());

        // Nothing touches the output directory until the plan resolves
        let plan = Planner::new(&config).resolve(env)?;

        let bundler: Arc<dyn Bundler> = if self.plan_only {
            Arc::new(PlanFile::in_output_dir(&plan))
        } else {
            bundler::from_config(&config, &plan)?
        };

        let report = bundler.run(&plan).await?;

        eprintln!(
            "\n{} Plan {} handed to {} in {}\n",
            "✓".green().bold(),
            report.fingerprint.cyan(),
            bundler.name(),
            format_duration(start.elapsed())
        );

        eprintln!("  {} {}", "plan".dimmed(), report.plan_path.display().to_string().cyan());
        for file in &report.output_files {
            eprintln!("  {} {}", "•".dimmed(), file);
        }

        if let Some(optimization) = plan.optimization() {
            eprintln!(
                "\n  {} split chunks: {}, {} minifier(s)",
                "•".dimmed(),
                optimization.split_chunks.chunks,
                optimization.minimizers.len()
            );
        }

        eprintln!();

        Ok(())
    }
}
