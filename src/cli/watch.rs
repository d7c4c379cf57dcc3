//! Watch command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::env::Environment;
use crate::plan::DevServerDirective;
use crate::watch::PlanWatcher;

/// Re-resolve and hand off the plan whenever the project changes
#[derive(Args, Debug)]
pub struct WatchCommand {}

impl WatchCommand {
    pub async fn execute(&self, config_path: &str, env: Environment) -> Result<()> {
        let config = Config::load(config_path)?;

        eprintln!(
            "{} Watching {} in {} mode\n",
            "→".blue(),
            config.source_dir().display().to_string().cyan(),
            env
        );

        if env.is_development() {
            let dev = DevServerDirective::from(&config.dev);
            eprintln!(
                "  {} Dev server {}",
                "•".dimmed(),
                dev.url()?.as_str().cyan().underline()
            );
            if dev.hot {
                eprintln!(
                    "  {} Hot Module Replacement {}",
                    "•".dimmed(),
                    "enabled".green()
                );
            }
        }

        eprintln!(
            "  {} Press {} to stop\n",
            "•".dimmed(),
            "Ctrl+C".yellow()
        );

        PlanWatcher::new(PathBuf::from(config_path), env).run().await
    }
}
