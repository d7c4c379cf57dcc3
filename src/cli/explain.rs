//! Explain command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::env::Environment;
use crate::transform::{ChainAssembler, ChainOptions};
use crate::utils::slash_path;

/// Show which transform chain handles the given files
#[derive(Args, Debug)]
pub struct ExplainCommand {
    /// Files to classify
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl ExplainCommand {
    pub fn execute(&self, config_path: &str, env: Environment) -> Result<()> {
        let config = Config::load(config_path)?;

        let chains = ChainAssembler::new(ChainOptions {
            template_extension: config.template_extension().to_string(),
        })
        .chains_for(env);
        let classifier = chains.classifier()?;

        for file in &self.files {
            let shown = slash_path(file);
            let Some(chain) = classifier.classify(file).and_then(|kind| chains.get(kind)) else {
                println!("{}: {}", shown, "no transform chain".yellow());
                continue;
            };

            let steps: Vec<&str> = chain.steps.iter().map(|s| s.tool.as_str()).collect();
            println!(
                "{}: {:?} [{}]",
                shown,
                chain.matcher.kind,
                steps.join(" -> ")
            );
        }

        Ok(())
    }
}
