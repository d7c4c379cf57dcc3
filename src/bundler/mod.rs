//! Handoff to the external bundler
//!
//! The plan is written as JSON into the output directory. When a bundler
//! command is configured it is then run with the plan file path as its
//! last argument; its output and exit status are passed through untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::env::ENV_VAR;
use crate::plan::BuildPlan;

/// Name of the plan file written into the output directory
pub const PLAN_FILE: &str = "build-plan.json";

/// Outcome of handing a plan to a bundler
#[derive(Debug, Clone)]
pub struct HandoffReport {
    /// Where the plan was written
    pub plan_path: PathBuf,

    /// Fingerprint of the handed-off plan
    pub fingerprint: String,

    /// Files the bundler is expected to produce
    pub output_files: Vec<String>,
}

/// Consumer of a resolved build plan
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Bundler name for logging
    fn name(&self) -> &str;

    /// Consume the plan
    async fn run(&self, plan: &BuildPlan) -> Result<HandoffReport>;
}

#[derive(Serialize)]
struct PlanEnvelope<'a> {
    fingerprint: &'a str,
    plan: &'a BuildPlan,
}

/// Writes the plan file and stops there
pub struct PlanFile {
    path: PathBuf,
}

impl PlanFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Plan file inside the plan's own output directory
    pub fn in_output_dir(plan: &BuildPlan) -> Self {
        Self::new(plan.output().path.join(PLAN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, plan: &BuildPlan) -> Result<HandoffReport> {
        let fingerprint = plan.fingerprint()?;
        let json = serde_json::to_string_pretty(&PlanEnvelope {
            fingerprint: &fingerprint,
            plan,
        })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write plan file: {}", self.path.display()))?;

        debug!("Wrote plan {} to {}", fingerprint, self.path.display());

        Ok(HandoffReport {
            plan_path: self.path.clone(),
            fingerprint,
            output_files: plan.output_files(),
        })
    }
}

#[async_trait]
impl Bundler for PlanFile {
    fn name(&self) -> &str {
        "plan-file"
    }

    async fn run(&self, plan: &BuildPlan) -> Result<HandoffReport> {
        self.write(plan).await
    }
}

/// Writes the plan file, then runs an external bundler on it
pub struct CommandBundler {
    plan_file: PlanFile,
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl CommandBundler {
    pub fn new(plan_file: PlanFile, command: &[String], cwd: PathBuf) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("Bundler command is empty")?;

        Ok(Self {
            plan_file,
            program: program.clone(),
            args: args.to_vec(),
            cwd,
        })
    }
}

#[async_trait]
impl Bundler for CommandBundler {
    fn name(&self) -> &str {
        &self.program
    }

    async fn run(&self, plan: &BuildPlan) -> Result<HandoffReport> {
        let report = self.plan_file.write(plan).await?;

        info!("Running bundler: {} {}", self.program, self.args.join(" "));

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&report.plan_path)
            .env(ENV_VAR, plan.environment().as_str())
            .current_dir(&self.cwd)
            .status()
            .await
            .with_context(|| format!("Failed to start bundler '{}'", self.program))?;

        if !status.success() {
            anyhow::bail!("Bundler '{}' failed with {}", self.program, status);
        }

        Ok(report)
    }
}

/// Pick the bundler configured for this project
pub fn from_config(config: &Config, plan: &BuildPlan) -> Result<Arc<dyn Bundler>> {
    let plan_file = PlanFile::in_output_dir(plan);

    if config.bundler.command.is_empty() {
        return Ok(Arc::new(plan_file));
    }

    Ok(Arc::new(CommandBundler::new(
        plan_file,
        &config.bundler.command,
        config.root.clone(),
    )?))
}
