//! Build plan assembly
//!
//! The plan is the single value handed to the external bundler. It is
//! built once per run and never mutated afterwards; the optimization
//! policy returns a new plan instead of editing one in place.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::config::{Config, DevConfig, HtmlConfig};
use crate::entries::{bind, BoundPage, EntrySpec};
use crate::env::Environment;
use crate::error::{PlanError, Result};
use crate::optimize::{self, OptimizationDirectives};
use crate::output::{NamingRule, OutputRules};
use crate::transform::{ChainAssembler, ChainOptions, ChainTable};
use crate::utils::{hash_content, relative_to};

/// Per-page generation directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDirective {
    pub name: String,

    /// Template path, relative to the plan context when it lies under it
    pub template: PathBuf,

    /// Generated document filename
    pub filename: String,

    /// Chunks injected into the page, in load order
    pub chunks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Collapse whitespace in the generated document
    pub collapse_whitespace: bool,
}

/// Development server surface; only present in development plans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevServerDirective {
    pub host: String,
    pub port: u16,
    pub hot: bool,
    pub live_reload: bool,
    pub open: bool,
}

impl DevServerDirective {
    pub fn url(&self) -> std::result::Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
    }
}

impl From<&DevConfig> for DevServerDirective {
    fn from(dev: &DevConfig) -> Self {
        Self {
            host: dev.host.clone(),
            port: dev.port,
            hot: dev.hot,
            live_reload: dev.live_reload,
            open: dev.open,
        }
    }
}

/// Everything the emitter aggregates
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub environment: Environment,
    pub context: PathBuf,
    pub entries: Vec<EntrySpec>,
    pub pages: Vec<BoundPage>,
    pub naming: NamingRule,
    pub output: OutputRules,
    pub chains: ChainTable,
    pub optimization: Option<OptimizationDirectives>,
    pub html: HtmlConfig,
    pub dev_server: Option<DevServerDirective>,
}

/// The resolved build plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    environment: Environment,
    context: PathBuf,
    entries: Vec<EntrySpec>,
    pages: Vec<PageDirective>,
    naming: NamingRule,
    output: OutputRules,
    chains: ChainTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    optimization: Option<OptimizationDirectives>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dev_server: Option<DevServerDirective>,
}

/// Aggregate resolved components into a plan.
///
/// Only re-asserts what upstream components already guarantee; any
/// failure here is an internal inconsistency.
pub fn emit(inputs: PlanInputs) -> Result<BuildPlan> {
    let PlanInputs {
        environment,
        context,
        entries,
        pages,
        naming,
        output,
        chains,
        optimization,
        html,
        dev_server,
    } = inputs;

    if naming.environment() != environment {
        return Err(PlanError::IncompletePlan(format!(
            "naming rule is bound to {} in a {} plan",
            naming.environment(),
            environment
        )));
    }

    let mut chunk_names = HashSet::new();
    for entry in &entries {
        if !chunk_names.insert(entry.chunk.as_str()) {
            return Err(PlanError::IncompletePlan(format!(
                "chunk '{}' is defined twice",
                entry.chunk
            )));
        }
        if entry.scripts.is_empty() {
            return Err(PlanError::IncompletePlan(format!(
                "chunk '{}' has no scripts",
                entry.chunk
            )));
        }
    }

    let mut page_names = HashSet::new();
    let mut page_files = HashSet::new();
    for bound in &pages {
        if !page_names.insert(bound.page.name.to_lowercase()) {
            return Err(PlanError::IncompletePlan(format!(
                "page '{}' is defined twice",
                bound.page.name
            )));
        }
        if !page_files.insert(bound.page.filename.as_str()) {
            return Err(PlanError::IncompletePlan(format!(
                "two pages write {}",
                bound.page.filename
            )));
        }
        if bound.chunks.is_empty() {
            return Err(PlanError::IncompletePlan(format!(
                "page '{}' is not bound to any chunk",
                bound.page.name
            )));
        }
        if let Some(chunk) = bound.chunks.iter().find(|c| !chunk_names.contains(c.as_str())) {
            return Err(PlanError::IncompletePlan(format!(
                "page '{}' references unresolved chunk '{}'",
                bound.page.name, chunk
            )));
        }
    }

    let missing = chains.missing_kinds();
    if !missing.is_empty() {
        return Err(PlanError::IncompletePlan(format!(
            "no transform chain for {:?}",
            missing
        )));
    }
    if let Some((kind, _)) = chains.iter().find(|(_, chain)| !chain.is_well_ordered()) {
        return Err(PlanError::IncompletePlan(format!(
            "transform chain for {:?} is out of order",
            kind
        )));
    }

    if environment.is_development() && optimization.is_some() {
        return Err(PlanError::IncompletePlan(
            "optimization directives in a development plan".to_string(),
        ));
    }
    if environment.is_production() && dev_server.is_some() {
        return Err(PlanError::IncompletePlan(
            "dev server directive in a production plan".to_string(),
        ));
    }

    let collapse_whitespace = environment.is_production() && html.minify;
    let pages = pages
        .into_iter()
        .map(|bound| PageDirective {
            template: relative_to(&bound.page.template, &context),
            name: bound.page.name,
            filename: bound.page.filename,
            chunks: bound.chunks,
            title: html.title.clone(),
            collapse_whitespace,
        })
        .collect();

    Ok(BuildPlan {
        environment,
        context,
        entries,
        pages,
        naming,
        output,
        chains,
        optimization,
        dev_server,
    })
}

impl BuildPlan {
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn context(&self) -> &Path {
        &self.context
    }

    pub fn entries(&self) -> &[EntrySpec] {
        &self.entries
    }

    pub fn pages(&self) -> &[PageDirective] {
        &self.pages
    }

    pub fn naming(&self) -> &NamingRule {
        &self.naming
    }

    pub fn output(&self) -> &OutputRules {
        &self.output
    }

    pub fn chains(&self) -> &ChainTable {
        &self.chains
    }

    pub fn optimization(&self) -> Option<&OptimizationDirectives> {
        self.optimization.as_ref()
    }

    pub fn dev_server(&self) -> Option<&DevServerDirective> {
        self.dev_server.as_ref()
    }

    /// Scripts of a chunk in load order
    pub fn scripts_for(&self, chunk: &str) -> Option<&[PathBuf]> {
        self.entries
            .iter()
            .find(|e| e.chunk == chunk)
            .map(|e| e.scripts.as_slice())
    }

    /// Return a copy of this plan carrying `directives`
    pub fn with_optimization(self, directives: OptimizationDirectives) -> Self {
        Self {
            optimization: Some(directives),
            ..self
        }
    }

    /// Chunks loaded by at least one page, in entry order
    pub fn referenced_chunks(&self) -> Vec<&str> {
        let used: HashSet<&str> = self
            .pages
            .iter()
            .flat_map(|p| p.chunks.iter().map(String::as_str))
            .collect();
        self.entries
            .iter()
            .map(|e| e.chunk.as_str())
            .filter(|c| used.contains(c))
            .collect()
    }

    /// Files the bundler will write, relative to the output directory.
    ///
    /// Pages, then a script and stylesheet per referenced chunk, then the
    /// asset filename templates.
    pub fn output_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.pages.iter().map(|p| p.filename.clone()).collect();
        for chunk in self.referenced_chunks() {
            files.push(self.naming.filename_for(chunk, "js"));
            files.push(self.naming.filename_for(chunk, "css"));
        }
        files.push(self.output.image_filename.clone());
        files.push(self.output.font_filename.clone());
        files
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Digest of the serialized plan; equal plans share a fingerprint
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        Ok(hash_content(serde_json::to_string(self)?.as_bytes()))
    }
}

/// Resolves a project configuration into a build plan
pub struct Planner<'a> {
    config: &'a Config,
}

impl<'a> Planner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Resolve the plan for `env`.
    ///
    /// Pages are resolved first so a missing pages directory fails before
    /// anything else happens.
    pub fn resolve(&self, env: Environment) -> Result<BuildPlan> {
        let config = self.config;
        let context = config.source_dir();

        let pages = config.page_source().resolve(&context)?;
        debug!("Resolved {} page(s)", pages.len());

        let entries = config.entry_specs();
        let bound = bind(&entries, &pages)?;

        let naming = NamingRule::with_hash_token(env, config.output.hash_token.clone());
        let output = OutputRules::new(
            &naming,
            config.output_dir(),
            config.output.public_path.clone(),
            config.output.clean,
        );

        let chains = ChainAssembler::new(ChainOptions {
            template_extension: config.template_extension().to_string(),
        })
        .chains_for(env);

        let dev_server = env
            .is_development()
            .then(|| DevServerDirective::from(&config.dev));

        let plan = emit(PlanInputs {
            environment: env,
            context,
            entries,
            pages: bound,
            naming,
            output,
            chains,
            optimization: None,
            html: config.html.clone(),
            dev_server,
        })?;

        let plan = optimize::apply(plan, env);

        info!(
            "Resolved {} plan: {} entr{}, {} page(s)",
            env,
            plan.entries().len(),
            if plan.entries().len() == 1 { "y" } else { "ies" },
            plan.pages().len()
        );

        Ok(plan)
    }
}
