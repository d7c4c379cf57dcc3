//! Production optimization policy

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::env::Environment;
use crate::plan::BuildPlan;

/// Split shared modules out of every chunk, initial and async alike
pub const SPLIT_ALL_CHUNKS: &str = "all";

/// Shared-chunk extraction directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitChunks {
    /// Which chunks shared modules are split out of
    pub chunks: String,
}

/// What a minifier applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinifyTarget {
    Style,
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minimizer {
    pub target: MinifyTarget,

    /// Identifier of the external minifier
    pub tool: String,
}

/// Optimization directives, run by the bundler after every transform chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationDirectives {
    pub split_chunks: SplitChunks,
    pub minimizers: Vec<Minimizer>,
}

impl OptimizationDirectives {
    /// Directives used for production builds
    pub fn production() -> Self {
        Self {
            split_chunks: SplitChunks {
                chunks: SPLIT_ALL_CHUNKS.to_string(),
            },
            minimizers: vec![
                Minimizer {
                    target: MinifyTarget::Style,
                    tool: "css-minimizer".to_string(),
                },
                Minimizer {
                    target: MinifyTarget::Script,
                    tool: "terser".to_string(),
                },
            ],
        }
    }
}

/// Apply the optimization policy for `env`.
///
/// Production plans gain code splitting and minification; development
/// plans are returned unchanged.
pub fn apply(plan: BuildPlan, env: Environment) -> BuildPlan {
    match env {
        Environment::Production => {
            debug!("Adding production optimization directives");
            plan.with_optimization(OptimizationDirectives::production())
        }
        Environment::Development => plan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::config::HtmlConfig;
    use crate::entries::EntrySpec;
    use crate::output::{NamingRule, OutputRules};
    use crate::plan::{emit, PlanInputs};
    use crate::transform::chains_for;

    fn plan(env: Environment) -> BuildPlan {
        let naming = NamingRule::new(env);
        emit(PlanInputs {
            environment: env,
            context: PathBuf::from("src"),
            entries: vec![EntrySpec::new("main", ["index.js"])],
            pages: Vec::new(),
            output: OutputRules::new(&naming, PathBuf::from("dist"), "/".to_string(), true),
            naming,
            chains: chains_for(env),
            optimization: None,
            html: HtmlConfig::default(),
            dev_server: None,
        })
        .unwrap()
    }

    #[test]
    fn test_production_adds_split_and_minifiers() {
        let optimized = apply(plan(Environment::Production), Environment::Production);
        let directives = optimized.optimization().unwrap();

        assert_eq!(directives.split_chunks.chunks, "all");
        let targets: Vec<MinifyTarget> = directives.minimizers.iter().map(|m| m.target).collect();
        assert_eq!(targets, vec![MinifyTarget::Style, MinifyTarget::Script]);
    }

    #[test]
    fn test_development_is_unchanged() {
        let original = plan(Environment::Development);
        let applied = apply(original.clone(), Environment::Development);
        assert_eq!(applied, original);
        assert!(applied.optimization().is_none());
    }

    #[test]
    fn test_chains_untouched_by_policy() {
        let original = plan(Environment::Production);
        let optimized = apply(original.clone(), Environment::Production);
        assert_eq!(optimized.chains(), original.chains());
    }
}
