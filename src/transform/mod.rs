//! Transform chain assembly
//!
//! Builds the per-file-type step lists handed to the bundler. The step
//! sequence for a file type is fixed; the environment only changes step
//! options.

use std::collections::BTreeMap;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::env::Environment;
use crate::output::{ASSET_FILENAME, FONTS_DIR, IMAGES_DIR};
use crate::pages::DEFAULT_TEMPLATE_EXTENSION;

/// File types with a transform chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Style,
    PreprocessedStyle,
    Template,
    Image,
    Font,
    Script,
    ExtendedScript,
}

impl FileKind {
    pub const ALL: [FileKind; 7] = [
        FileKind::Style,
        FileKind::PreprocessedStyle,
        FileKind::Template,
        FileKind::Image,
        FileKind::Font,
        FileKind::Script,
        FileKind::ExtendedScript,
    ];

    /// The step sequence every chain for this kind must follow
    pub fn required_roles(self) -> &'static [StepRole] {
        use StepRole::*;
        match self {
            FileKind::Style => &[ExtractStyle, StyleToModule],
            FileKind::PreprocessedStyle => &[ExtractStyle, StyleToModule, PreprocessStyle],
            FileKind::Template => &[RawRead, CompileTemplate],
            FileKind::Image | FileKind::Font => &[EmitAsset],
            FileKind::Script | FileKind::ExtendedScript => &[Transpile],
        }
    }
}

/// What a transform step does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepRole {
    /// Extract styles into a stylesheet, or mark them for inline patching
    ExtractStyle,
    /// Turn a stylesheet into a module
    StyleToModule,
    /// Compile a preprocessed stylesheet
    PreprocessStyle,
    /// Read a file verbatim
    RawRead,
    /// Compile a page template
    CompileTemplate,
    /// Copy a file into the output tree
    EmitAsset,
    /// Transpile a script
    Transpile,
}

/// Pattern over file extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMatcher {
    pub kind: FileKind,
    pub extensions: Vec<String>,

    /// Regex form of the matcher, as bundlers expect in rule tests
    pub test: String,
}

impl FileMatcher {
    pub fn new<I, S>(kind: FileKind, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: Vec<String> = extensions.into_iter().map(Into::into).collect();
        let escaped: Vec<String> = extensions.iter().map(|e| regex::escape(e)).collect();
        let test = match escaped.as_slice() {
            [single] => format!(r"\.{}$", single),
            many => format!(r"\.({})$", many.join("|")),
        };
        Self {
            kind,
            extensions,
            test,
        }
    }

    /// Glob form of the matcher
    pub fn glob(&self) -> String {
        match self.extensions.as_slice() {
            [single] => format!("*.{}", single),
            many => format!("*.{{{}}}", many.join(",")),
        }
    }
}

/// One step of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStep {
    pub role: StepRole,

    /// Identifier of the external tool performing the step
    pub tool: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl TransformStep {
    pub fn new(role: StepRole, tool: impl Into<String>) -> Self {
        Self {
            role,
            tool: tool.into(),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }
}

/// Steps applied to files matched by `matcher`, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformChain {
    pub matcher: FileMatcher,
    pub steps: Vec<TransformStep>,
}

impl TransformChain {
    pub fn roles(&self) -> Vec<StepRole> {
        self.steps.iter().map(|s| s.role).collect()
    }

    /// Whether the steps follow the sequence required for the matched kind
    pub fn is_well_ordered(&self) -> bool {
        self.roles() == self.matcher.kind.required_roles()
    }
}

/// Chains keyed by file kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainTable {
    chains: BTreeMap<FileKind, TransformChain>,
}

impl ChainTable {
    pub fn get(&self, kind: FileKind) -> Option<&TransformChain> {
        self.chains.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileKind, &TransformChain)> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Kinds without a chain
    pub fn missing_kinds(&self) -> Vec<FileKind> {
        FileKind::ALL
            .into_iter()
            .filter(|k| !self.chains.contains_key(k))
            .collect()
    }

    /// Compile the matchers for classifying source files
    pub fn classifier(&self) -> Result<Classifier, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        let mut kinds = Vec::with_capacity(self.chains.len());
        for (kind, chain) in &self.chains {
            builder.add(
                GlobBuilder::new(&chain.matcher.glob())
                    .case_insensitive(true)
                    .build()?,
            );
            kinds.push(*kind);
        }
        Ok(Classifier {
            set: builder.build()?,
            kinds,
        })
    }
}

/// Maps source paths to the file kind whose chain handles them
pub struct Classifier {
    set: GlobSet,
    kinds: Vec<FileKind>,
}

impl Classifier {
    pub fn classify(&self, path: &Path) -> Option<FileKind> {
        self.set
            .matches(path)
            .into_iter()
            .next()
            .map(|idx| self.kinds[idx])
    }
}

/// Chain assembly options that do not depend on the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOptions {
    pub template_extension: String,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            template_extension: DEFAULT_TEMPLATE_EXTENSION.to_string(),
        }
    }
}

/// Builds chain tables for an environment
#[derive(Debug, Clone, Default)]
pub struct ChainAssembler {
    options: ChainOptions,
}

impl ChainAssembler {
    pub fn new(options: ChainOptions) -> Self {
        Self { options }
    }

    /// Assemble a fresh chain table.
    ///
    /// Repeated calls with the same environment yield equal tables.
    pub fn chains_for(&self, env: Environment) -> ChainTable {
        let dev = env.is_development();

        let extract = || {
            TransformStep::new(StepRole::ExtractStyle, "extract-css")
                .with_option("hmr", json!(dev))
                .with_option("reload_all", json!(true))
        };
        let style_module = || TransformStep::new(StepRole::StyleToModule, "css");
        let emit_asset = |dir: &str| {
            TransformStep::new(StepRole::EmitAsset, "file")
                .with_option("output_path", json!(dir))
                .with_option("name", json!(ASSET_FILENAME))
        };

        let chains = [
            TransformChain {
                matcher: FileMatcher::new(FileKind::Style, ["css"]),
                steps: vec![extract(), style_module()],
            },
            TransformChain {
                matcher: FileMatcher::new(FileKind::PreprocessedStyle, ["scss", "sass"]),
                steps: vec![
                    extract(),
                    style_module(),
                    TransformStep::new(StepRole::PreprocessStyle, "sass"),
                ],
            },
            TransformChain {
                matcher: FileMatcher::new(
                    FileKind::Template,
                    [self.options.template_extension.as_str()],
                ),
                steps: vec![
                    TransformStep::new(StepRole::RawRead, "raw"),
                    TransformStep::new(StepRole::CompileTemplate, "template")
                        .with_option("hmr", json!(dev))
                        .with_option("reload_all", json!(true)),
                ],
            },
            TransformChain {
                matcher: FileMatcher::new(FileKind::Image, ["png", "jpg", "jpeg", "svg", "gif"]),
                steps: vec![emit_asset(IMAGES_DIR)],
            },
            TransformChain {
                matcher: FileMatcher::new(FileKind::Font, ["ttf", "woff", "woff2", "eot"]),
                steps: vec![emit_asset(FONTS_DIR)],
            },
            TransformChain {
                matcher: FileMatcher::new(FileKind::Script, ["js", "mjs"]),
                steps: vec![TransformStep::new(StepRole::Transpile, "transpile")
                    .with_option("syntax", json!([]))],
            },
            TransformChain {
                matcher: FileMatcher::new(FileKind::ExtendedScript, ["jsx", "ts", "tsx"]),
                steps: vec![TransformStep::new(StepRole::Transpile, "transpile")
                    .with_option("syntax", json!(["jsx", "typescript"]))],
            },
        ];

        ChainTable {
            chains: chains
                .into_iter()
                .map(|chain| (chain.matcher.kind, chain))
                .collect(),
        }
    }
}

/// Assemble the chain table with default options
pub fn chains_for(env: Environment) -> ChainTable {
    ChainAssembler::default().chains_for(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_well_ordered_chain() {
        for env in [Environment::Development, Environment::Production] {
            let table = chains_for(env);
            assert!(table.missing_kinds().is_empty());
            for (kind, chain) in table.iter() {
                assert_eq!(chain.roles(), kind.required_roles(), "{kind:?}");
                assert!(chain.is_well_ordered());
            }
        }
    }

    #[test]
    fn test_chains_are_stable() {
        let a = chains_for(Environment::Production);
        let b = chains_for(Environment::Production);
        assert_eq!(a, b);
    }

    #[test]
    fn test_step_sequence_independent_of_environment() {
        let dev = chains_for(Environment::Development);
        let prod = chains_for(Environment::Production);
        for kind in FileKind::ALL {
            assert_eq!(
                dev.get(kind).unwrap().roles(),
                prod.get(kind).unwrap().roles()
            );
        }
    }

    #[test]
    fn test_extract_step_hmr_follows_environment() {
        let hmr = |env| {
            chains_for(env).get(FileKind::PreprocessedStyle).unwrap().steps[0]
                .options
                .get("hmr")
                .cloned()
        };
        assert_eq!(hmr(Environment::Development), Some(json!(true)));
        assert_eq!(hmr(Environment::Production), Some(json!(false)));
    }

    #[test]
    fn test_swapped_steps_are_detected() {
        let mut chain = chains_for(Environment::Production)
            .get(FileKind::PreprocessedStyle)
            .unwrap()
            .clone();
        chain.steps.swap(0, 2);
        assert!(!chain.is_well_ordered());
    }

    #[test]
    fn test_asset_routing() {
        let table = chains_for(Environment::Production);
        let image = &table.get(FileKind::Image).unwrap().steps[0];
        let font = &table.get(FileKind::Font).unwrap().steps[0];
        assert_eq!(image.options["output_path"], json!("assets/images"));
        assert_eq!(font.options["output_path"], json!("assets/fonts"));
        assert_eq!(image.options["name"], json!("[name].[ext]"));
    }

    #[test]
    fn test_matcher_forms() {
        let m = FileMatcher::new(FileKind::Font, ["ttf", "woff"]);
        assert_eq!(m.test, r"\.(ttf|woff)$");
        assert_eq!(m.glob(), "*.{ttf,woff}");

        let m = FileMatcher::new(FileKind::Style, ["css"]);
        assert_eq!(m.test, r"\.css$");
        assert_eq!(m.glob(), "*.css");
    }

    #[test]
    fn test_classifier() {
        let table = ChainAssembler::new(ChainOptions {
            template_extension: "pug".to_string(),
        })
        .chains_for(Environment::Development);
        let classifier = table.classifier().unwrap();

        assert_eq!(classifier.classify(Path::new("src/a.css")), Some(FileKind::Style));
        assert_eq!(
            classifier.classify(Path::new("src/styles/main.SCSS")),
            Some(FileKind::PreprocessedStyle)
        );
        assert_eq!(classifier.classify(Path::new("index.pug")), Some(FileKind::Template));
        assert_eq!(classifier.classify(Path::new("logo.png")), Some(FileKind::Image));
        assert_eq!(classifier.classify(Path::new("fonts/a.woff2")), Some(FileKind::Font));
        assert_eq!(classifier.classify(Path::new("app.js")), Some(FileKind::Script));
        assert_eq!(classifier.classify(Path::new("App.tsx")), Some(FileKind::ExtendedScript));
        assert_eq!(classifier.classify(Path::new("README.md")), None);
    }
}
