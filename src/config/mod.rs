//! Configuration handling for Pagepack
//!
//! Parses and manages pagepack.toml project descriptions.

mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use schema::*;

use crate::entries::EntrySpec;
use crate::output::is_valid_hash_token;
use crate::pages::{PageEntry, PageSource};
use crate::transform::{chains_for, FileKind};
use crate::env::Environment;
use crate::utils::clean_path;

/// Default config file name
pub const CONFIG_FILE: &str = "pagepack.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project metadata
    pub project: ProjectConfig,

    /// Source root; entries and templates resolve against it
    #[serde(default = "default_source")]
    pub source: String,

    /// Entries: chunk name -> script or ordered scripts
    #[serde(default)]
    pub entries: BTreeMap<String, EntryScripts>,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Page discovery settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<PagesConfig>,

    /// Hand-declared pages, used instead of discovery
    #[serde(default, rename = "page", skip_serializing_if = "Vec::is_empty")]
    pub page_list: Vec<PageEntry>,

    /// Generated page settings
    #[serde(default)]
    pub html: HtmlConfig,

    /// Development server settings
    #[serde(default)]
    pub dev: DevConfig,

    /// External bundler
    #[serde(default)]
    pub bundler: BundlerConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_source() -> String {
    "src".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        // Root is the directory containing the config file
        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self::parse(&content, root)
    }

    /// Parse and validate configuration text rooted at `root`
    pub fn parse(content: &str, root: PathBuf) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).with_context(|| format!("Failed to parse {}", CONFIG_FILE))?;

        config.root = root;
        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            project: ProjectConfig {
                name: "my-site".to_string(),
                version: "0.1.0".to_string(),
            },
            source: default_source(),
            entries: {
                let mut map = BTreeMap::new();
                map.insert("main".to_string(), EntryScripts::One("./index.js".to_string()));
                map
            },
            output: OutputConfig::default(),
            pages: Some(PagesConfig::default()),
            page_list: Vec::new(),
            html: HtmlConfig::default(),
            dev: DevConfig::default(),
            bundler: BundlerConfig::default(),
            root: PathBuf::from("."),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            anyhow::bail!("At least one entry must be specified in {}", CONFIG_FILE);
        }

        let source_dir = self.source_dir();
        for (name, scripts) in &self.entries {
            let scripts = scripts.to_vec();
            if scripts.is_empty() {
                anyhow::bail!("Entry '{}' lists no scripts", name);
            }
            for script in scripts {
                let full_path = source_dir.join(&script);
                if !full_path.is_file() {
                    anyhow::bail!(
                        "Entry '{}' points to non-existent file: {}",
                        name,
                        full_path.display()
                    );
                }
            }
        }

        if self.pages.is_some() && !self.page_list.is_empty() {
            anyhow::bail!("Use either [pages] discovery or [[page]] entries, not both");
        }

        if !is_valid_hash_token(&self.output.hash_token) {
            anyhow::bail!(
                "Invalid output.hash_token '{}': expected [hash], [contenthash] or [chunkhash], optionally with :N",
                self.output.hash_token
            );
        }

        let extension = self.template_extension();
        for page in &self.page_list {
            let declared = page.template.extension().and_then(|e| e.to_str());
            if !declared.is_some_and(|e| e.eq_ignore_ascii_case(extension)) {
                anyhow::bail!(
                    "Page template {} must use the '.{}' extension shared by all [[page]] templates",
                    page.template.display(),
                    extension
                );
            }
        }
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!("Invalid template extension '{}'", extension);
        }
        let taken = chains_for(Environment::Production)
            .iter()
            .filter(|(kind, _)| **kind != FileKind::Template)
            .any(|(_, chain)| {
                chain
                    .matcher
                    .extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(extension))
            });
        if taken {
            anyhow::bail!("Template extension '{}' is already used by another file type", extension);
        }

        Ok(())
    }

    /// Absolute source root
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.source)
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Template extension used for discovery and the template chain.
    ///
    /// Explicit pages take it from their declared templates.
    pub fn template_extension(&self) -> &str {
        if let Some(pages) = &self.pages {
            return pages.extension.as_str();
        }
        self.page_list
            .first()
            .and_then(|page| page.template.extension())
            .and_then(|ext| ext.to_str())
            .unwrap_or(crate::pages::DEFAULT_TEMPLATE_EXTENSION)
    }

    /// Where this project's pages come from
    pub fn page_source(&self) -> PageSource {
        if !self.page_list.is_empty() {
            return PageSource::Explicit(self.page_list.clone());
        }

        let pages = self.pages.clone().unwrap_or_default();
        PageSource::Directory {
            dir: self.source_dir().join(&pages.dir),
            extension: pages.extension,
        }
    }

    /// Entries in chunk-name order, with script paths normalized
    pub fn entry_specs(&self) -> Vec<EntrySpec> {
        self.entries
            .iter()
            .map(|(name, scripts)| {
                EntrySpec::new(
                    name.clone(),
                    scripts.to_vec().iter().map(|s| clean_path(s)),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Planner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        dir
    }

    #[test]
    fn test_parse_defaults() {
        let dir = project(&["src/index.js"]);
        let config = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "./index.js"
"#,
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(config.project.version, "0.1.0");
        assert_eq!(config.output.dir, "dist");
        assert!(config.output.clean);
        assert_eq!(config.output.hash_token, "[contenthash]");
        assert_eq!(config.dev.port, 4200);
        assert!(config.dev.hot);
        assert_eq!(config.template_extension(), "tmpl");
        assert_eq!(
            config.page_source(),
            PageSource::Directory {
                dir: dir.path().join("src").join("pages"),
                extension: "tmpl".to_string(),
            }
        );
        assert_eq!(config.entry_specs(), vec![EntrySpec::new("main", ["index.js"])]);
    }

    #[test]
    fn test_default_config_discovers_pages() {
        let config = Config::default_config();
        assert_eq!(config.output_dir(), PathBuf::from("./dist"));
        assert_eq!(
            config.page_source().watch_dir(),
            Some(Path::new("./src/pages"))
        );
        assert_eq!(config.entry_specs()[0].scripts, vec![PathBuf::from("index.js")]);
    }

    #[test]
    fn test_entry_script_order_preserved() {
        let dir = project(&["src/polyfill.js", "src/app.js"]);
        let config = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = ["./polyfill.js", "./app.js"]
"#,
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(
            config.entry_specs()[0].scripts,
            vec![PathBuf::from("polyfill.js"), PathBuf::from("app.js")]
        );
    }

    #[test]
    fn test_explicit_pages() {
        let dir = project(&["src/index.js", "src/admin.js"]);
        let config = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "index.js"
admin = "admin.js"

[[page]]
template = "views/index.tmpl"
chunks = ["main"]

[[page]]
template = "views/admin.tmpl"
filename = "admin/index.html"
chunks = ["main", "admin"]
"#,
            dir.path().to_path_buf(),
        )
        .unwrap();

        match config.page_source() {
            PageSource::Explicit(pages) => {
                assert_eq!(pages.len(), 2);
                assert_eq!(pages[1].filename.as_deref(), Some("admin/index.html"));
            }
            other => panic!("expected explicit pages, got {other:?}"),
        }

        let plan = Planner::new(&config).resolve(Environment::Production).unwrap();
        let names: Vec<&str> = plan.pages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["index", "admin/index"]);
        assert_eq!(plan.pages()[1].filename, "admin/index.html");
        assert_eq!(plan.pages()[1].chunks, vec!["main", "admin"]);
    }

    #[test]
    fn test_explicit_pages_set_template_extension() {
        let dir = project(&["src/index.js"]);
        let config = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "index.js"

[[page]]
template = "views/index.pug"

[[page]]
template = "views/about.pug"
"#,
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(config.template_extension(), "pug");
        let plan = Planner::new(&config).resolve(Environment::Development).unwrap();
        let chain = plan.chains().get(FileKind::Template).unwrap();
        assert_eq!(chain.matcher.extensions, vec!["pug"]);
    }

    #[test]
    fn test_rejects_mixed_explicit_template_extensions() {
        let dir = project(&["src/index.js"]);
        let err = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "index.js"

[[page]]
template = "index.pug"

[[page]]
template = "about.tmpl"
"#,
            dir.path().to_path_buf(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("'.pug'"));
    }

    #[test]
    fn test_parent_relative_entry_script() {
        let dir = project(&["vendor/polyfill.js", "src/app.js"]);
        let config = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = ["../vendor/polyfill.js", "./app.js"]
"#,
            dir.path().to_path_buf(),
        )
        .unwrap();

        fs::create_dir_all(dir.path().join("src/pages")).unwrap();
        fs::write(dir.path().join("src/pages/index.tmpl"), "").unwrap();

        let plan = Planner::new(&config).resolve(Environment::Production).unwrap();
        let scripts = plan.scripts_for("main").unwrap();
        assert_eq!(
            scripts,
            &[PathBuf::from("../vendor/polyfill.js"), PathBuf::from("app.js")]
        );
        assert!(plan.context().join(&scripts[0]).is_file());
    }

    #[test]
    fn test_rejects_both_page_modes() {
        let dir = project(&["src/index.js"]);
        let err = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "index.js"

[pages]
dir = "pages"

[[page]]
template = "index.tmpl"
"#,
            dir.path().to_path_buf(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn test_rejects_missing_entry_script() {
        let dir = project(&[]);
        let err = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "index.js"
"#,
            dir.path().to_path_buf(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("non-existent"));
    }

    #[test]
    fn test_rejects_empty_entries() {
        let dir = project(&[]);
        assert!(Config::parse("[project]\nname = \"site\"\n", dir.path().to_path_buf()).is_err());

        let err = Config::parse(
            "[project]\nname = \"site\"\n\n[entries]\nmain = []\n",
            dir.path().to_path_buf(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no scripts"));
    }

    #[test]
    fn test_rejects_bad_hash_token() {
        let dir = project(&["src/index.js"]);
        let err = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "index.js"

[output]
hash_token = "{hash}"
"#,
            dir.path().to_path_buf(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("hash_token"));
    }

    #[test]
    fn test_rejects_template_extension_collision() {
        let dir = project(&["src/index.js"]);
        let err = Config::parse(
            r#"
[project]
name = "site"

[entries]
main = "index.js"

[pages]
extension = "css"
"#,
            dir.path().to_path_buf(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("already used"));
    }
}
