//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::output::DEFAULT_HASH_TOKEN;
use crate::pages::DEFAULT_TEMPLATE_EXTENSION;

/// Project metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Scripts seeding one chunk: a single path or an ordered list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryScripts {
    One(String),
    Many(Vec<String>),
}

impl EntryScripts {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            EntryScripts::One(script) => vec![script.clone()],
            EntryScripts::Many(scripts) => scripts.clone(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Public URL prefix for emitted files
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Empty the output directory before each build
    #[serde(default = "default_true")]
    pub clean: bool,

    /// Content-hash placeholder used in production filenames
    #[serde(default = "default_hash_token")]
    pub hash_token: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            public_path: default_public_path(),
            clean: true,
            hash_token: default_hash_token(),
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_public_path() -> String {
    "/".to_string()
}

fn default_hash_token() -> String {
    DEFAULT_HASH_TOKEN.to_string()
}

fn default_true() -> bool {
    true
}

/// Page discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Templates directory, relative to the source root
    #[serde(default = "default_pages_dir")]
    pub dir: String,

    /// Template file extension
    #[serde(default = "default_template_extension")]
    pub extension: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            dir: default_pages_dir(),
            extension: default_template_extension(),
        }
    }
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_template_extension() -> String {
    DEFAULT_TEMPLATE_EXTENSION.to_string()
}

/// Generated page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Document title passed to the template compiler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Collapse whitespace in production pages
    #[serde(default = "default_true")]
    pub minify: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            title: None,
            minify: true,
        }
    }
}

/// Development server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Port to run dev server on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Open browser automatically
    #[serde(default)]
    pub open: bool,

    /// Enable hot module replacement
    #[serde(default = "default_true")]
    pub hot: bool,

    /// Reload the page when a change cannot be hot-patched
    #[serde(default = "default_true")]
    pub live_reload: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            open: false,
            hot: true,
            live_reload: true,
        }
    }
}

fn default_port() -> u16 {
    4200
}

fn default_host() -> String {
    "localhost".to_string()
}

/// External bundler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Program and arguments; the plan file path is appended
    #[serde(default)]
    pub command: Vec<String>,
}
