//! Output naming
//!
//! Decides how emitted files are named. Development names are plain
//! `name.ext`; production names carry a content-hash placeholder that the
//! bundler fills in from the emitted bytes.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::env::Environment;

/// Default content-hash placeholder
pub const DEFAULT_HASH_TOKEN: &str = "[contenthash]";

/// Placeholder the bundler replaces with the logical (chunk or page) name
pub const NAME_TOKEN: &str = "[name]";

/// Subdirectory for emitted raster images
pub const IMAGES_DIR: &str = "assets/images";

/// Subdirectory for emitted fonts
pub const FONTS_DIR: &str = "assets/fonts";

/// Asset filenames keep the original base name and extension
pub const ASSET_FILENAME: &str = "[name].[ext]";

static HASH_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?:hash|contenthash|chunkhash)(?::[1-9][0-9]?)?\]$").unwrap()
});

/// Check that a configured hash token is a placeholder the bundler understands
pub fn is_valid_hash_token(token: &str) -> bool {
    HASH_TOKEN_REGEX.is_match(token)
}

/// Produce the filename for a logical output in the given environment
pub fn filename_for(logical_name: &str, ext: &str, env: Environment) -> String {
    NamingRule::new(env).filename_for(logical_name, ext)
}

/// Naming rule bound to one environment for a whole run.
///
/// Every name in a plan comes from the same rule, so a logical artifact is
/// never emitted under both a hashed and an unhashed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRule {
    environment: Environment,
    hash_token: String,
}

impl NamingRule {
    pub fn new(environment: Environment) -> Self {
        Self::with_hash_token(environment, DEFAULT_HASH_TOKEN)
    }

    pub fn with_hash_token(environment: Environment, hash_token: impl Into<String>) -> Self {
        Self {
            environment,
            hash_token: hash_token.into(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn hash_token(&self) -> &str {
        &self.hash_token
    }

    /// Whether names from this rule carry the hash placeholder
    pub fn is_hashed(&self) -> bool {
        self.environment.is_production()
    }

    pub fn filename_for(&self, logical_name: &str, ext: &str) -> String {
        if self.is_hashed() {
            format!("{}.{}.{}", logical_name, self.hash_token, ext)
        } else {
            format!("{}.{}", logical_name, ext)
        }
    }

    /// Filename template handed to the bundler for a whole output class
    pub fn template(&self, ext: &str) -> String {
        self.filename_for(NAME_TOKEN, ext)
    }
}

/// Output section of a build plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRules {
    /// Absolute output directory
    pub path: PathBuf,

    /// URL prefix for emitted files
    pub public_path: String,

    /// Empty the output directory before writing
    pub clean: bool,

    /// Script bundle filename template
    pub script_filename: String,

    /// Extracted stylesheet filename template
    pub style_filename: String,

    /// Raster image filename template, relative to `path`
    pub image_filename: String,

    /// Font filename template, relative to `path`
    pub font_filename: String,
}

impl OutputRules {
    pub fn new(naming: &NamingRule, path: PathBuf, public_path: String, clean: bool) -> Self {
        Self {
            path,
            public_path,
            clean,
            script_filename: naming.template("js"),
            style_filename: naming.template("css"),
            image_filename: format!("{}/{}", IMAGES_DIR, ASSET_FILENAME),
            font_filename: format!("{}/{}", FONTS_DIR, ASSET_FILENAME),
        }
    }
}
