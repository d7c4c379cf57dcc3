//! Page discovery
//!
//! Pages come either from scanning a templates directory or from a
//! hand-written list in the config, never both in one run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PlanError, Result};
use crate::utils::{clean_path, slash_path};

/// Default template file extension
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "tmpl";

/// Extension of generated page documents
pub const PAGE_EXTENSION: &str = "html";

/// A page the bundler should generate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Page name, unique within a run
    pub name: String,

    /// Template the page is rendered from
    pub template: PathBuf,

    /// Generated document filename
    pub filename: String,

    /// Explicitly associated chunks, in load order. Empty means "none declared".
    #[serde(default)]
    pub chunks: Vec<String>,
}

impl PageDescriptor {
    pub fn new(name: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            filename: format!("{}.{}", name, PAGE_EXTENSION),
            name,
            template: template.into(),
            chunks: Vec::new(),
        }
    }

    pub fn with_chunks<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks = chunks.into_iter().map(Into::into).collect();
        self
    }
}

/// A hand-declared page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Template path, relative to the source root
    pub template: PathBuf,

    /// Output filename; defaults to the template stem plus `.html`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Chunks to load, in order
    #[serde(default)]
    pub chunks: Vec<String>,
}

/// Where the pages of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Scan a directory for templates with the given extension
    Directory { dir: PathBuf, extension: String },

    /// Use the listed pages as-is
    Explicit(Vec<PageEntry>),
}

impl PageSource {
    /// Resolve the page list
    pub fn resolve(&self, source_root: &Path) -> Result<Vec<PageDescriptor>> {
        match self {
            PageSource::Directory { dir, extension } => discover(dir, extension),
            PageSource::Explicit(entries) => from_explicit_list(entries, source_root),
        }
    }

    /// Directory to watch for page changes, if any
    pub fn watch_dir(&self) -> Option<&Path> {
        match self {
            PageSource::Directory { dir, .. } => Some(dir),
            PageSource::Explicit(_) => None,
        }
    }
}

/// Scan `pages_dir` for templates ending in `.{extension}`.
///
/// Results are sorted by file name so the page order does not depend on
/// the platform's directory listing. Names that differ only by case are
/// rejected since they would target the same output on case-insensitive
/// filesystems.
pub fn discover(pages_dir: &Path, extension: &str) -> Result<Vec<PageDescriptor>> {
    if !pages_dir.is_dir() {
        return Err(PlanError::MissingDirectory(pages_dir.to_path_buf()));
    }

    let mut pages = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    let walker = WalkDir::new(pages_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => PlanError::Io(io),
            None => PlanError::MissingDirectory(pages_dir.to_path_buf()),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches_extension {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            debug!("Skipping template with non UTF-8 name: {}", path.display());
            continue;
        };

        check_unique(&mut seen, name, path)?;

        debug!("Discovered page: {} -> {}", name, path.display());
        pages.push(PageDescriptor::new(name, path));
    }

    Ok(pages)
}

/// Build page descriptors from a hand-written list, without touching the
/// filesystem.
///
/// A page is named after its output filename minus the extension, with
/// directories kept (`admin/index.html` becomes `admin/index`), so two
/// pages only collide when they target the same document.
pub fn from_explicit_list(entries: &[PageEntry], source_root: &Path) -> Result<Vec<PageDescriptor>> {
    let mut pages = Vec::with_capacity(entries.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in entries {
        let name = explicit_page_name(entry).ok_or_else(|| {
            PlanError::IncompletePlan(format!(
                "cannot derive a page name from {}",
                entry.template.display()
            ))
        })?;

        let template = source_root.join(&entry.template);
        check_unique(&mut seen, &name, &template)?;

        let mut page = PageDescriptor::new(name, template).with_chunks(entry.chunks.iter().cloned());
        if let Some(filename) = &entry.filename {
            page.filename = clean_path(&slash_path(Path::new(filename)));
        }
        pages.push(page);
    }

    Ok(pages)
}

fn explicit_page_name(entry: &PageEntry) -> Option<String> {
    let name = match &entry.filename {
        Some(filename) => clean_path(&slash_path(&Path::new(filename).with_extension(""))),
        None => entry.template.file_stem()?.to_str()?.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

fn check_unique(seen: &mut HashMap<String, PathBuf>, name: &str, path: &Path) -> Result<()> {
    let key = name.to_lowercase();
    if let Some(first) = seen.get(&key) {
        return Err(PlanError::DuplicateName {
            name: name.to_string(),
            first: first.clone(),
            second: path.to_path_buf(),
        });
    }
    seen.insert(key, path.to_path_buf());
    Ok(())
}
