//! Entries and page binding
//!
//! An entry seeds one chunk from an ordered list of scripts. The binder
//! decides which chunks each page loads.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlanError, Result};
use crate::pages::PageDescriptor;

/// A named entry and the scripts that seed its chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpec {
    /// Chunk name, unique within a run
    pub chunk: String,

    /// Scripts in load order. Polyfills come first.
    pub scripts: Vec<PathBuf>,
}

impl EntrySpec {
    pub fn new<I, P>(chunk: impl Into<String>, scripts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            chunk: chunk.into(),
            scripts: scripts.into_iter().map(Into::into).collect(),
        }
    }
}

/// A page together with the chunks it loads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundPage {
    pub page: PageDescriptor,

    /// Chunks in load order, without duplicates
    pub chunks: Vec<String>,
}

/// Bind every page to the chunks it should load.
///
/// Explicit associations win. A page without any is bound to the sole
/// entry when the project has exactly one; with several entries such a
/// page is rejected rather than guessed at. Chunks no page references are
/// fine.
pub fn bind(entries: &[EntrySpec], pages: &[PageDescriptor]) -> Result<Vec<BoundPage>> {
    let known: HashSet<&str> = entries.iter().map(|e| e.chunk.as_str()).collect();

    pages
        .iter()
        .map(|page| {
            let chunks = if page.chunks.is_empty() {
                match entries {
                    [single] => vec![single.chunk.clone()],
                    _ => {
                        return Err(PlanError::AmbiguousBinding {
                            page: page.name.clone(),
                            entries: entries.len(),
                        })
                    }
                }
            } else {
                let mut seen = HashSet::new();
                let mut chunks = Vec::with_capacity(page.chunks.len());
                for chunk in &page.chunks {
                    if !known.contains(chunk.as_str()) {
                        return Err(PlanError::UnresolvedChunk {
                            page: page.name.clone(),
                            chunk: chunk.clone(),
                        });
                    }
                    if seen.insert(chunk.as_str()) {
                        chunks.push(chunk.clone());
                    }
                }
                chunks
            };

            debug!("Bound page {} -> [{}]", page.name, chunks.join(", "));

            Ok(BoundPage {
                page: page.clone(),
                chunks,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(name: &str) -> PageDescriptor {
        PageDescriptor::new(name, format!("pages/{name}.tmpl"))
    }

    #[test]
    fn test_single_entry_fallback() {
        let entries = vec![EntrySpec::new("main", ["polyfill.js", "app.js"])];
        let pages = vec![page("index"), page("about")];

        let bound = bind(&entries, &pages).unwrap();
        assert_eq!(bound.len(), 2);
        for b in &bound {
            assert_eq!(b.chunks, vec!["main"]);
        }
    }

    #[test]
    fn test_explicit_association() {
        let entries = vec![
            EntrySpec::new("main", ["app.js"]),
            EntrySpec::new("admin", ["admin.js"]),
        ];
        let pages = vec![
            page("index").with_chunks(["main"]),
            page("admin").with_chunks(["main", "admin", "main"]),
        ];

        let bound = bind(&entries, &pages).unwrap();
        assert_eq!(bound[0].chunks, vec!["main"]);
        assert_eq!(bound[1].chunks, vec!["main", "admin"]);
    }

    #[test]
    fn test_explicit_association_overrides_fallback() {
        let entries = vec![EntrySpec::new("main", ["app.js"])];
        let pages = vec![page("index").with_chunks(["main"])];

        assert_eq!(bind(&entries, &pages).unwrap()[0].chunks, vec!["main"]);
    }

    #[test]
    fn test_unresolved_chunk() {
        let entries = vec![EntrySpec::new("main", ["app.js"])];
        let pages = vec![page("index"), page("blog").with_chunks(["blog"])];

        match bind(&entries, &pages).unwrap_err() {
            PlanError::UnresolvedChunk { page, chunk } => {
                assert_eq!(page, "blog");
                assert_eq!(chunk, "blog");
            }
            other => panic!("expected UnresolvedChunk, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_entry_requires_explicit_chunks() {
        let entries = vec![
            EntrySpec::new("main", ["app.js"]),
            EntrySpec::new("admin", ["admin.js"]),
        ];
        let pages = vec![page("index")];

        assert!(matches!(
            bind(&entries, &pages),
            Err(PlanError::AmbiguousBinding { entries: 2, .. })
        ));
    }

    #[test]
    fn test_unreferenced_chunk_is_legal() {
        let entries = vec![
            EntrySpec::new("main", ["app.js"]),
            EntrySpec::new("lib", ["lib.js"]),
        ];
        let pages = vec![page("index").with_chunks(["main"])];

        let bound = bind(&entries, &pages).unwrap();
        assert_eq!(bound[0].chunks, vec!["main"]);
    }

    #[test]
    fn test_no_pages() {
        let entries = vec![EntrySpec::new("main", ["app.js"])];
        assert!(bind(&entries, &[]).unwrap().is_empty());
    }
}
