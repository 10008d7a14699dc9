//! Sitemap manifest
//!
//! Written once, after the crawl has settled, listing every page that made it
//! into the mirror.

use crate::crawler::VisitedSnapshot;
use crate::state::{ItemKind, ItemState};
use crate::url::url_to_path;
use crate::MirrorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// The `sitemap.json` document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sitemap {
    /// Persisted page URLs, sorted
    pub pages: Vec<String>,
    /// Crawl origin
    pub base_url: String,
    /// Number of entries in `pages`
    pub total_pages: usize,
}

impl Sitemap {
    /// Builds the manifest from the settled visited set
    ///
    /// Only pages that reached [`ItemState::Persisted`] are listed; assets and
    /// failed or unfetched pages are left out.
    pub fn from_snapshot(origin: &Url, snapshot: &VisitedSnapshot) -> Self {
        let mut pages: Vec<String> = snapshot
            .iter()
            .filter(|(_, record)| {
                record.kind == ItemKind::Page && record.state == ItemState::Persisted
            })
            .map(|(url, _)| url.clone())
            .collect();
        pages.sort();

        Self {
            total_pages: pages.len(),
            pages,
            base_url: origin.to_string(),
        }
    }
}

/// Returns the persisted URL, if any, whose mirror file is `relative`
///
/// Used to spot a site that serves its own file under the manifest's name.
pub fn find_mirrored_file(snapshot: &VisitedSnapshot, relative: &Path) -> Option<String> {
    let mut matches: Vec<&String> = snapshot
        .iter()
        .filter(|(_, record)| record.state == ItemState::Persisted)
        .filter(|(url, _)| Url::parse(url).map_or(false, |url| url_to_path(&url) == relative))
        .map(|(url, _)| url)
        .collect();
    matches.sort();
    matches.first().map(|url| url.to_string())
}

/// Writes the manifest as pretty-printed JSON below the output root
///
/// # Returns
///
/// The path of the written file
pub fn write_sitemap(
    sitemap: &Sitemap,
    output_root: &Path,
    file_name: &str,
) -> Result<PathBuf, MirrorError> {
    let path = output_root.join(file_name);
    let json = serde_json::to_string_pretty(sitemap)?;
    fs::write(&path, json)?;

    tracing::info!(
        "Wrote sitemap with {} pages to {}",
        sitemap.total_pages,
        path.display()
    );
    Ok(path)
}
