//! URL handling module for Site-Mirror
//!
//! This module provides URL normalization, reference resolution, crawl scope
//! checks, the URL-to-filesystem path mapping and relative links between
//! mirrored files.

mod normalize;
mod path;
mod scope;

pub use normalize::{normalize, normalize_url, parse_start_url, resolve_reference};
pub use path::{relative_link, url_to_path, INDEX_FILE};
pub use scope::is_in_scope;
