use std::path::{Component, Path, PathBuf};
use url::Url;

/// File name used for directory-like URLs
pub const INDEX_FILE: &str = "index.html";

/// Maps a URL to a relative output path inside the mirror
///
/// # Mapping Rules (applied in order)
///
/// 1. Query and fragment are ignored; URLs differing only in their query map
///    to the same file (later write wins)
/// 2. Empty or root path → `index.html`
/// 3. Path ending in `/` → `<path>/index.html`
/// 4. Last segment without an extension → treated as a directory, `<path>/index.html`
/// 5. Otherwise the path is used verbatim
///
/// Empty, `.` and `..` segments never become path components, so the result
/// always stays below the output root.
///
/// # Examples
///
/// ```
/// use site_mirror::url::url_to_path;
/// use std::path::PathBuf;
/// use url::Url;
///
/// let url = Url::parse("https://x.test/about").unwrap();
/// assert_eq!(url_to_path(&url), PathBuf::from("about/index.html"));
/// ```
pub fn url_to_path(url: &Url) -> PathBuf {
    let raw = url.path();
    let segments: Vec<&str> = raw
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();

    let mut path: PathBuf = segments.iter().collect();

    let is_file = match segments.last() {
        None => false,
        Some(_) if raw.ends_with('/') => false,
        Some(last) => has_extension(last),
    };

    if !is_file {
        path.push(INDEX_FILE);
    }

    path
}

/// Builds a relative link from one mirrored file to another
///
/// Both paths are relative to the output root, as returned by
/// [`url_to_path`]. Percent signs are escaped because files are named after
/// the still-encoded URL path.
///
/// # Examples
///
/// ```
/// use site_mirror::url::relative_link;
/// use std::path::Path;
///
/// let link = relative_link(Path::new("docs/guide/index.html"), Path::new("img/logo.png"));
/// assert_eq!(link, "../../img/logo.png");
/// ```
pub fn relative_link(from: &Path, to: &Path) -> String {
    let from_dirs: Vec<Component> = from
        .parent()
        .map(|dir| dir.components().collect())
        .unwrap_or_default();
    let to_parts: Vec<Component> = to.components().collect();
    // The file name itself never counts as a shared directory
    let to_dirs = &to_parts[..to_parts.len().saturating_sub(1)];

    let common = from_dirs
        .iter()
        .zip(to_dirs)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts = vec!["..".to_string(); from_dirs.len() - common];
    parts.extend(
        to_parts[common..]
            .iter()
            .map(|part| part.as_os_str().to_string_lossy().replace('%', "%25")),
    );
    parts.join("/")
}

/// Returns true if the segment carries a file extension (`style.css`, `v1.2`)
fn has_extension(segment: &str) -> bool {
    segment
        .rsplit_once('.')
        .map_or(false, |(_, ext)| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(url: &str) -> PathBuf {
        url_to_path(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_root_maps_to_index() {
        assert_eq!(map("https://x.test/"), PathBuf::from("index.html"));
        assert_eq!(map("https://x.test"), PathBuf::from("index.html"));
    }

    #[test]
    fn test_trailing_slash_appends_index() {
        assert_eq!(map("https://x.test/blog/"), PathBuf::from("blog/index.html"));
    }

    #[test]
    fn test_extensionless_segment_is_directory() {
        assert_eq!(map("https://x.test/about"), PathBuf::from("about/index.html"));
        assert_eq!(
            map("https://x.test/docs/getting-started"),
            PathBuf::from("docs/getting-started/index.html")
        );
    }

    #[test]
    fn test_file_with_extension_verbatim() {
        assert_eq!(map("https://x.test/style.css"), PathBuf::from("style.css"));
        assert_eq!(
            map("https://x.test/assets/img/logo.png"),
            PathBuf::from("assets/img/logo.png")
        );
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        assert_eq!(
            map("https://x.test/app.js?v=3#x"),
            PathBuf::from("app.js")
        );
        assert_eq!(
            map("https://x.test/list?page=2"),
            map("https://x.test/list?page=3")
        );
    }

    #[test]
    fn test_empty_segments_collapsed() {
        assert_eq!(
            map("https://x.test//a///b.html"),
            PathBuf::from("a/b.html")
        );
    }

    #[test]
    fn test_trailing_dot_is_not_an_extension() {
        assert_eq!(map("https://x.test/weird."), PathBuf::from("weird./index.html"));
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let url = Url::parse("https://x.test/a/b/c").unwrap();
        assert_eq!(url_to_path(&url), url_to_path(&url));
    }

    #[test]
    fn test_relative_link_between_files() {
        let link = |from: &str, to: &str| relative_link(Path::new(from), Path::new(to));

        assert_eq!(link("index.html", "a/index.html"), "a/index.html");
        assert_eq!(link("index.html", "img.png"), "img.png");
        assert_eq!(link("docs/guide/index.html", "docs/index.html"), "../index.html");
        assert_eq!(link("docs/guide/index.html", "docs/logo.png"), "../logo.png");
        assert_eq!(link("a/index.html", "a/index.html"), "index.html");
        assert_eq!(link("v1.2/child/index.html", "v1.2"), "../../v1.2");
        assert_eq!(link("index.html", "my%20file.pdf"), "my%2520file.pdf");
    }

    #[test]
    fn test_never_escapes_root() {
        let path = map("https://x.test/%2e%2e/%2e%2e/etc/passwd");
        assert!(path
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_))));
    }
}
