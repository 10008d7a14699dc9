use url::Url;

/// Checks whether a normalized URL falls inside the crawl boundary
///
/// The boundary is a plain prefix test on the normalized URL string: an origin
/// of `https://site.test/docs/` admits `https://site.test/docs/a` but not
/// `https://site.test/blog/` or `https://other.test/docs/`.
///
/// # Examples
///
/// ```
/// use site_mirror::url::is_in_scope;
/// use url::Url;
///
/// let origin = Url::parse("https://site.test/").unwrap();
/// assert!(is_in_scope(&Url::parse("https://site.test/a").unwrap(), &origin));
/// assert!(!is_in_scope(&Url::parse("https://other.test/x").unwrap(), &origin));
/// ```
pub fn is_in_scope(url: &Url, origin: &Url) -> bool {
    url.as_str().starts_with(origin.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin_in_scope() {
        let origin = url("https://site.test/");
        assert!(is_in_scope(&url("https://site.test/"), &origin));
        assert!(is_in_scope(&url("https://site.test/a/b.png"), &origin));
    }

    #[test]
    fn test_other_host_out_of_scope() {
        let origin = url("https://site.test/");
        assert!(!is_in_scope(&url("https://other.test/x"), &origin));
        assert!(!is_in_scope(&url("https://sub.site.test/"), &origin));
    }

    #[test]
    fn test_scheme_is_part_of_scope() {
        let origin = url("https://site.test/");
        assert!(!is_in_scope(&url("http://site.test/a"), &origin));
    }

    #[test]
    fn test_port_is_part_of_scope() {
        let origin = url("http://127.0.0.1:4000/");
        assert!(is_in_scope(&url("http://127.0.0.1:4000/page"), &origin));
        assert!(!is_in_scope(&url("http://127.0.0.1:4001/page"), &origin));
    }

    #[test]
    fn test_path_prefix_scope() {
        let origin = url("https://site.test/docs/");
        assert!(is_in_scope(&url("https://site.test/docs/intro"), &origin));
        assert!(!is_in_scope(&url("https://site.test/blog/"), &origin));
    }
}
