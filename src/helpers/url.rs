//! URL helper functions

/// Join an absolute site URL and a root-relative path.
///
/// This is plain concatenation: the feed contract is `site_url + slug`, so
/// no slash normalization happens here.
///
/// # Examples
/// ```ignore
/// absolute_url("https://example.com", "/posts/hello/") // -> "https://example.com/posts/hello/"
/// ```
pub fn absolute_url(site_url: &str, path: &str) -> String {
    format!("{}{}", site_url, path)
}

/// Ensure a site path starts and ends with a slash
///
/// # Examples
/// ```ignore
/// normalize_path("posts/hello") // -> "/posts/hello/"
/// ```
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// True when a site path stays inside the output directory once joined onto it
///
/// # Examples
/// ```ignore
/// is_safe_site_path("/posts/hello/") // -> true
/// is_safe_site_path("../../escaped") // -> false
/// ```
pub fn is_safe_site_path(path: &str) -> bool {
    !path.contains('\\')
        && path
            .split('/')
            .all(|segment| segment != ".." && segment != ".")
}

/// True for URLs that point off-site or at non-file schemes
pub fn is_external(url: &str) -> bool {
    url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
        || url.starts_with("data:")
        || url.starts_with("mailto:")
        || url.starts_with("tel:")
}

/// True for references relative to the current file (`./img.png`, `img.png`)
pub fn is_relative_file_ref(url: &str) -> bool {
    !url.is_empty() && !is_external(url) && !url.starts_with('/') && !url.starts_with('#')
}

/// Drop the query string and fragment from a URL
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Public output path for a root-relative page path
///
/// # Examples
/// ```ignore
/// output_file("/about/") // -> "about/index.html"
/// ```
pub fn output_file(path: &str) -> String {
    let clean = path.trim_matches('/');
    if clean.is_empty() {
        "index.html".to_string()
    } else if clean.ends_with(".html") {
        clean.to_string()
    } else {
        format!("{}/index.html", clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_is_concatenation() {
        assert_eq!(
            absolute_url("https://example.com", "/posts/hello/"),
            "https://example.com/posts/hello/"
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("posts/hello"), "/posts/hello/");
        assert_eq!(normalize_path("/about/"), "/about/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_is_safe_site_path() {
        assert!(is_safe_site_path("/posts/hello/"));
        assert!(is_safe_site_path("/"));
        assert!(is_safe_site_path("/notes/v1.2/"));
        assert!(!is_safe_site_path("../../escaped"));
        assert!(!is_safe_site_path("/posts/../../escaped/"));
        assert!(!is_safe_site_path("/./about/"));
        assert!(!is_safe_site_path("..\\escaped"));
    }

    #[test]
    fn test_relative_refs() {
        assert!(is_relative_file_ref("./photo.jpg"));
        assert!(is_relative_file_ref("photo.jpg"));
        assert!(!is_relative_file_ref("/static/photo.jpg"));
        assert!(!is_relative_file_ref("https://example.com/a.png"));
        assert!(!is_relative_file_ref("#section"));
        assert!(!is_relative_file_ref("mailto:me@example.com"));
    }

    #[test]
    fn test_output_file() {
        assert_eq!(output_file("/"), "index.html");
        assert_eq!(output_file("/about/"), "about/index.html");
        assert_eq!(output_file("/404.html"), "404.html");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("a.png?v=1#x"), "a.png");
        assert_eq!(strip_query("a.png"), "a.png");
    }
}
