use url::Url;

/// Shown when a record carries no image at all.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

/// Turn a raw image path from the API into a loadable URL.
///
/// Absolute URLs pass through unchanged; relative paths are joined to
/// `base_url` with exactly one slash between them. Whether the URL actually
/// loads is the renderer's problem.
pub fn resolve(raw_path: Option<&str>, base_url: &str) -> String {
    let raw = raw_path.unwrap_or_default();
    if raw.trim().is_empty() {
        return PLACEHOLDER_IMAGE.to_string();
    }
    if is_absolute(raw) {
        return raw.to_string();
    }
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    let path = raw.strip_prefix('/').unwrap_or(raw);
    format!("{}/{}", base, path)
}

fn is_absolute(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| u.has_host() || u.scheme() == "data")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.example.com";

    #[test]
    fn test_absolute_passthrough() {
        let url = "https://cdn.example.com/a.png";
        assert_eq!(resolve(Some(url), BASE), url);
        assert_eq!(resolve(Some("data:image/png;base64,AAAA"), BASE), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_relative_join() {
        assert_eq!(resolve(Some("/uploads/a.png"), BASE), "https://api.example.com/uploads/a.png");
        assert_eq!(resolve(Some("uploads/a.png"), BASE), "https://api.example.com/uploads/a.png");
        assert_eq!(
            resolve(Some("/uploads/a.png"), "https://api.example.com/"),
            "https://api.example.com/uploads/a.png"
        );
    }

    #[test]
    fn test_empty_is_placeholder() {
        assert_eq!(resolve(None, BASE), PLACEHOLDER_IMAGE);
        assert_eq!(resolve(Some(""), BASE), PLACEHOLDER_IMAGE);
        assert_eq!(resolve(Some("  "), BASE), PLACEHOLDER_IMAGE);
    }
}
