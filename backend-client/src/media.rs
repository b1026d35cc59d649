use url::Url;

/// Resolves a media locator handed out by the generation service against the
/// service base URL.
///
/// The service returns root-relative paths such as
/// `/media/{session_id}/{track_id}.wav`; joining keeps the base's scheme,
/// host and port. Absolute URLs pass through unchanged.
pub fn resolve_media_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    base.join(path)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::resolve_media_url;

    #[test]
    fn joins_root_relative_path_onto_base() {
        let base = Url::parse("http://localhost:8000").unwrap();
        let resolved = resolve_media_url(&base, "/media/s1/t1.wav").unwrap();
        assert_eq!(resolved.as_str(), "http://localhost:8000/media/s1/t1.wav");
    }

    #[test]
    fn root_relative_path_ignores_base_path_segments() {
        let base = Url::parse("http://localhost:8000/api/").unwrap();
        let resolved = resolve_media_url(&base, "/media/s1/t1.wav").unwrap();
        assert_eq!(resolved.as_str(), "http://localhost:8000/media/s1/t1.wav");
    }

    #[test]
    fn absolute_url_passes_through() {
        let base = Url::parse("http://localhost:8000").unwrap();
        let resolved = resolve_media_url(&base, "https://cdn.example.com/t1.wav").unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example.com/t1.wav");
    }
}
