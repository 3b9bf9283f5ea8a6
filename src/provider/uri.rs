// Provider URI matching: maps content URIs onto the packaged files the provider serves.

use reqwest::Url;

/// Files served by the content provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFile {
    ImagePng,
    ImageBmp,
}

impl ProviderFile {
    pub const ALL: [ProviderFile; 2] = [ProviderFile::ImagePng, ProviderFile::ImageBmp];

    /// Path below the provider authority, without a leading slash.
    pub fn path(self) -> &'static str {
        match self {
            ProviderFile::ImagePng => "file/image-3840x2160.png",
            ProviderFile::ImageBmp => "file/image-3840x2160.bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ProviderFile::ImagePng => "image/png",
            ProviderFile::ImageBmp => "image/bmp",
        }
    }

    /// Raw resource backing this file.
    pub fn resource_id(self) -> &'static str {
        match self {
            ProviderFile::ImagePng => "image_3840x2160",
            ProviderFile::ImageBmp => "image_3840x2160_bmp",
        }
    }

    /// Concrete stream types matching `mime_filter`, if any.
    pub fn stream_types(self, mime_filter: &str) -> Option<Vec<String>> {
        let matched = match (self, mime_filter) {
            (_, "image/*") => true,
            (ProviderFile::ImagePng, "*/png") => true,
            (ProviderFile::ImageBmp, "*/bmp") => true,
            _ => false,
        };
        matched.then(|| vec![self.mime_type().to_string()])
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        Self::ALL.into_iter().find(|file| file.path() == path)
    }
}

/// Matches `content://<authority>/<path>` URIs against the provider's files.
#[derive(Debug, Clone)]
pub struct UriMatcher {
    authority: String,
}

impl UriMatcher {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Match a full content URI on its path. Query and fragment are ignored;
    /// anything unparseable or foreign is `None`.
    pub fn match_uri(&self, uri: &str) -> Option<ProviderFile> {
        let parsed = Url::parse(uri).ok()?;
        if parsed.scheme() != "content" {
            return None;
        }
        if parsed.host_str()? != self.authority {
            return None;
        }
        ProviderFile::from_path(parsed.path())
    }

    /// Build the content URI for `file`.
    pub fn uri_for(&self, file: ProviderFile) -> String {
        format!("content://{}/{}", self.authority, file.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITY: &str = "com.example.glide.provider";

    #[test]
    fn test_match_known_paths() {
        let matcher = UriMatcher::new(AUTHORITY);
        assert_eq!(
            matcher.match_uri("content://com.example.glide.provider/file/image-3840x2160.png"),
            Some(ProviderFile::ImagePng)
        );
        assert_eq!(
            matcher.match_uri("content://com.example.glide.provider/file/image-3840x2160.bmp"),
            Some(ProviderFile::ImageBmp)
        );
    }

    #[test]
    fn test_match_ignores_query_and_fragment() {
        let matcher = UriMatcher::new(AUTHORITY);
        assert_eq!(
            matcher.match_uri("content://com.example.glide.provider/file/image-3840x2160.png?x=1"),
            Some(ProviderFile::ImagePng)
        );
        assert_eq!(
            matcher.match_uri("content://com.example.glide.provider/file/image-3840x2160.bmp#top"),
            Some(ProviderFile::ImageBmp)
        );
    }

    #[test]
    fn test_reject_foreign_uris() {
        let matcher = UriMatcher::new(AUTHORITY);
        assert_eq!(matcher.match_uri("content://com.example.glide.provider/file/unknown.png"), None);
        assert_eq!(matcher.match_uri("content://other.provider/file/image-3840x2160.png"), None);
        assert_eq!(matcher.match_uri("file://com.example.glide.provider/file/image-3840x2160.png"), None);
        assert_eq!(matcher.match_uri("not a uri"), None);
    }

    #[test]
    fn test_stream_types() {
        let png = ProviderFile::ImagePng;
        assert_eq!(png.stream_types("image/*"), Some(vec!["image/png".to_string()]));
        assert_eq!(png.stream_types("*/png"), Some(vec!["image/png".to_string()]));
        assert_eq!(png.stream_types("*/bmp"), None);
        assert_eq!(png.stream_types("*/*"), None);

        let bmp = ProviderFile::ImageBmp;
        assert_eq!(bmp.stream_types("*/bmp"), Some(vec!["image/bmp".to_string()]));
        assert_eq!(bmp.stream_types("image/png"), None);
    }

    #[test]
    fn test_uri_for_round_trips() {
        let matcher = UriMatcher::new(AUTHORITY);
        for file in ProviderFile::ALL {
            assert_eq!(matcher.match_uri(&matcher.uri_for(file)), Some(file));
        }
    }
}
