use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::MediaConfig;
use crate::product::ProductImageFields;

/// Host that serves drive files as embeddable image bytes.
pub const DRIVE_CONTENT_HOST: &str = "lh3.googleusercontent.com";

const IMAGES_PREFIX: &str = "/images/";

// Share-link shapes, tried in order. Capture group 1 is the file id. The
// host must open the reference, so a drive link quoted inside another URL's
// query does not match.
static DRIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(?:(?:https?:)?//)?drive\.google\.com/file/d/([A-Za-z0-9_-]+)",
        r"^(?:(?:https?:)?//)?drive\.google\.com/(?:open|uc)\?(?:[^#]*&)?id=([A-Za-z0-9_-]+)",
        r"^(?:(?:https?:)?//)?drive\.usercontent\.google\.com/download\?(?:[^#]*&)?id=([A-Za-z0-9_-]+)",
        r"^(?:(?:https?:)?//)?lh3\.googleusercontent\.com/d/([A-Za-z0-9_-]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("drive pattern compiles"))
    .collect()
});

/// File id of a cloud-drive share link, if `reference` is one.
pub fn drive_file_id(reference: &str) -> Option<&str> {
    DRIVE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(reference)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str())
    })
}

/// Turns whatever the catalog API stores as an image into a URL a browser
/// can fetch.
#[derive(Debug, Clone)]
pub struct ImageUrlNormalizer {
    config: MediaConfig,
    backend_base: String,
}

impl ImageUrlNormalizer {
    pub fn new(config: MediaConfig) -> Self {
        let backend_base = config.backend_base_url();
        Self {
            config,
            backend_base,
        }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// `None` means "no image". Unknown shapes are treated as relative paths.
    pub fn normalize<'a>(&self, reference: impl Into<Option<&'a str>>) -> Option<String> {
        let trimmed = reference.into()?.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with("data:image/") {
            return Some(trimmed.to_string());
        }

        if let Some(file_id) = drive_file_id(trimmed) {
            debug!(file_id, "rewrote drive share link");
            return Some(format!("https://{DRIVE_CONTENT_HOST}/d/{file_id}"));
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Some(trimmed.to_string());
        }

        if trimmed.starts_with(IMAGES_PREFIX) {
            return Some(self.resolve_path(trimmed));
        }

        let path = rooted_path(trimmed);
        Some(self.resolve_path(&path))
    }

    /// The product's main image: the first candidate, by field priority,
    /// that normalizes to a URL.
    pub fn product_image_url(&self, product: &ProductImageFields) -> Option<String> {
        product
            .primary_candidates()
            .into_iter()
            .find_map(|reference| self.normalize(reference))
    }

    /// Every image the product exposes, normalized, first occurrence kept.
    pub fn all_product_images(&self, product: &ProductImageFields) -> Vec<String> {
        let mut seen = HashSet::new();
        product
            .references()
            .into_iter()
            .filter_map(|reference| self.normalize(reference))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    fn resolve_path(&self, path: &str) -> String {
        if self.config.mode.is_development() {
            path.to_string()
        } else {
            format!("{}{path}", self.backend_base)
        }
    }
}

fn rooted_path(reference: &str) -> String {
    let path = reference.replace('\\', "/");
    format!("/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeMode;

    fn production() -> ImageUrlNormalizer {
        ImageUrlNormalizer::new(
            MediaConfig::new(RuntimeMode::Production).with_backend_url("https://be.nova.vn"),
        )
    }

    fn development() -> ImageUrlNormalizer {
        ImageUrlNormalizer::new(MediaConfig::new(RuntimeMode::Development))
    }

    #[test]
    fn blank_references_mean_no_image() {
        let normalizer = production();
        assert_eq!(normalizer.normalize(None), None);
        assert_eq!(normalizer.normalize(""), None);
        assert_eq!(normalizer.normalize("  "), None);
        assert_eq!(normalizer.normalize("\t\n"), None);
    }

    #[test]
    fn data_urls_pass_through() {
        let data = "data:image/png;base64,abc";
        assert_eq!(production().normalize(data).as_deref(), Some(data));
        assert_eq!(development().normalize(data).as_deref(), Some(data));
    }

    #[test]
    fn drive_share_shapes_rewrite_to_content_host() {
        let expected = "https://lh3.googleusercontent.com/d/XYZ123";
        for link in [
            "https://drive.google.com/file/d/XYZ123/view?usp=sharing",
            "https://drive.google.com/open?id=XYZ123",
            "https://drive.google.com/uc?export=view&id=XYZ123",
            "https://drive.usercontent.google.com/download?id=XYZ123&export=view",
            "https://lh3.googleusercontent.com/d/XYZ123=w400",
        ] {
            assert_eq!(production().normalize(link).as_deref(), Some(expected), "{link}");
        }
    }

    #[test]
    fn drive_ids_keep_dashes_and_underscores() {
        assert_eq!(
            drive_file_id("https://drive.google.com/file/d/1a-B_c9/view"),
            Some("1a-B_c9")
        );
        assert_eq!(drive_file_id("https://drive.google.com/drive/folders/abc"), None);
        assert_eq!(drive_file_id("https://example.com/uc?id=abc"), None);
    }

    #[test]
    fn drive_links_nested_in_other_urls_are_left_alone() {
        let redirect = "https://example.com/redirect?to=drive.google.com/file/d/X";
        assert_eq!(drive_file_id(redirect), None);
        assert_eq!(production().normalize(redirect).as_deref(), Some(redirect));

        let proxied = "https://cdn.example.com/lh3.googleusercontent.com/d/abc";
        assert_eq!(drive_file_id(proxied), None);
        assert_eq!(
            drive_file_id("drive.google.com/open?id=abc"),
            Some("abc"),
            "scheme-less share links still match"
        );
        assert_eq!(drive_file_id("//drive.google.com/file/d/abc/view"), Some("abc"));
    }

    #[test]
    fn absolute_urls_pass_through() {
        let url = "https://cdn.nova.vn/p/nhang-tram.jpg";
        assert_eq!(production().normalize(url).as_deref(), Some(url));
        assert_eq!(
            production().normalize("http://old.nova.vn/a.png").as_deref(),
            Some("http://old.nova.vn/a.png")
        );
    }

    #[test]
    fn images_paths_depend_on_mode() {
        let path = "/images/products/vang-ma.jpg";
        assert_eq!(development().normalize(path).as_deref(), Some(path));
        assert_eq!(
            production().normalize(path).as_deref(),
            Some("https://be.nova.vn/images/products/vang-ma.jpg")
        );
    }

    #[test]
    fn other_relative_paths_get_one_leading_slash() {
        assert_eq!(development().normalize("a.jpg").as_deref(), Some("/a.jpg"));
        assert_eq!(development().normalize("//uploads/a.jpg").as_deref(), Some("/uploads/a.jpg"));
        assert_eq!(
            development().normalize("uploads\\2024\\a.jpg").as_deref(),
            Some("/uploads/2024/a.jpg")
        );
        assert_eq!(
            production().normalize("uploads/a.jpg").as_deref(),
            Some("https://be.nova.vn/uploads/a.jpg")
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            production().normalize("  https://cdn.nova.vn/x.jpg ").as_deref(),
            Some("https://cdn.nova.vn/x.jpg")
        );
    }
}
