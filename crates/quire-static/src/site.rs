//! Site-wide configuration shared by every page.

use serde::Deserialize;

/// Site metadata used when generating documents.
///
/// Built once per invocation and passed by reference; never mutated during
/// a build.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title, also the fallback page title
    pub title: String,

    /// Fallback page description
    pub description: String,

    /// Host the site is published on, e.g. `https://example.github.io`
    pub url: String,

    /// Path prefix under `url` where the site lives, e.g. `/my-book`
    pub baseurl: String,

    pub author: String,

    /// Source repository linked from the page header
    pub repository: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Documentation".to_string(),
            description: String::new(),
            url: String::new(),
            baseurl: String::new(),
            author: String::new(),
            repository: None,
        }
    }
}

impl SiteConfig {
    /// Base URL with any trailing slash removed, so `"{base}/assets"` is
    /// always well formed.
    pub fn base(&self) -> &str {
        self.baseurl.trim_end_matches('/')
    }

    /// Absolute URL of the site root.
    pub fn absolute_url(&self) -> String {
        format!("{}{}/", self.url.trim_end_matches('/'), self.base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_strips_trailing_slash() {
        let site = SiteConfig {
            baseurl: "/podman-book/".to_string(),
            ..Default::default()
        };

        assert_eq!(site.base(), "/podman-book");
    }

    #[test]
    fn root_base_is_empty() {
        let site = SiteConfig {
            baseurl: "/".to_string(),
            ..Default::default()
        };

        assert_eq!(site.base(), "");
    }

    #[test]
    fn joins_absolute_url() {
        let site = SiteConfig {
            url: "https://example.github.io/".to_string(),
            baseurl: "/book".to_string(),
            ..Default::default()
        };

        assert_eq!(site.absolute_url(), "https://example.github.io/book/");
    }
}
