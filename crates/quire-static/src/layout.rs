//! Page layouts.
//!
//! A page is wrapped either in an external layout file from the layouts
//! directory or in the built-in book layout. External layouts are plain HTML
//! with two literal placeholders, `{{ content }}` and `{{ page.title }}`;
//! there is no template language beyond that.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use quire_md::FrontMatter;

use crate::site::SiteConfig;

/// Layout used when a page does not name one.
pub const DEFAULT_LAYOUT: &str = "default";

static CONTENT_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*content\s*\}\}").unwrap());

static TITLE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*page\.title\s*\}\}").unwrap());

/// Fill an external layout.
///
/// Every content placeholder is replaced first, then every title
/// placeholder. Replacement text is inserted as is.
pub fn apply_template(template: &str, content: &str, title: &str) -> String {
    let with_content = CONTENT_PLACEHOLDER.replace_all(template, NoExpand(content));
    TITLE_PLACEHOLDER
        .replace_all(&with_content, NoExpand(title))
        .into_owned()
}

/// Wraps rendered pages in their layout.
#[derive(Debug, Clone)]
pub struct Layouts {
    dir: PathBuf,
}

impl Layouts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the layout file for a layout name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.html"))
    }

    /// Load an external layout, or `None` when it is missing or unreadable.
    pub fn load(&self, name: &str) -> Option<String> {
        let path = self.path_for(name);

        if !path.exists() {
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(template) => Some(template),
            Err(e) => {
                tracing::warn!(
                    "Could not read layout {} ({}), using default: {}",
                    name,
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Produce the full HTML document for a rendered page.
    pub fn render(
        &self,
        html: &str,
        front_matter: &FrontMatter,
        source_path: &Path,
        site: &SiteConfig,
    ) -> String {
        let name = front_matter.layout().unwrap_or(DEFAULT_LAYOUT);

        match self.load(name) {
            Some(template) => {
                tracing::debug!("Applying layout {} to {}", name, source_path.display());
                apply_template(&template, html, front_matter.title().unwrap_or(""))
            }
            None => builtin_layout(
                html,
                front_matter.title().unwrap_or(&site.title),
                front_matter.description().unwrap_or(&site.description),
                site,
            ),
        }
    }
}

/// The built-in book layout: header with sidebar toggle, search and theme
/// switch, a checkbox-driven sidebar, the content area and footer scripts.
pub fn builtin_layout(content: &str, title: &str, description: &str, site: &SiteConfig) -> String {
    let base = site.base();
    let site_title = &site.title;

    let repository_link = site
        .repository
        .as_deref()
        .map(|repo| {
            format!(
                r#"
                <a href="{repo}" class="github-link" target="_blank">
                    <svg width="20" height="20" viewBox="0 0 24 24" fill="currentColor">
                        <path d="M12 .3a12 12 0 0 0-3.8 23.4c.6.1.8-.3.8-.6v-2.2c-3.3.7-4-1.4-4-1.4-.6-1.4-1.4-1.8-1.4-1.8-1-.7.1-.7.1-.7 1.2.1 1.8 1.2 1.8 1.2 1 1.8 2.8 1.3 3.5 1 .1-.8.4-1.3.8-1.6-2.7-.3-5.5-1.3-5.5-5.9 0-1.3.5-2.4 1.2-3.2-.1-.3-.5-1.5.1-3.2 0 0 1-.3 3.3 1.2a11.5 11.5 0 0 1 6 0C17.3 4.7 18.3 5 18.3 5c.7 1.7.3 2.9.1 3.2.8.8 1.2 1.9 1.2 3.2 0 4.6-2.8 5.6-5.5 5.9.4.4.8 1.1.8 2.2v3.3c0 .3.2.7.8.6A12 12 0 0 0 12 .3"/>
                    </svg>
                </a>"#
            )
        })
        .unwrap_or_default();

    format!(
        r##"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <link rel="stylesheet" href="{base}/assets/css/main.css">
    <link rel="stylesheet" href="{base}/assets/css/syntax-highlighting.css">
    <link rel="stylesheet" href="{base}/assets/css/search.css">
</head>
<body>
    <div class="book-layout">
        <header class="book-header">
            <div class="header-left">
                <label for="sidebar-toggle-checkbox" class="sidebar-toggle">
                    <svg width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2">
                        <line x1="3" y1="6" x2="21" y2="6"></line>
                        <line x1="3" y1="12" x2="21" y2="12"></line>
                        <line x1="3" y1="18" x2="21" y2="18"></line>
                    </svg>
                </label>
                <a href="{base}/" class="header-title">
                    <h1>{site_title}</h1>
                </a>
            </div>
            <div class="header-right">
                <div class="search-container">
                    <input type="search" placeholder="Search..." class="search-input" id="search-input">
                    <div class="search-results" id="search-results"></div>
                </div>
                <button class="theme-toggle">
                    <svg class="theme-icon theme-icon-light" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2">
                        <circle cx="12" cy="12" r="5"></circle>
                        <line x1="12" y1="1" x2="12" y2="3"></line>
                        <line x1="12" y1="21" x2="12" y2="23"></line>
                        <line x1="4.22" y1="4.22" x2="5.64" y2="5.64"></line>
                        <line x1="18.36" y1="18.36" x2="19.78" y2="19.78"></line>
                        <line x1="1" y1="12" x2="3" y2="12"></line>
                        <line x1="21" y1="12" x2="23" y2="12"></line>
                        <line x1="4.22" y1="19.78" x2="5.64" y2="18.36"></line>
                        <line x1="18.36" y1="5.64" x2="19.78" y2="4.22"></line>
                    </svg>
                    <svg class="theme-icon theme-icon-dark" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2">
                        <path d="M21 12.79A9 9 0 1 1 11.21 3 7 7 0 0 0 21 12.79z"></path>
                    </svg>
                </button>{repository_link}
            </div>
        </header>

        <input type="checkbox" id="sidebar-toggle-checkbox" class="sidebar-toggle-checkbox">

        <aside class="book-sidebar">
            <nav class="sidebar-nav">
            </nav>
        </aside>

        <main class="book-main">
            <div class="book-content">
                <article class="page-content">
                    {content}
                </article>
            </div>
        </main>
    </div>

    <label for="sidebar-toggle-checkbox" class="book-sidebar-overlay"></label>

    <script src="{base}/assets/js/theme.js"></script>
    <script src="{base}/assets/js/search.js"></script>

    <style>
    .sidebar-toggle-checkbox {{
        display: none;
        position: absolute;
        opacity: 0;
        pointer-events: none;
    }}

    @media (max-width: 767px) {{
        .sidebar-toggle {{
            display: flex !important;
        }}

        .sidebar-toggle-checkbox:checked ~ .book-layout .book-sidebar {{
            transform: translateX(0) !important;
        }}

        .sidebar-toggle-checkbox:checked ~ .book-sidebar-overlay {{
            opacity: 1 !important;
            visibility: visible !important;
        }}
    }}
    </style>
</body>
</html>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn site() -> SiteConfig {
        SiteConfig {
            title: "Podman Guide".to_string(),
            description: "Containers in practice".to_string(),
            baseurl: "/podman-book".to_string(),
            ..Default::default()
        }
    }

    fn front_matter(pairs: &[(&str, &str)]) -> FrontMatter {
        let mut fm = FrontMatter::default();
        for (k, v) in pairs {
            fm.insert(*k, *v);
        }
        fm
    }

    #[test]
    fn replaces_every_placeholder_occurrence() {
        let template =
            "<title>{{ page.title }}</title><h1>{{page.title}}</h1><main>{{ content }}</main><aside>{{content}}</aside>";

        let html = apply_template(template, "<p>x</p>", "Pods");

        assert_eq!(
            html,
            "<title>Pods</title><h1>Pods</h1><main><p>x</p></main><aside><p>x</p></aside>"
        );
    }

    #[test]
    fn inserts_replacement_text_literally() {
        let html = apply_template("{{ content }}", "costs $5 or $1.50 ${x}", "");

        assert_eq!(html, "costs $5 or $1.50 ${x}");
    }

    #[test]
    fn missing_title_becomes_empty() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("default.html"),
            "<title>{{ page.title }}</title>{{ content }}",
        )
        .unwrap();

        let layouts = Layouts::new(temp.path());
        let html = layouts.render("<p>body</p>", &FrontMatter::default(), Path::new("a.md"), &site());

        assert_eq!(html, "<title></title><p>body</p>");
    }

    #[test]
    fn uses_named_layout() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("default.html"), "default {{ content }}").unwrap();
        fs::write(temp.path().join("chapter.html"), "chapter {{ content }}").unwrap();

        let layouts = Layouts::new(temp.path());
        let fm = front_matter(&[("layout", "chapter")]);
        let html = layouts.render("body", &fm, Path::new("a.md"), &site());

        assert_eq!(html, "chapter body");
    }

    #[test]
    fn falls_back_to_builtin_when_layout_missing() {
        let temp = tempdir().unwrap();

        let layouts = Layouts::new(temp.path());
        let fm = front_matter(&[("layout", "nonexistent"), ("title", "Networking")]);
        let html = layouts.render("<p>body</p>", &fm, Path::new("a.md"), &site());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Networking</title>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn falls_back_when_layout_unreadable() {
        let temp = tempdir().unwrap();
        // A directory where the layout file should be exists but cannot be read.
        fs::create_dir_all(temp.path().join("default.html")).unwrap();

        let layouts = Layouts::new(temp.path());
        let html = layouts.render("<p>body</p>", &FrontMatter::default(), Path::new("a.md"), &site());

        assert!(html.contains("<title>Podman Guide</title>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn builtin_uses_site_defaults() {
        let html = builtin_layout("<p>hi</p>", "Podman Guide", "Containers in practice", &site());

        assert!(html.contains(r#"<meta name="description" content="Containers in practice">"#));
        assert!(html.contains(r#"href="/podman-book/assets/css/main.css""#));
        assert!(html.contains(r#"href="/podman-book/assets/css/search.css""#));
        assert!(html.contains(r#"<script src="/podman-book/assets/js/theme.js"></script>"#));
        assert!(html.contains(r#"<script src="/podman-book/assets/js/search.js"></script>"#));
        assert!(html.contains(r#"<a href="/podman-book/" class="header-title">"#));
        assert!(html.contains(r#"<article class="page-content">"#));
        assert!(!html.contains("github-link"));
    }

    #[test]
    fn builtin_prefers_page_description() {
        let temp = tempdir().unwrap();
        let layouts = Layouts::new(temp.path());
        let fm = front_matter(&[("description", "Page level")]);

        let html = layouts.render("", &fm, Path::new("a.md"), &site());

        assert!(html.contains(r#"content="Page level""#));
    }

    #[test]
    fn builtin_links_repository_when_configured() {
        let site = SiteConfig {
            repository: Some("https://github.com/example/book".to_string()),
            ..site()
        };

        let html = builtin_layout("", "t", "d", &site);

        assert!(html.contains(r#"<a href="https://github.com/example/book" class="github-link""#));
    }
}
