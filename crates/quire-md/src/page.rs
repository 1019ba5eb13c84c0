//! Markdown page parsing and rendering.

use std::path::{Path, PathBuf};

use pulldown_cmark::{html, Options, Parser};

use crate::frontmatter::{extract_front_matter, FrontMatter, FrontMatterError};

/// A single Markdown source turned into an HTML fragment.
///
/// Pages carry no state shared with other pages; each one is built,
/// written out and dropped.
#[derive(Debug, Clone)]
pub struct Page {
    /// Where the source came from
    pub source_path: PathBuf,

    /// Metadata from the front matter block (empty when there is none)
    pub front_matter: FrontMatter,

    /// Markdown body without the front matter block
    pub body: String,

    /// Rendered HTML fragment
    pub html: String,
}

/// Errors that can occur when parsing a page.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Front matter error in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
}

impl Page {
    /// Parse a page from its source text.
    pub fn parse(source_path: impl Into<PathBuf>, source: &str) -> Result<Self, ParseError> {
        let source_path = source_path.into();

        let (front_matter, body) =
            extract_front_matter(source).map_err(|source| ParseError::FrontMatter {
                path: source_path.clone(),
                source,
            })?;

        let html = render_markdown(body);

        Ok(Self {
            source_path,
            front_matter: front_matter.unwrap_or_default(),
            body: body.to_string(),
            html,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Title from front matter, if any.
    pub fn title(&self) -> Option<&str> {
        self.front_matter.title()
    }
}

/// Render Markdown to an HTML fragment.
///
/// Raw HTML passes through untouched and quotes/dashes are typographically
/// replaced.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION;

    let parser = Parser::new_ext(content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}
