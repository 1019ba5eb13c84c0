//! Markdown pages for quire books.
//!
//! Splits sources into front matter and body, renders the body to HTML, and
//! provides the Liquid-escaping rewrite used before publishing to
//! Liquid-based hosts.

pub mod frontmatter;
pub mod liquid;
pub mod page;

pub use frontmatter::{extract_front_matter, FrontMatter, FrontMatterError};
pub use liquid::{escape_liquid, EscapeStyle, Escaped};
pub use page::{render_markdown, Page, ParseError};
