//! Neutralise Liquid delimiters inside code.
//!
//! Hosts that run Markdown through Liquid (GitHub Pages, Jekyll) choke on
//! `{{ ... }}` in code samples. These rewrites keep such samples literal.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(```[^\n]*\n)(.*?)(\n```)").unwrap());

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());

const RAW_OPEN: &str = "{% raw %}";
const RAW_CLOSE: &str = "{% endraw %}";

/// How code containing Liquid delimiters is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeStyle {
    /// `{{` becomes `\{\{` and `}}` becomes `\}\}`
    #[default]
    Backslash,
    /// Wrap the code in `{% raw %}` / `{% endraw %}`
    Raw,
}

/// Result of escaping one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escaped {
    /// Rewritten document
    pub content: String,
    /// Number of code blocks and spans that were rewritten
    pub fixes: usize,
}

impl Escaped {
    pub fn changed(&self) -> bool {
        self.fixes > 0
    }
}

/// Escape Liquid delimiters in fenced blocks and inline code spans.
///
/// Inline spans are only considered outside fenced blocks. Running the
/// rewrite twice is a no-op the second time.
pub fn escape_liquid(source: &str, style: EscapeStyle) -> Escaped {
    let mut content = String::with_capacity(source.len());
    let mut fixes = 0;
    let mut last = 0;

    for caps in FENCED_BLOCK.captures_iter(source) {
        let whole = caps.get(0).expect("group 0 always matches");
        fixes += escape_inline(&source[last..whole.start()], style, &mut content);
        fixes += escape_block(&caps, style, &mut content);
        last = whole.end();
    }
    fixes += escape_inline(&source[last..], style, &mut content);

    Escaped { content, fixes }
}

fn has_delimiters(code: &str) -> bool {
    code.contains("{{") || code.contains("}}")
}

fn backslash_escape(code: &str) -> String {
    code.replace("{{", r"\{\{").replace("}}", r"\}\}")
}

fn escape_block(caps: &Captures<'_>, style: EscapeStyle, out: &mut String) -> usize {
    let open = &caps[1];
    let code = &caps[2];
    let close = &caps[3];

    if !has_delimiters(code) || (style == EscapeStyle::Raw && code.contains(RAW_OPEN)) {
        out.push_str(&caps[0]);
        return 0;
    }

    out.push_str(open);
    match style {
        EscapeStyle::Backslash => out.push_str(&backslash_escape(code)),
        EscapeStyle::Raw => {
            out.push_str(RAW_OPEN);
            out.push('\n');
            out.push_str(code);
            out.push('\n');
            out.push_str(RAW_CLOSE);
        }
    }
    out.push_str(close);
    1
}

fn escape_inline(text: &str, style: EscapeStyle, out: &mut String) -> usize {
    let mut fixes = 0;
    let mut last = 0;

    for caps in INLINE_CODE.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always matches");
        let code = &caps[1];
        out.push_str(&text[last..whole.start()]);
        last = whole.end();

        let already_raw = text[..whole.start()].ends_with(RAW_OPEN);
        if !has_delimiters(code) || (style == EscapeStyle::Raw && already_raw) {
            out.push_str(whole.as_str());
            continue;
        }

        fixes += 1;
        match style {
            EscapeStyle::Backslash => {
                out.push('`');
                out.push_str(&backslash_escape(code));
                out.push('`');
            }
            EscapeStyle::Raw => {
                out.push_str(RAW_OPEN);
                out.push_str(whole.as_str());
                out.push_str(RAW_CLOSE);
            }
        }
    }
    out.push_str(&text[last..]);

    fixes
}
