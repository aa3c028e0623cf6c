//! Turns Outline documents into text for the host.
//!
//! Outline stores document bodies as markdown. [`extract`] reduces that to
//! plain text with paragraph breaks intact; [`render_document`] and
//! [`render_collection`] keep the markdown and only normalise whitespace,
//! producing the page content the host shows for a single selection.
//!
//! Everything here is pure: the same input always yields the same output.
//! Child documents are never looked up here; the coordinator resolves them.

use std::sync::OnceLock;

use regex::Regex;

use crate::contract::{Collection, Document, ExtractedContent};

const UNTITLED_DOCUMENT: &str = "Untitled Document";
const UNTITLED_COLLECTION: &str = "Untitled Collection";

/// Characters Outline backslash-escapes in its markdown.
const ESCAPABLE: &str = "\\`*_{}[]()#+-.!~>|=";
/// Escaped characters are parked in a private use block the line does not
/// already contain while markers are stripped, then restored.
const PRIVATE_USE: [(u32, u32); 2] = [(0xE000, 0xF8FF), (0xF0000, 0xFFFFD)];

struct Patterns {
    excess_breaks: Regex,
    heading: Regex,
    blockquote: Regex,
    task_bullet: Regex,
    bullet: Regex,
    rule: Regex,
    image: Regex,
    link: Regex,
    code: Regex,
    bold: Regex,
    bold_underscore: Regex,
    strike: Regex,
    highlight: Regex,
    italic: Regex,
    italic_underscore: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static pattern compiles");
        Patterns {
            excess_breaks: re(r"\n\s*\n\s*\n+"),
            heading: re(r"^#{1,6}\s+"),
            blockquote: re(r"^(>\s?)+"),
            task_bullet: re(r"^[-*+]\s+\[[ xX]\]\s+"),
            bullet: re(r"^[-*+]\s+"),
            rule: re(r"^(?:(?:\*\s*){3,}|(?:-\s*){3,}|(?:_\s*){3,})$"),
            image: re(r"!\[([^\]]*)\]\([^)]*\)"),
            link: re(r"\[([^\]]+)\]\([^)]*\)"),
            code: re(r"`([^`]*)`"),
            bold: re(r"\*\*([^*]+)\*\*"),
            bold_underscore: re(r"__([^_]+)__"),
            strike: re(r"~~([^~]+)~~"),
            highlight: re(r"==([^=]+)=="),
            italic: re(r"\*([^*\s][^*]*)\*"),
            italic_underscore: re(r"(^|[^\w])_([^_]+)_([^\w]|$)"),
        }
    })
}

/// Reduces a document to plain text.
pub fn extract(document: &Document) -> ExtractedContent {
    ExtractedContent {
        title: title_or(&document.title, UNTITLED_DOCUMENT),
        body: to_plain_text(&document.text),
        document_id: document.id.clone(),
        collection_id: document.collection_id.clone(),
    }
}

/// Strips Outline markdown down to plain text, keeping paragraph breaks.
pub fn to_plain_text(markdown: &str) -> String {
    let p = patterns();
    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(line.trim_end().to_string());
            continue;
        }
        // Outline writes empty paragraphs as a lone backslash.
        if trimmed == "\\" || p.rule.is_match(trimmed) {
            lines.push(String::new());
            continue;
        }
        let stripped = match parking_base(trimmed) {
            Some(base) => unpark_escapes(
                &strip_inline(&strip_block_markers(&park_escapes(trimmed, base))),
                base,
            ),
            None => strip_inline(&strip_block_markers(trimmed)),
        };
        lines.push(stripped);
    }

    clean_text(&lines.join("\n"))
}

fn strip_block_markers(line: &str) -> String {
    let p = patterns();
    let line = p.heading.replace(line, "");
    let line = p.blockquote.replace(&line, "");
    let line = p.task_bullet.replace(&line, "");
    let line = p.bullet.replace(&line, "");
    line.into_owned()
}

fn strip_inline(line: &str) -> String {
    let p = patterns();
    let line = p.image.replace_all(line, "$1");
    let line = p.link.replace_all(&line, "$1");
    let line = p.code.replace_all(&line, "$1");
    let line = p.bold.replace_all(&line, "$1");
    let line = p.bold_underscore.replace_all(&line, "$1");
    let line = p.strike.replace_all(&line, "$1");
    let line = p.highlight.replace_all(&line, "$1");
    let line = p.italic.replace_all(&line, "$1");
    let line = p.italic_underscore.replace_all(&line, "${1}${2}${3}");
    line.trim_end().to_string()
}

/// First private use block of `ESCAPABLE.len()` code points absent from `line`.
fn parking_base(line: &str) -> Option<u32> {
    let width = ESCAPABLE.len() as u32;
    PRIVATE_USE
        .iter()
        .flat_map(|&(start, end)| (start..=end + 1 - width).step_by(width as usize))
        .find(|&base| {
            !line
                .chars()
                .any(|c| (base..base + width).contains(&(c as u32)))
        })
}

fn park_escapes(line: &str, base: u32) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(idx) = chars.peek().and_then(|n| ESCAPABLE.find(*n)) {
                chars.next();
                out.extend(char::from_u32(base + idx as u32));
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn unpark_escapes(line: &str, base: u32) -> String {
    line.chars()
        .map(|c| {
            let code = c as u32;
            if (base..base + ESCAPABLE.len() as u32).contains(&code) {
                ESCAPABLE.as_bytes()[(code - base) as usize] as char
            } else {
                c
            }
        })
        .collect()
}

/// Normalises whitespace while preserving paragraph breaks.
///
/// Runs of blank lines collapse into one break, each paragraph is trimmed and
/// empty paragraphs are dropped.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let collapsed = patterns().excess_breaks.replace_all(text, "\n\n");
    collapsed
        .trim()
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdown page for a single document: a title heading and the cleaned body.
pub fn render_document(document: &Document) -> String {
    let mut out = format!("# {}\n\n", title_or(&document.title, UNTITLED_DOCUMENT));
    out.push_str(&clean_text(&document.text));
    out
}

/// Markdown page for a collection with every document's body inlined, in the
/// order given.
pub fn render_collection(collection: &Collection, documents: &[Document]) -> String {
    let mut out = format!("# {}\n\n", title_or(&collection.name, UNTITLED_COLLECTION));
    if let Some(description) = collection.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(description);
        out.push_str("\n\n");
    }
    out.push_str("---\n\n");

    if documents.is_empty() {
        out.push_str("*No documents found in this collection*\n\n");
        return out;
    }

    out.push_str("## Documents in this Collection\n\n");
    for doc in documents {
        out.push_str(&format!(
            "### {}\n\n",
            title_or(&doc.title, UNTITLED_DOCUMENT)
        ));
        out.push_str(&clean_text(&doc.text));
        out.push_str("\n\n");
    }
    out
}

fn title_or(title: &str, fallback: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        fallback.to_string()
    } else {
        title.to_string()
    }
}
