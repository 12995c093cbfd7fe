//! Markup cleanup for feed-entry fragments.
//!
//! Feed publishers ship anything from clean paragraphs to whole page
//! templates inside `<description>`. Two policies are applied here:
//! [`Mode::PlainText`] for list-view summaries and [`Mode::FormattedHtml`]
//! for article bodies that keep a small set of formatting tags.

use std::borrow::Cow;

use scraper::{ElementRef, Html, Node};

/// Hard cap on normalized output, in characters.
pub const MAX_NORMALIZED_CHARS: usize = 5000;

/// Plain-text lines shorter than this are treated as hard-wrapped
/// continuations of the previous line.
const SHORT_LINE_CHARS: usize = 50;

const TERMINAL_PUNCTUATION: [char; 6] = ['.', '。', '!', '！', '?', '？'];

/// Removed together with everything inside them.
const STRIPPED_TAGS: [&str; 4] = ["script", "style", "iframe", "noscript"];

const ALLOWED_TAGS: [&str; 20] = [
    "p", "br", "strong", "em", "b", "i", "u", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
    "li", "blockquote", "a", "code", "pre",
];

const BLOCK_TAGS: [&str; 18] = [
    "p", "div", "section", "article", "header", "footer", "blockquote", "pre", "h1", "h2", "h3",
    "h4", "h5", "h6", "ul", "ol", "table", "tr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Paragraph-aware plain text.
    PlainText,
    /// HTML restricted to the formatting allow-list.
    FormattedHtml,
}

/// Normalize a raw feed fragment under the given policy.
pub fn normalize(raw: &str, mode: Mode) -> String {
    let raw = strip_cdata(raw);
    if raw.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(&raw);
    let root = fragment.root_element();

    match mode {
        Mode::PlainText => plain_text(root),
        Mode::FormattedHtml => formatted_html(root),
    }
}

/// Drop CDATA wrapper markers some feeds leave inside already-decoded text.
pub fn strip_cdata(raw: &str) -> Cow<'_, str> {
    if raw.contains("<![CDATA[") {
        Cow::Owned(raw.replace("<![CDATA[", "").replace("]]>", ""))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Longest prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn is_stripped(name: &str) -> bool {
    STRIPPED_TAGS.contains(&name)
}

// Plain text

fn plain_text(root: ElementRef<'_>) -> String {
    let mut buf = String::new();
    collect_text(root, &mut buf);

    let mut merged: Vec<String> = Vec::new();
    for line in buf.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(prev) if is_continuation(&line) => {
                prev.push(' ');
                prev.push_str(&line);
            }
            _ => merged.push(line),
        }
    }

    truncate_chars(&merged.join("\n\n"), MAX_NORMALIZED_CHARS).to_string()
}

fn is_continuation(line: &str) -> bool {
    line.chars().count() < SHORT_LINE_CHARS && !line.ends_with(TERMINAL_PUNCTUATION)
}

fn collect_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.name();
                if is_stripped(name) {
                    continue;
                }
                match name {
                    "br" => buf.push('\n'),
                    "li" => {
                        let mut item = String::new();
                        collect_text(child_el, &mut item);
                        let item = item.split_whitespace().collect::<Vec<_>>().join(" ");
                        if !item.is_empty() {
                            buf.push_str("\n• ");
                            buf.push_str(&item);
                            buf.push('\n');
                        }
                    }
                    _ if BLOCK_TAGS.contains(&name) => {
                        buf.push('\n');
                        collect_text(child_el, buf);
                        buf.push('\n');
                    }
                    _ => collect_text(child_el, buf),
                }
            }
            _ => {}
        }
    }
}

// Formatted HTML

fn formatted_html(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_formatted(root, &mut out);
    let out = out.trim();

    if out.chars().count() <= MAX_NORMALIZED_CHARS {
        return out.to_string();
    }

    // Cut after the last closing tag that fits whole.
    let head = truncate_chars(out, MAX_NORMALIZED_CHARS);
    let cut = head
        .rmatch_indices("</")
        .find_map(|(start, _)| head[start..].find('>').map(|end| &head[..=start + end]))
        .unwrap_or(head);
    format!("{cut}...")
}

fn write_formatted(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => escape_text(text, out),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.name();
                if is_stripped(name) {
                    continue;
                }
                if !ALLOWED_TAGS.contains(&name) {
                    write_formatted(child_el, out);
                    continue;
                }
                if name == "p" && !has_visible_text(child_el) {
                    continue;
                }

                out.push('<');
                out.push_str(name);
                if name == "a" {
                    if let Some(href) = el.attr("href").filter(|h| is_safe_href(h)) {
                        out.push_str(" href=\"");
                        escape_attr(href, out);
                        out.push('"');
                    }
                }
                out.push('>');

                if name == "br" {
                    continue;
                }
                write_formatted(child_el, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            _ => {}
        }
    }
}

fn has_visible_text(element: ElementRef<'_>) -> bool {
    element.children().any(|child| match child.value() {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Element(el) => {
            !is_stripped(el.name()) && ElementRef::wrap(child).is_some_and(has_visible_text)
        }
        _ => false,
    })
}

fn is_safe_href(href: &str) -> bool {
    !href
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("javascript:")
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}
