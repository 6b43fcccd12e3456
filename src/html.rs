//! Small HTML helpers for the markup a contenteditable surface produces.

use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;

pub const NBSP: char = '\u{a0}';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Open { name: String, attrs: String },
    Close { name: String },
}

fn tag_re() -> &'static Regex {
    static RE_TAG: OnceLock<Regex> = OnceLock::new();
    RE_TAG.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)((?:[^>\x22']|\x22[^\x22]*\x22|'[^']*')*)>")
            .unwrap()
    })
}

/// Splits markup into text runs and tags. Text is entity-decoded, tag names
/// are lowercased, comments are dropped.
pub fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;
    for caps in tag_re().captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > cursor {
            tokens.push(Token::Text(decode_entities(&html[cursor..whole.start()])));
        }
        cursor = whole.end();

        let Some(name) = caps.get(2) else { continue };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            tokens.push(Token::Close { name });
        } else {
            let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            tokens.push(Token::Open {
                name,
                attrs: attrs.trim().trim_end_matches('/').trim().to_string(),
            });
        }
    }
    if cursor < html.len() {
        tokens.push(Token::Text(decode_entities(&html[cursor..])));
    }
    tokens
}

/// Looks up an attribute value in the raw attribute text of a tag.
pub fn attr(attrs: &str, wanted: &str) -> Option<String> {
    static RE_ATTR: OnceLock<Regex> = OnceLock::new();
    let re = RE_ATTR.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .unwrap()
    });
    re.captures_iter(attrs).find_map(|caps| {
        let name = caps.get(1)?.as_str();
        if !name.eq_ignore_ascii_case(wanted) {
            return None;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or_default();
        Some(decode_entities(value))
    })
}

/// Reads one declaration out of an inline `style` attribute.
pub fn style_property(attrs: &str, property: &str) -> Option<String> {
    let style = attr(attrs, "style")?;
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim().to_string())
    })
}

pub fn decode_entities(text: &str) -> String {
    static RE_ENTITY: OnceLock<Regex> = OnceLock::new();
    let re = RE_ENTITY
        .get_or_init(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());
    if !text.contains('&') {
        return text.to_string();
    }
    re.replace_all(text, |caps: &Captures| {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match body {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(NBSP),
                "copy" => Some('©'),
                "reg" => Some('®'),
                "trade" => Some('™'),
                _ => None,
            }
        };
        decoded
            .map(String::from)
            .unwrap_or_else(|| whole.to_string())
    })
    .into_owned()
}

/// Escapes text content the way `innerHTML` serializes it.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            NBSP => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "div" | "p" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre"
    )
}

/// Rendered text of a fragment, roughly what `innerText` reports.
pub fn plain_text(html: &str) -> String {
    let mut out = String::new();
    let mut pending_break = false;
    let mut skip_depth = 0usize;
    for token in tokenize(html) {
        match token {
            Token::Text(text) => {
                if skip_depth > 0 || text.is_empty() {
                    continue;
                }
                if pending_break && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                pending_break = false;
                out.push_str(&text);
            }
            Token::Open { name, .. } if name == "br" => {
                out.push('\n');
                pending_break = false;
            }
            Token::Open { name, .. } if name == "script" || name == "style" => skip_depth += 1,
            Token::Close { name } if name == "script" || name == "style" => {
                skip_depth = skip_depth.saturating_sub(1)
            }
            Token::Open { name, .. } | Token::Close { name } if is_block(&name) => {
                pending_break = true;
            }
            _ => {}
        }
    }
    out
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextStats {
    pub words: usize,
    pub chars: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        let trimmed = text.trim();
        let words = if trimmed.is_empty() {
            0
        } else {
            trimmed.split_whitespace().count()
        };
        Self {
            words,
            chars: text.chars().count(),
        }
    }
}

impl fmt::Display for TextStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} words • {} chars", self.words, self.chars)
    }
}
