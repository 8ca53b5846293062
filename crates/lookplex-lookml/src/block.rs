//! Brace-delimited block scanning shared by the view and explore extractors

use regex::Regex;
use std::ops::Range;

/// A `keyword: name { ... }` block found in LookML text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block<'a> {
    /// Header keyword (`dimension`, `join`, ...) when the header regex captures one
    pub keyword: &'a str,

    /// Block name
    pub name: &'a str,

    /// Text between the braces
    pub body: &'a str,

    /// Byte range of the whole block, header included
    pub span: Range<usize>,
}

/// Find every block whose header matches `header`.
///
/// The header regex must end at the opening brace and capture the block
/// name as `name`; it may capture `keyword`. Blocks are not nested: the
/// search resumes after the closing brace of each block found. An
/// unbalanced block runs to the end of the text.
pub(crate) fn find_blocks<'a>(text: &'a str, header: &Regex) -> Vec<Block<'a>> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(caps) = header.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let Some(name) = caps.name("name") else {
            pos = whole.end();
            continue;
        };
        let keyword = caps.name("keyword").map(|m| m.as_str()).unwrap_or_default();

        // The header ends on '{'
        let open = whole.end() - 1;
        let close = matching_brace(text, open).unwrap_or(text.len());
        let body_end = close.min(text.len());

        blocks.push(Block {
            keyword,
            name: name.as_str(),
            body: &text[open + 1..body_end],
            span: whole.start()..(close + 1).min(text.len()),
        });

        pos = (close + 1).max(whole.end());
    }

    blocks
}

/// Index of the `}` closing the `{` at `open`.
///
/// Double-quoted strings and line comments (`#` as the first non-blank
/// character) are skipped.
pub(crate) fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut line_start = true;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];

        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match b {
            b'\n' => {
                line_start = true;
                i += 1;
                continue;
            }
            b'#' if line_start => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }

        if !b.is_ascii_whitespace() {
            line_start = false;
        }
        i += 1;
    }

    None
}

/// `text` with the given byte ranges cut out
pub(crate) fn without_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in spans {
        if span.start >= last {
            out.push_str(&text[last..span.start]);
            last = span.end;
        }
    }
    out.push_str(&text[last.min(text.len())..]);
    out
}

/// First capture group of `re` in `text`, trimmed
pub(crate) fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Strip one pair of surrounding double or single quotes
pub(crate) fn unquote(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}
