//! Depth-aware scanning of SQL text.
//!
//! The scanner walks the text once, skipping string literals, quoted identifiers, comments and
//! dollar-quoted bodies, and records every remaining character with the parenthesis depth it
//! sits at. Splitting and keyword searches then only look at depth-0 code, which is enough to
//! keep nested calls, subqueries and type modifiers like `NUMERIC(10,2)` in one piece.

/// A character outside literals and comments, with its parenthesis depth.
///
/// An opening parenthesis carries the depth outside of it, as does its closing partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeChar {
    pub offset: usize,
    pub ch: char,
    pub depth: i32,
}

pub struct SqlScanner<'a> {
    text: &'a str,
    code: Vec<CodeChar>,
}

impl<'a> SqlScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut code = Vec::new();
        let mut depth = 0;
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            if let Some(len) = literal_len(rest) {
                pos += len;
                continue;
            }
            let Some(ch) = rest.chars().next() else {
                break;
            };
            match ch {
                '(' => {
                    code.push(CodeChar { offset: pos, ch, depth });
                    depth += 1;
                }
                ')' => {
                    depth -= 1;
                    code.push(CodeChar { offset: pos, ch, depth });
                }
                _ => code.push(CodeChar { offset: pos, ch, depth }),
            }
            pos += ch.len_utf8();
        }

        SqlScanner { text, code }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn code(&self) -> &[CodeChar] {
        &self.code
    }

    fn code_at(&self, offset: usize) -> Option<&CodeChar> {
        self.code
            .binary_search_by_key(&offset, |c| c.offset)
            .ok()
            .map(|idx| &self.code[idx])
    }

    /// Splits on `sep` at depth 0. Pieces are trimmed and empty pieces dropped.
    pub fn split_top_level(&self, sep: char) -> Vec<&'a str> {
        let mut parts = Vec::new();
        let mut start = 0;
        for c in self.code.iter().filter(|c| c.ch == sep && c.depth == 0) {
            parts.push(self.text[start..c.offset].trim());
            start = c.offset + sep.len_utf8();
        }
        parts.push(self.text[start..].trim());
        parts.retain(|part| !part.is_empty());
        parts
    }

    /// First depth-0 occurrence of `keyword` at or after `from`, as a byte range.
    pub fn find_keyword(&self, keyword: &str, from: usize) -> Option<(usize, usize)> {
        self.code
            .iter()
            .filter(|c| c.offset >= from && c.depth == 0)
            .find_map(|c| match_keyword(self.text, c.offset, keyword).map(|end| (c.offset, end)))
    }

    /// Last depth-0 occurrence of `keyword`, as a byte range.
    pub fn find_last_keyword(&self, keyword: &str) -> Option<(usize, usize)> {
        self.code
            .iter()
            .rev()
            .filter(|c| c.depth == 0)
            .find_map(|c| match_keyword(self.text, c.offset, keyword).map(|end| (c.offset, end)))
    }

    /// End of a clause that starts at `from` and lives at `depth`: the offset of the first stop
    /// keyword at that depth, of a parenthesis closing the enclosing group, or the text end.
    pub fn clause_end(&self, from: usize, depth: i32, stops: &[&str]) -> usize {
        self.code
            .iter()
            .filter(|c| c.offset >= from)
            .find(|c| {
                c.depth < depth
                    || (c.depth == depth
                        && stops
                            .iter()
                            .any(|stop| match_keyword(self.text, c.offset, stop).is_some()))
            })
            .map_or(self.text.len(), |c| c.offset)
    }

    /// Offset of the parenthesis closing the one at `open`.
    pub fn matching_paren(&self, open: usize) -> Option<usize> {
        let opening = *self.code_at(open)?;
        if opening.ch != '(' {
            return None;
        }
        self.code
            .iter()
            .filter(|c| c.offset > open)
            .find(|c| c.ch == ')' && c.depth == opening.depth)
            .map(|c| c.offset)
    }

    /// Offset of the last depth-0 whitespace character.
    pub fn last_top_level_whitespace(&self) -> Option<usize> {
        self.code
            .iter()
            .rev()
            .find(|c| c.depth == 0 && c.ch.is_whitespace())
            .map(|c| c.offset)
    }
}

/// Length of the comment, string literal, quoted identifier or dollar-quoted body starting at
/// the beginning of `rest`. Unterminated regions run to the end of the text.
pub fn literal_len(rest: &str) -> Option<usize> {
    if rest.starts_with("--") {
        return Some(rest.find('\n').unwrap_or(rest.len()));
    }
    if rest.starts_with("/*") {
        return Some(rest[2..].find("*/").map_or(rest.len(), |end| end + 4));
    }
    let first = rest.chars().next()?;
    match first {
        '\'' | '"' => Some(rest[1..].find(first).map_or(rest.len(), |end| end + 2)),
        '$' => {
            let tag = dollar_tag(rest)?;
            Some(
                rest[tag.len()..]
                    .find(tag)
                    .map_or(rest.len(), |end| end + 2 * tag.len()),
            )
        }
        _ => None,
    }
}

/// The `$tag$` opening a dollar-quoted body, if `rest` starts with one. `$1` style parameters
/// are not tags.
fn dollar_tag(rest: &str) -> Option<&str> {
    let body = &rest[1..];
    let body_len = body.find(|c: char| !(c.is_alphanumeric() || c == '_'))?;
    if !body[body_len..].starts_with('$') || body.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(&rest[..body_len + 2])
}

/// Returns the text with comments replaced by a single space; literals are kept verbatim.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if let Some(len) = literal_len(rest) {
            if rest.starts_with("--") || rest.starts_with("/*") {
                out.push(' ');
            } else {
                out.push_str(&rest[..len]);
            }
            pos += len;
            continue;
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        pos += ch.len_utf8();
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Matches a possibly multi-word keyword (`"GROUP BY"`) case-insensitively at `start`, with word
/// boundaries on both ends and any whitespace between words. Returns the end offset.
pub fn match_keyword(text: &str, start: usize, keyword: &str) -> Option<usize> {
    if text[..start].chars().next_back().is_some_and(is_ident_char) {
        return None;
    }
    let mut pos = start;
    for (i, word) in keyword.split_whitespace().enumerate() {
        if i > 0 {
            let rest = &text[pos..];
            let skipped = rest.len() - rest.trim_start().len();
            if skipped == 0 {
                return None;
            }
            pos += skipped;
        }
        let candidate = text.get(pos..pos + word.len())?;
        if !candidate.eq_ignore_ascii_case(word) {
            return None;
        }
        pos += word.len();
    }
    if text[pos..].chars().next().is_some_and(is_ident_char) {
        return None;
    }
    Some(pos)
}
