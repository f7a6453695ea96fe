use serde::ser::Error as _;

use crate::scanner::token::{Token, TokenKind, TokenTree};

/// Deepest nesting `to_json` will serialize; the serializer recurses per level.
pub const MAX_JSON_DEPTH: usize = 1024;

/// Render a token tree as S-expressions, one top-level item per line.
///
/// Leaves print as `(KIND "text")`, groups as `(paren ...)` with their
/// children inline, and the `End` sentinel as `END`.
pub fn to_sexp(trees: &[TokenTree], source: &[u8]) -> String {
    let mut buf = String::new();
    for tree in trees {
        sexp_tree(&mut buf, tree, source);
        buf.push('\n');
    }
    buf
}

pub fn to_json(trees: &[TokenTree]) -> Result<String, serde_json::Error> {
    let depth = TokenTree::max_depth(trees);
    if depth > MAX_JSON_DEPTH {
        return Err(serde_json::Error::custom(format!(
            "token tree nests {depth} groups deep, more than {MAX_JSON_DEPTH}"
        )));
    }
    serde_json::to_string_pretty(trees)
}

enum Step<'a> {
    /// A tree to print; nested ones are preceded by a space.
    Tree(&'a TokenTree, bool),
    CloseGroup,
}

fn sexp_tree(buf: &mut String, tree: &TokenTree, source: &[u8]) {
    let mut pending = vec![Step::Tree(tree, false)];
    while let Some(step) = pending.pop() {
        match step {
            Step::Tree(tree, nested) => {
                if nested {
                    buf.push(' ');
                }
                match tree {
                    TokenTree::Token(token) => sexp_token(buf, token, source),
                    TokenTree::Group(group) => {
                        buf.push('(');
                        buf.push_str(&group.bracket_kind.to_string());
                        pending.push(Step::CloseGroup);
                        pending.extend(group.children.iter().rev().map(|c| Step::Tree(c, true)));
                    }
                }
            }
            Step::CloseGroup => buf.push(')'),
        }
    }
}

fn sexp_token(buf: &mut String, token: &Token, source: &[u8]) {
    if token.kind == TokenKind::End {
        buf.push_str("END");
        return;
    }
    buf.push('(');
    buf.push_str(&token.kind.to_string());
    buf.push_str(" \"");
    for &b in token.span.text(source) {
        push_escaped(buf, b);
    }
    buf.push_str("\")");
}

fn push_escaped(buf: &mut String, b: u8) {
    match b {
        b'"' => buf.push_str("\\\""),
        b'\\' => buf.push_str("\\\\"),
        b'\n' => buf.push_str("\\n"),
        b'\t' => buf.push_str("\\t"),
        b'\r' => buf.push_str("\\r"),
        0x20..=0x7e => buf.push(b as char),
        _ => buf.push_str(&format!("\\x{b:02x}")),
    }
}
