use crate::error::LexError;
use crate::scanner::grammar::Grammar;
use crate::scanner::lexer::Lexer;
use crate::scanner::token::{Span, TokenKind};

/// Spans of every identifier in `source`, in order.
///
/// Keywords are not resolved, so `wait` is reported like any other name, and
/// brackets are not checked. Unterminated literals and comments still fail.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn identifier_spans(source: &[u8], grammar: &Grammar) -> Result<Vec<Span>, LexError> {
    let mut spans = Vec::new();
    for token in Lexer::new(source, grammar).without_keywords() {
        let token = token?;
        if token.kind == TokenKind::Identifier {
            spans.push(token.span);
        }
    }
    tracing::debug!(count = spans.len(), "identifiers collected");
    Ok(spans)
}
