pub mod grammar;
pub mod identifiers;
pub mod keywords;
pub mod lexer;
pub mod token;
pub mod tree;

use crate::error::LexError;
use grammar::Grammar;
use token::{Span, Token, TokenKind, TokenTree};

/// Scan source into the nested token tree.
///
/// The result is the root frame's children in source order, ending with an
/// `End` token.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn tokenize_tree(source: &[u8], grammar: &Grammar) -> Result<Vec<TokenTree>, LexError> {
    let mut lexer = lexer::Lexer::new(source, grammar);
    let mut builder = tree::TreeBuilder::new();
    for token in lexer.by_ref() {
        let token = token?;
        if token.kind == TokenKind::End {
            return builder.finish(token);
        }
        builder.push(token)?;
    }
    builder.finish(Token::new(TokenKind::End, Span::at(source.len()), lexer.line()))
}

/// Identifier spans of `source` under the default identifier rules.
pub fn scan_identifiers(source: &[u8]) -> Result<Vec<Span>, LexError> {
    identifiers::identifier_spans(source, Grammar::shared())
}

/// Identifier spans of `source` under `grammar`'s identifier rules.
pub fn scan_identifiers_with(source: &[u8], grammar: &Grammar) -> Result<Vec<Span>, LexError> {
    identifiers::identifier_spans(source, grammar)
}
