//! Nesting of the flat token stream into bracket groups.
//!
//! The builder keeps a stack of open frames. The bottom frame is the root and
//! carries no bracket; every other frame was pushed by an opening bracket and
//! is popped by the matching closer, at which point its children become a
//! [`GroupNode`] in the frame below.

use crate::error::LexError;
use crate::scanner::token::{BracketKind, GroupNode, Span, Token, TokenKind, TokenTree};

#[derive(Debug, Clone, Copy)]
struct Opener {
    kind: BracketKind,
    offset: usize,
    line: u32,
}

#[derive(Debug)]
struct Frame {
    /// `None` for the root frame.
    opener: Option<Opener>,
    children: Vec<TokenTree>,
}

impl Frame {
    fn root() -> Self {
        Self {
            opener: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct TreeBuilder {
    frames: Vec<Frame>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::root()],
        }
    }

    /// Number of brackets currently open.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn top(&mut self) -> &mut Frame {
        // The root frame is never popped, so the stack is never empty.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Feed one token from the classifier.
    ///
    /// `End` is accepted here as an ordinary child; use [`finish`](Self::finish)
    /// to close the stream.
    pub fn push(&mut self, token: Token) -> Result<(), LexError> {
        match token.kind {
            TokenKind::GroupOpen(kind) => {
                tracing::trace!(%kind, offset = token.span.start, depth = self.depth(), "open");
                self.frames.push(Frame {
                    opener: Some(Opener {
                        kind,
                        offset: token.span.start,
                        line: token.line,
                    }),
                    children: Vec::new(),
                });
            }
            TokenKind::GroupClose(kind) => self.close(kind, token)?,
            _ => self.top().children.push(TokenTree::Token(token)),
        }
        Ok(())
    }

    fn close(&mut self, kind: BracketKind, token: Token) -> Result<(), LexError> {
        let frame = self.frames.pop().unwrap_or_else(Frame::root);
        let opener = match frame.opener {
            Some(opener) if opener.kind == kind => opener,
            other => {
                // Nothing was closed; the frame stays open.
                self.frames.push(frame);
                let expected = other.map(|o| o.kind);
                tracing::debug!(line = token.line, ?expected, found = %kind, "mismatched bracket");
                return Err(LexError::mismatched_bracket(token.line, expected, kind, token.span));
            }
        };
        tracing::trace!(%kind, offset = token.span.start, depth = self.depth(), "close");
        let group = GroupNode {
            bracket_kind: kind,
            span: Span::new(opener.offset, token.span.start),
            line: opener.line,
            close_line: token.line,
            children: frame.children,
        };
        self.top().children.push(TokenTree::Group(group));
        Ok(())
    }

    /// Append the `End` sentinel and hand back the root's children.
    ///
    /// Fails if any bracket is still open, reporting the innermost one.
    pub fn finish(mut self, end: Token) -> Result<Vec<TokenTree>, LexError> {
        self.top().children.push(TokenTree::Token(end));
        if let Some(opener) = self.frames.last().and_then(|f| f.opener) {
            tracing::debug!(line = opener.line, depth = self.depth(), "unclosed bracket");
            return Err(LexError::unclosed_bracket(opener.line, Span::at(opener.offset)));
        }
        let root = self.frames.pop().map(|f| f.children).unwrap_or_default();
        Ok(root)
    }
}

/// Nest a flat token stream. The stream must end with an `End` token; any
/// tokens after it are ignored.
pub fn build_tree(tokens: impl IntoIterator<Item = Token>) -> Result<Vec<TokenTree>, LexError> {
    let mut builder = TreeBuilder::new();
    let (mut offset, mut line) = (0, 1);
    for token in tokens {
        if token.kind == TokenKind::End {
            return builder.finish(token);
        }
        offset = token.span.end + 1;
        line = token.line;
        builder.push(token)?;
    }
    builder.finish(Token::new(TokenKind::End, Span::at(offset), line))
}
