use std::fmt;

use serde::Serialize;

use crate::scanner::keywords::Keyword;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum BracketKind {
    #[strum(serialize = "paren")]
    Paren,
    #[strum(serialize = "brace")]
    Brace,
    #[strum(serialize = "bracket")]
    Bracket,
}

impl BracketKind {
    pub fn open_byte(self) -> u8 {
        match self {
            Self::Paren => b'(',
            Self::Brace => b'{',
            Self::Bracket => b'[',
        }
    }

    pub fn close_byte(self) -> u8 {
        match self {
            Self::Paren => b')',
            Self::Brace => b'}',
            Self::Bracket => b']',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Identifier,
    Keyword(Keyword),

    // Literals
    StringLiteral,
    CharLiteral,
    IntLiteral,
    FloatLiteral,
    HexLiteral,

    Include,

    // Punctuation
    Colon,
    Semicolon,
    Comma,
    Eq,
    Dot,
    Arrow,
    Cruft,

    // Bracket markers, consumed by the tree builder
    GroupOpen(BracketKind),
    GroupClose(BracketKind),

    End,
}

impl TokenKind {
    pub fn is_group_marker(self) -> bool {
        matches!(self, Self::GroupOpen(_) | Self::GroupClose(_))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => write!(f, "IDENTIFIER"),
            Self::Keyword(k) => write!(f, "{k}"),
            Self::StringLiteral => write!(f, "STRING"),
            Self::CharLiteral => write!(f, "CHAR"),
            Self::IntLiteral => write!(f, "INT"),
            Self::FloatLiteral => write!(f, "FLOAT"),
            Self::HexLiteral => write!(f, "HEX"),
            Self::Include => write!(f, "INCLUDE"),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::Eq => write!(f, "="),
            Self::Dot => write!(f, "."),
            Self::Arrow => write!(f, "->"),
            Self::Cruft => write!(f, "CRUFT"),
            Self::GroupOpen(kind) => write!(f, "{}", kind.open_byte() as char),
            Self::GroupClose(kind) => write!(f, "{}", kind.close_byte() as char),
            Self::End => write!(f, "END"),
        }
    }
}

/// Inclusive byte range into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(end >= start, "span end {end} precedes start {start}");
        Self { start, end }
    }

    /// Span covering the half-open range `start..stop`, which must be non-empty.
    pub fn from_range(start: usize, stop: usize) -> Self {
        Self::new(start, stop - 1)
    }

    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn byte_len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Source bytes covered by this span, clamped to the buffer.
    pub fn text<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        let stop = (self.end + 1).min(source.len());
        &source[self.start.min(stop)..stop]
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.start.into(), span.byte_len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, line: u32) -> Self {
        Self { kind, span, line }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {}..={} line {}",
            self.kind, self.span.start, self.span.end, self.line
        )
    }
}

/// One matched bracket pair and everything lexically between the brackets.
///
/// Nesting depth is bounded only by the input, so dropping and comparing
/// groups walk an explicit work stack instead of recursing.
#[derive(Debug, Clone, Serialize)]
pub struct GroupNode {
    pub bracket_kind: BracketKind,
    /// Offsets of the opening and closing bracket characters.
    pub span: Span,
    /// Line of the opening bracket.
    pub line: u32,
    pub close_line: u32,
    pub children: Vec<TokenTree>,
}

impl GroupNode {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    fn same_shell(&self, other: &Self) -> bool {
        self.bracket_kind == other.bracket_kind
            && self.span == other.span
            && self.line == other.line
            && self.close_line == other.close_line
            && self.children.len() == other.children.len()
    }
}

impl PartialEq for GroupNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.same_shell(b) {
                return false;
            }
            for pair in a.children.iter().zip(&b.children) {
                match pair {
                    (TokenTree::Token(x), TokenTree::Token(y)) if x == y => {}
                    (TokenTree::Group(x), TokenTree::Group(y)) => pending.push((x, y)),
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for GroupNode {}

impl Drop for GroupNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(tree) = pending.pop() {
            if let TokenTree::Group(mut group) = tree {
                pending.append(&mut group.children);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TokenTree {
    Token(Token),
    Group(GroupNode),
}

impl TokenTree {
    pub fn span(&self) -> Span {
        match self {
            Self::Token(token) => token.span,
            Self::Group(group) => group.span,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Self::Group(group) => Some(group),
            Self::Token(_) => None,
        }
    }

    /// Re-emit the flat token stream this tree was built from, with
    /// `GroupOpen`/`GroupClose` markers standing in for each group.
    pub fn flatten(trees: &[TokenTree]) -> Vec<Token> {
        enum Step<'a> {
            Visit(&'a TokenTree),
            Close(&'a GroupNode),
        }

        let mut out = Vec::new();
        let mut pending: Vec<Step<'_>> = trees.iter().rev().map(Step::Visit).collect();
        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(Self::Token(token)) => out.push(*token),
                Step::Visit(Self::Group(group)) => {
                    out.push(Token::new(
                        TokenKind::GroupOpen(group.bracket_kind),
                        Span::at(group.span.start),
                        group.line,
                    ));
                    pending.push(Step::Close(group));
                    pending.extend(group.children.iter().rev().map(Step::Visit));
                }
                Step::Close(group) => out.push(Token::new(
                    TokenKind::GroupClose(group.bracket_kind),
                    Span::at(group.span.end),
                    group.close_line,
                )),
            }
        }
        out
    }

    /// Deepest bracket nesting in `trees`; zero for a flat stream.
    pub fn max_depth(trees: &[TokenTree]) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(&TokenTree, usize)> = trees.iter().map(|t| (t, 1)).collect();
        while let Some((tree, depth)) = pending.pop() {
            if let Self::Group(group) = tree {
                deepest = deepest.max(depth);
                pending.extend(group.children.iter().map(|c| (c, depth + 1)));
            }
        }
        deepest
    }
}
