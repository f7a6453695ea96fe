use winnow::ascii::digit1;
use winnow::combinator::{alt, cut_err, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Location, Stream};
use winnow::token::{any, one_of, take_till, take_until, take_while};

use crate::error::LexError;
use crate::scanner::grammar::{Grammar, IdentifierRules};
use crate::scanner::token::{BracketKind, Span, Token, TokenKind};

type Input<'a> = LocatingSlice<&'a [u8]>;

fn whitespace<'a>(input: &mut Input<'a>) -> ModalResult<&'a [u8]> {
    take_while(1.., |b: u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n')).parse_next(input)
}

fn line_comment<'a>(input: &mut Input<'a>) -> ModalResult<&'a [u8]> {
    ("//", take_till(0.., b'\n')).take().parse_next(input)
}

fn block_comment<'a>(input: &mut Input<'a>) -> ModalResult<&'a [u8]> {
    ("/*", cut_err(take_until(0.., "*/")), "*/")
        .take()
        .parse_next(input)
}

/// Body of a quoted literal after the opening delimiter, up to and
/// including the closing one. A backslash escapes any following byte.
fn quoted_tail(input: &mut Input<'_>, delim: u8) -> ModalResult<()> {
    loop {
        take_while(0.., |b: u8| b != delim && b != b'\\')
            .void()
            .parse_next(input)?;
        match any.parse_next(input)? {
            b'\\' => {
                any.void().parse_next(input)?;
            }
            _ => return Ok(()),
        }
    }
}

fn quoted<'a>(input: &mut Input<'a>, delim: u8) -> ModalResult<&'a [u8]> {
    (delim, cut_err(|i: &mut Input<'a>| quoted_tail(i, delim)))
        .take()
        .parse_next(input)
}

fn directive<'a>(input: &mut Input<'a>) -> ModalResult<&'a [u8]> {
    (b'#', take_till(0.., b'\n')).take().parse_next(input)
}

fn number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        (
            alt(("0x", "0X")),
            take_while(1.., |b: u8| b.is_ascii_hexdigit()),
        )
            .value(TokenKind::HexLiteral),
        (digit1, b'.', digit1).value(TokenKind::FloatLiteral),
        digit1.value(TokenKind::IntLiteral),
    ))
    .parse_next(input)
}

fn identifier<'a>(input: &mut Input<'a>, rules: IdentifierRules) -> ModalResult<&'a [u8]> {
    (
        opt(one_of(move |b: u8| rules.at_prefix && b == b'@')),
        one_of(move |b: u8| rules.is_start(b)),
        take_while(0.., move |b: u8| rules.is_continue(b)),
    )
        .take()
        .parse_next(input)
}

fn bracket(b: u8) -> Option<TokenKind> {
    let kind = match b {
        b'(' => TokenKind::GroupOpen(BracketKind::Paren),
        b')' => TokenKind::GroupClose(BracketKind::Paren),
        b'{' => TokenKind::GroupOpen(BracketKind::Brace),
        b'}' => TokenKind::GroupClose(BracketKind::Brace),
        b'[' => TokenKind::GroupOpen(BracketKind::Bracket),
        b']' => TokenKind::GroupClose(BracketKind::Bracket),
        _ => return None,
    };
    Some(kind)
}

/// Line number after `newlines` more line breaks, pinned at `u32::MAX`.
fn advance_line(line: u32, newlines: usize) -> u32 {
    line.saturating_add(u32::try_from(newlines).unwrap_or(u32::MAX))
}

/// One step of the classifier: a token, or a span that produces none
/// (whitespace and comments).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lexeme {
    Token(Token),
    Trivia(Span),
}

enum Scanned {
    Trivia,
    Token(TokenKind),
}

/// Pull-based character classifier over a byte buffer.
///
/// Yields tokens in source order, bracket markers included, finishing with a
/// single `End` token. The first error ends the stream.
pub struct Lexer<'s, 'g> {
    input: Input<'s>,
    source: &'s [u8],
    grammar: &'g Grammar,
    classify_keywords: bool,
    line: u32,
    at_line_start: bool,
    done: bool,
}

impl<'s, 'g> Lexer<'s, 'g> {
    pub fn new(source: &'s [u8], grammar: &'g Grammar) -> Self {
        Self {
            input: LocatingSlice::new(source),
            source,
            grammar,
            classify_keywords: true,
            line: 1,
            at_line_start: true,
            done: false,
        }
    }

    /// Leave identifiers unclassified even when they spell a keyword.
    pub fn without_keywords(mut self) -> Self {
        self.classify_keywords = false;
        self
    }

    /// Line the cursor is currently on.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub(crate) fn next_lexeme(&mut self) -> Result<Option<Lexeme>, LexError> {
        if self.done {
            return Ok(None);
        }
        let start = self.input.current_token_start();
        let Some(&b) = self.input.first() else {
            self.done = true;
            let end = Token::new(TokenKind::End, Span::at(self.source.len()), self.line);
            return Ok(Some(Lexeme::Token(end)));
        };
        let line = self.line;

        let checkpoint = self.input.checkpoint();
        let scanned = match self.scan_step(b) {
            Ok(scanned) => scanned,
            Err(ErrMode::Backtrack(_)) => {
                self.input.reset(&checkpoint);
                self.cruft()
            }
            Err(_) => match self.unterminated(b, start, line) {
                Some(err) => {
                    self.done = true;
                    tracing::debug!(line, offset = start, "{err}");
                    return Err(err);
                }
                None => {
                    self.input.reset(&checkpoint);
                    self.cruft()
                }
            },
        };

        let end = self.input.current_token_start();
        let text = &self.source[start..end];
        let newlines = text.iter().filter(|&&c| c == b'\n').count();
        self.line = advance_line(self.line, newlines);
        let span = Span::from_range(start, end);

        let lexeme = match scanned {
            Scanned::Trivia => {
                if newlines > 0 {
                    self.at_line_start = true;
                }
                Lexeme::Trivia(span)
            }
            Scanned::Token(mut kind) => {
                self.at_line_start = false;
                if kind == TokenKind::Identifier && self.classify_keywords {
                    if let Some(keyword) = self.grammar.keywords().lookup(text) {
                        kind = TokenKind::Keyword(keyword);
                    }
                }
                Lexeme::Token(Token::new(kind, span, line))
            }
        };
        Ok(Some(lexeme))
    }

    fn scan_step(&mut self, b: u8) -> ModalResult<Scanned> {
        let input = &mut self.input;
        let scanned = match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                whitespace(input)?;
                Scanned::Trivia
            }
            b'/' if input.starts_with(b"//") => {
                line_comment(input)?;
                Scanned::Trivia
            }
            b'/' if input.starts_with(b"/*") => {
                block_comment(input)?;
                Scanned::Trivia
            }
            b'"' => {
                quoted(input, b'"')?;
                Scanned::Token(TokenKind::StringLiteral)
            }
            b'\'' => {
                quoted(input, b'\'')?;
                Scanned::Token(TokenKind::CharLiteral)
            }
            b'#' if self.at_line_start => {
                let text = directive(input)?;
                if text.starts_with(b"#include") {
                    Scanned::Token(TokenKind::Include)
                } else {
                    Scanned::Token(TokenKind::Cruft)
                }
            }
            b'0'..=b'9' => Scanned::Token(number(input)?),
            b'-' if input.starts_with(b"->") => {
                "->".void().parse_next(input)?;
                Scanned::Token(TokenKind::Arrow)
            }
            _ => {
                if let Some(kind) = bracket(b) {
                    any.void().parse_next(input)?;
                    Scanned::Token(kind)
                } else {
                    identifier(input, self.grammar.identifiers())?;
                    Scanned::Token(TokenKind::Identifier)
                }
            }
        };
        Ok(scanned)
    }

    /// Consume one byte as punctuation or cruft.
    fn cruft(&mut self) -> Scanned {
        match any::<_, ContextError>.parse_next(&mut self.input) {
            Ok(b) => Scanned::Token(self.grammar.punctuation().classify(b)),
            Err(_) => Scanned::Trivia,
        }
    }

    fn unterminated(&self, b: u8, start: usize, line: u32) -> Option<LexError> {
        let err = match b {
            b'"' => LexError::unterminated_string(line, Span::at(start)),
            b'\'' => LexError::unterminated_char(line, Span::at(start)),
            b'/' => LexError::unterminated_comment(line, Span::new(start, start + 1)),
            _ => return None,
        };
        Some(err)
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_lexeme() {
                Ok(Some(Lexeme::Token(token))) => return Some(Ok(token)),
                Ok(Some(Lexeme::Trivia(_))) => continue,
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Scan source into the flat token stream, bracket markers included.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn tokenize(source: &[u8], grammar: &Grammar) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, grammar).collect()
}
