use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::scanner::token::{BracketKind, Span};

// ============= Scan errors (with miette diagnostics) =============

/// A fatal scan failure. Every variant carries the 1-based line it refers to.
#[derive(Error, Debug, Diagnostic)]
pub enum LexError {
    #[error("line {line}: mismatched bracket: expected {}, found {found}", describe(.expected))]
    #[diagnostic(code(cr::mismatched_bracket))]
    MismatchedBracket {
        line: u32,
        /// Kind of the innermost open bracket; `None` when nothing was open.
        expected: Option<BracketKind>,
        found: BracketKind,
        #[label("closed here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("line {line}: missing closing bracket at end of source")]
    #[diagnostic(code(cr::unclosed_bracket), help("this bracket is never closed"))]
    UnclosedBracket {
        line: u32,
        #[label("opened here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("line {line}: unterminated block comment")]
    #[diagnostic(code(cr::unterminated_comment))]
    UnterminatedComment {
        line: u32,
        #[label("comment starts here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("line {line}: unterminated string literal")]
    #[diagnostic(code(cr::unterminated_string))]
    UnterminatedString {
        line: u32,
        #[label("string starts here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("line {line}: unterminated character literal")]
    #[diagnostic(code(cr::unterminated_char))]
    UnterminatedChar {
        line: u32,
        #[label("literal starts here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

fn describe(expected: &Option<BracketKind>) -> String {
    match expected {
        Some(kind) => kind.to_string(),
        None => "none".to_string(),
    }
}

fn no_source() -> NamedSource<String> {
    NamedSource::new("input", String::new())
}

impl LexError {
    pub fn mismatched_bracket(
        line: u32,
        expected: Option<BracketKind>,
        found: BracketKind,
        at: Span,
    ) -> Self {
        Self::MismatchedBracket {
            line,
            expected,
            found,
            span: at.into(),
            src: no_source(),
        }
    }

    pub fn unclosed_bracket(line: u32, at: Span) -> Self {
        Self::UnclosedBracket {
            line,
            span: at.into(),
            src: no_source(),
        }
    }

    pub fn unterminated_comment(line: u32, at: Span) -> Self {
        Self::UnterminatedComment {
            line,
            span: at.into(),
            src: no_source(),
        }
    }

    pub fn unterminated_string(line: u32, at: Span) -> Self {
        Self::UnterminatedString {
            line,
            span: at.into(),
            src: no_source(),
        }
    }

    pub fn unterminated_char(line: u32, at: Span) -> Self {
        Self::UnterminatedChar {
            line,
            span: at.into(),
            src: no_source(),
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Self::MismatchedBracket { line, .. }
            | Self::UnclosedBracket { line, .. }
            | Self::UnterminatedComment { line, .. }
            | Self::UnterminatedString { line, .. }
            | Self::UnterminatedChar { line, .. } => *line,
        }
    }

    /// Structural errors come from bracket nesting, the rest from literals
    /// and comments.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MismatchedBracket { .. } | Self::UnclosedBracket { .. }
        )
    }

    /// Attach source code for fancy miette diagnostics
    pub fn with_source_code(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let named = NamedSource::new(name.into(), source.into());
        match &mut self {
            Self::MismatchedBracket { src, .. }
            | Self::UnclosedBracket { src, .. }
            | Self::UnterminatedComment { src, .. }
            | Self::UnterminatedString { src, .. }
            | Self::UnterminatedChar { src, .. } => *src = named,
        }
        self
    }
}

// ============= Configuration errors =============

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid grammar configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("keyword '{spelling}' is not in the base grammar")]
    UnknownKeyword { spelling: String },

    #[error("'{spelling}' cannot be used as named punctuation")]
    Punctuation { spelling: String },
}

// ============= Tests =============
