pub mod error;
pub mod printer;
pub mod scanner;

// Re-export the entry points and error types for convenience
pub use error::{ConfigError, LexError};
pub use scanner::grammar::{Grammar, GrammarVersion};
pub use scanner::token::{BracketKind, GroupNode, Span, Token, TokenKind, TokenTree};
pub use scanner::{scan_identifiers, scan_identifiers_with, tokenize_tree};
