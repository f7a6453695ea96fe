//! Per-revision scanner configuration.
//!
//! A [`Grammar`] is built once and then only read: scans borrow it, so one
//! value can serve any number of concurrent scans.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scanner::keywords::{Keyword, KeywordTable};
use crate::scanner::token::TokenKind;

/// Punctuation that may be promoted from `Cruft` to a named token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum Punctuation {
    Colon,
    Semicolon,
    Comma,
    Eq,
    Dot,
}

impl Punctuation {
    pub fn token_kind(self) -> TokenKind {
        match self {
            Self::Colon => TokenKind::Colon,
            Self::Semicolon => TokenKind::Semicolon,
            Self::Comma => TokenKind::Comma,
            Self::Eq => TokenKind::Eq,
            Self::Dot => TokenKind::Dot,
        }
    }
}

/// Bytes that start some other rule and so can never carry named punctuation.
const RESERVED_PUNCTUATION: &[u8] = b"()[]{}\"'#/_@$";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PunctuationTable {
    entries: HashMap<u8, Punctuation>,
}

impl PunctuationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, byte: u8, punct: Punctuation) -> Result<(), ConfigError> {
        if !byte.is_ascii_punctuation() || RESERVED_PUNCTUATION.contains(&byte) {
            return Err(ConfigError::Punctuation {
                spelling: (byte as char).to_string(),
            });
        }
        self.entries.insert(byte, punct);
        Ok(())
    }

    pub fn remove(&mut self, byte: u8) -> Option<Punctuation> {
        self.entries.remove(&byte)
    }

    /// Token kind for a single punctuation byte; unmapped bytes are `Cruft`.
    pub fn classify(&self, byte: u8) -> TokenKind {
        self.entries
            .get(&byte)
            .map_or(TokenKind::Cruft, |p| p.token_kind())
    }
}

/// Which bytes may appear in identifiers beyond `[A-Za-z0-9_]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierRules {
    /// `@` may start an identifier (`@who`, `@tag`, `@err`).
    pub at_prefix: bool,
    /// `$` may start or appear inside an identifier.
    pub dollar: bool,
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self {
            at_prefix: true,
            dollar: false,
        }
    }
}

impl IdentifierRules {
    /// First byte after an optional `@` prefix.
    pub fn is_start(&self, b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_' || (self.dollar && b == b'$')
    }

    pub fn is_continue(&self, b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || (self.dollar && b == b'$')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GrammarVersion {
    /// First revision: `tcpsocket_init` is reserved and `:` is a named token.
    Classic,
    /// Adds cancellation and type keywords, drops `tcpsocket_init`, and
    /// leaves `:` as cruft.
    #[default]
    Modern,
}

impl GrammarVersion {
    pub fn keywords(self) -> &'static [Keyword] {
        use Keyword::*;
        match self {
            Self::Classic => &[
                Coroutine,
                Endvars,
                Call,
                Wait,
                Who,
                Tag,
                Err,
                Return,
                Struct,
                TcpsocketInit,
            ],
            Self::Modern => &[
                Coroutine, Endvars, Call, Wait, Who, Tag, Err, Return, Struct, Cancel, Cancelall,
                Typedef, Typeof, Out,
            ],
        }
    }

    pub fn punctuation(self) -> &'static [(u8, Punctuation)] {
        match self {
            Self::Classic => &[
                (b':', Punctuation::Colon),
                (b';', Punctuation::Semicolon),
                (b',', Punctuation::Comma),
                (b'=', Punctuation::Eq),
                (b'.', Punctuation::Dot),
            ],
            Self::Modern => &[
                (b';', Punctuation::Semicolon),
                (b',', Punctuation::Comma),
                (b'=', Punctuation::Eq),
                (b'.', Punctuation::Dot),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    version: GrammarVersion,
    keywords: KeywordTable,
    punctuation: PunctuationTable,
    identifiers: IdentifierRules,
}

static DEFAULT_GRAMMAR: LazyLock<Grammar> = LazyLock::new(Grammar::default);

impl Default for Grammar {
    fn default() -> Self {
        Self::new(GrammarVersion::default())
    }
}

impl Grammar {
    pub fn new(version: GrammarVersion) -> Self {
        let mut punctuation = PunctuationTable::new();
        for &(byte, punct) in version.punctuation() {
            punctuation.entries.insert(byte, punct);
        }
        Self {
            version,
            keywords: KeywordTable::from_keywords(version.keywords().iter().copied()),
            punctuation,
            identifiers: IdentifierRules::default(),
        }
    }

    /// Process-wide default grammar, built on first use.
    pub fn shared() -> &'static Grammar {
        &DEFAULT_GRAMMAR
    }

    pub fn with_keyword(mut self, spelling: &str, keyword: Keyword) -> Self {
        self.keywords.insert(spelling, keyword);
        self
    }

    pub fn without_keyword(mut self, spelling: &str) -> Self {
        self.keywords.remove(spelling);
        self
    }

    pub fn with_punctuation(mut self, byte: u8, punct: Punctuation) -> Result<Self, ConfigError> {
        self.punctuation.insert(byte, punct)?;
        Ok(self)
    }

    pub fn without_punctuation(mut self, byte: u8) -> Self {
        self.punctuation.remove(byte);
        self
    }

    pub fn allow_dollar(mut self, allow: bool) -> Self {
        self.identifiers.dollar = allow;
        self
    }

    pub fn allow_at_prefix(mut self, allow: bool) -> Self {
        self.identifiers.at_prefix = allow;
        self
    }

    pub fn version(&self) -> GrammarVersion {
        self.version
    }

    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    pub fn punctuation(&self) -> &PunctuationTable {
        &self.punctuation
    }

    pub fn identifiers(&self) -> IdentifierRules {
        self.identifiers
    }

    /// Build a grammar from its JSON description.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GrammarConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn from_config(config: GrammarConfig) -> Result<Self, ConfigError> {
        let mut grammar = Self::new(config.base);
        for spelling in &config.remove_keywords {
            if grammar.keywords.remove(spelling).is_none() {
                return Err(ConfigError::UnknownKeyword {
                    spelling: spelling.clone(),
                });
            }
        }
        for (spelling, keyword) in &config.keywords {
            grammar.keywords.insert(spelling, *keyword);
        }
        for spelling in &config.remove_punctuation {
            let byte = single_byte(spelling)?;
            grammar.punctuation.remove(byte);
        }
        for (spelling, punct) in &config.punctuation {
            grammar.punctuation.insert(single_byte(spelling)?, *punct)?;
        }
        if let Some(dollar) = config.allow_dollar {
            grammar.identifiers.dollar = dollar;
        }
        if let Some(at_prefix) = config.allow_at_prefix {
            grammar.identifiers.at_prefix = at_prefix;
        }
        Ok(grammar)
    }
}

fn single_byte(spelling: &str) -> Result<u8, ConfigError> {
    match spelling.as_bytes() {
        [b] => Ok(*b),
        _ => Err(ConfigError::Punctuation {
            spelling: spelling.to_string(),
        }),
    }
}

/// Serialized form of a [`Grammar`]: a base revision plus adjustments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrammarConfig {
    pub base: GrammarVersion,
    /// Extra or respelled keywords, spelling to keyword name.
    pub keywords: BTreeMap<String, Keyword>,
    pub remove_keywords: Vec<String>,
    pub punctuation: BTreeMap<String, Punctuation>,
    pub remove_punctuation: Vec<String>,
    pub allow_dollar: Option<bool>,
    pub allow_at_prefix: Option<bool>,
}
