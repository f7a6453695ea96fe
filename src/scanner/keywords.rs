//! Reserved words and the spelling table that maps identifiers onto them.
//!
//! `Keyword` is the closed set of reserved words known to any grammar
//! revision. Which of them are live, and how they are spelled, is decided by
//! a [`KeywordTable`] so that revisions can add or drop words without the
//! scanner changing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    #[strum(serialize = "coroutine")]
    Coroutine,
    #[strum(serialize = "endvars")]
    Endvars,
    #[strum(serialize = "call")]
    Call,
    #[strum(serialize = "wait")]
    Wait,
    #[strum(serialize = "@who")]
    Who,
    #[strum(serialize = "@tag")]
    Tag,
    #[strum(serialize = "@err")]
    Err,
    #[strum(serialize = "return")]
    Return,
    #[strum(serialize = "struct")]
    Struct,
    #[strum(serialize = "tcpsocket_init")]
    TcpsocketInit,
    #[strum(serialize = "cancel")]
    Cancel,
    #[strum(serialize = "cancelall")]
    Cancelall,
    #[strum(serialize = "typedef")]
    Typedef,
    #[strum(serialize = "typeof")]
    Typeof,
    #[strum(serialize = "out")]
    Out,
}

impl Keyword {
    /// The spelling the keyword has in every shipped grammar revision.
    pub fn spelling(self) -> &'static str {
        self.into()
    }
}

/// Exact, case-sensitive mapping from identifier spelling to keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    entries: HashMap<Box<[u8]>, Keyword>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding each keyword under its canonical spelling.
    pub fn from_keywords(keywords: impl IntoIterator<Item = Keyword>) -> Self {
        let mut table = Self::new();
        for keyword in keywords {
            table.insert(keyword.spelling(), keyword);
        }
        table
    }

    pub fn insert(&mut self, spelling: &str, keyword: Keyword) -> Option<Keyword> {
        self.entries
            .insert(spelling.as_bytes().to_vec().into_boxed_slice(), keyword)
    }

    pub fn remove(&mut self, spelling: &str) -> Option<Keyword> {
        self.entries.remove(spelling.as_bytes())
    }

    pub fn lookup(&self, ident: &[u8]) -> Option<Keyword> {
        self.entries.get(ident).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spellings in the table, sorted for stable output.
    pub fn spellings(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .entries
            .keys()
            .map(|k| String::from_utf8_lossy(k).into_owned())
            .collect();
        out.sort();
        out
    }
}

impl FromIterator<(&'static str, Keyword)> for KeywordTable {
    fn from_iter<T: IntoIterator<Item = (&'static str, Keyword)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (spelling, keyword) in iter {
            table.insert(spelling, keyword);
        }
        table
    }
}
