//! Turning raw search input into the terms a predicate matches on.

use crate::config::FilterMethod;
use crate::params::TextOrList;
use std::fmt;

/// Token shown between the words of an `all_in_order` term: any text may appear there.
pub const WILDCARD: &str = "%";

/// Escape character of generated LIKE patterns. Needs no quoting in any SQL dialect.
pub const LIKE_ESCAPE: char = '!';

/// A single search term.
///
/// Most terms are one literal segment. Terms built for `all_in_order` hold one segment
/// per word and match when every segment appears, in order, with anything in between.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    segments: Vec<String>,
}

impl Term {
    /// A literal term matched as one substring.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
        }
    }

    /// A term whose words must appear in order, with arbitrary text in between.
    #[must_use]
    pub fn gapped(words: Vec<String>) -> Self {
        Self { segments: words }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(String::is_empty)
    }

    /// Lower-cased LIKE pattern with wildcards in the input escaped: `%seg1%seg2%`.
    #[must_use]
    pub fn like_pattern(&self) -> String {
        let inner = self
            .segments
            .iter()
            .map(|segment| escape_like_wildcards(&segment.to_lowercase()))
            .collect::<Vec<_>>()
            .join(WILDCARD);
        format!("{WILDCARD}{inner}{WILDCARD}")
    }

    /// Case-insensitive containment, honoring segment order.
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        let haystack = haystack.to_lowercase();
        let mut rest = haystack.as_str();
        for segment in &self.segments {
            let needle = segment.to_lowercase();
            match rest.find(&needle) {
                Some(at) => rest = &rest[at + needle.len()..],
                None => return false,
            }
        }
        true
    }

    /// Cut every segment to at most `max_chars` characters. Returns true if anything
    /// was cut.
    pub(crate) fn truncate(&mut self, max_chars: usize) -> bool {
        let mut truncated = false;
        for segment in &mut self.segments {
            if let Some((cut, _)) = segment.char_indices().nth(max_chars) {
                segment.truncate(cut);
                truncated = true;
            }
        }
        truncated
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(WILDCARD))
    }
}

impl PartialEq<str> for Term {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Term {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

/// Escape LIKE wildcards so user input only ever matches literally.
/// Escapes: the escape character first, then % and _
pub(crate) fn escape_like_wildcards(input: &str) -> String {
    input
        .replace(LIKE_ESCAPE, "!!")
        .replace('%', "!%")
        .replace('_', "!_")
}

/// Normalize raw terms for the given method.
///
/// - `exact`: one term; a list is joined with single spaces
/// - `all_in_order`: one gapped term made of every word, in order
/// - `any` / `all`: one term per word (string) or per element (list)
///
/// Blank input yields no terms.
#[must_use]
pub fn normalize(raw: &TextOrList, method: FilterMethod) -> Vec<Term> {
    match method {
        FilterMethod::Exact => {
            let phrase = raw.joined();
            let phrase = phrase.trim();
            if phrase.is_empty() {
                Vec::new()
            } else {
                vec![Term::literal(phrase)]
            }
        }
        FilterMethod::AllInOrder => {
            let words = raw.split_words();
            if words.is_empty() {
                Vec::new()
            } else {
                vec![Term::gapped(words)]
            }
        }
        FilterMethod::Any | FilterMethod::All => raw.words().into_iter().map(Term::literal).collect(),
    }
}
