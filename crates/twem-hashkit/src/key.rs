//! Key construction and hash-tag extraction.

use std::fmt;
use std::str::FromStr;

use crate::error::HashkitError;

/// The delimiter pair marking the hashed part of a key, e.g. `{` and `}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashTag {
    /// Opening delimiter.
    pub start: char,
    /// Closing delimiter.
    pub stop: char,
}

impl HashTag {
    /// Create a tag from its two delimiters. They may be equal.
    pub fn new(start: char, stop: char) -> Self {
        Self { start, stop }
    }

    /// Parse a two-character tag such as `"{}"` or `"||"`.
    pub fn parse(s: &str) -> Result<Self, HashkitError> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(start), Some(stop), None) => Ok(Self { start, stop }),
            _ => Err(HashkitError::InvalidHashTag(s.to_string())),
        }
    }
}

impl Default for HashTag {
    fn default() -> Self {
        Self::new('{', '}')
    }
}

impl FromStr for HashTag {
    type Err = HashkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HashTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start, self.stop)
    }
}

/// Builds and parses `type:{id}` keys for one hash tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCodec {
    tag: HashTag,
}

impl KeyCodec {
    /// Create a codec for the given tag.
    pub fn new(tag: HashTag) -> Self {
        Self { tag }
    }

    /// Return the tag this codec uses.
    pub fn hash_tag(&self) -> HashTag {
        self.tag
    }

    /// Build `"{key_type}:{start}{key_id}{stop}"`.
    ///
    /// Neither part is inspected; any application string is accepted.
    pub fn build_key(&self, key_type: &str, key_id: &str) -> String {
        format!("{key_type}:{}{key_id}{}", self.tag.start, self.tag.stop)
    }

    /// Return the identifier used for hashing `key`.
    ///
    /// This is the text between the first `start` delimiter and the first
    /// `stop` delimiter after it. Keys without such a span hash as a whole.
    /// With equal delimiters the first two occurrences bound the span.
    pub fn key_id<'a>(&self, key: &'a str) -> &'a str {
        let Some(open) = key.find(self.tag.start) else {
            return key;
        };
        let rest = &key[open + self.tag.start.len_utf8()..];
        match rest.find(self.tag.stop) {
            Some(close) => &rest[..close],
            None => key,
        }
    }
}
