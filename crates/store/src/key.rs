//! Key grammar of the in-memory store.
//!
//! ```text
//! key       = [ segment { delimiter segment } ] [ "[@" attribute "]" ]
//! segment   = name [ "(" index ")" ]
//! ```
//!
//! An empty key addresses the node of the handle itself; `[@name]` alone addresses one of its
//! attributes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::StoreError;

static ATTRIBUTE_SUFFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<path>.*?)\[@(?P<attr>[^\[\]]+)\]$").expect("attribute suffix regex compiles"));
static SEGMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>[^()\[\]]+?)(?:\((?P<index>\d+)\))?$").expect("segment regex compiles"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct KeyExpr {
    pub segments: Vec<Segment>,
    pub attribute: Option<String>,
}

impl KeyExpr {
    pub fn parse(key: &str, delimiter: &str) -> Result<Self, StoreError> {
        let key = key.trim();
        let (path, attribute) = match ATTRIBUTE_SUFFIX_REGEX.captures(key) {
            Some(captures) => (
                captures.name("path").map_or("", |m| m.as_str()),
                captures.name("attr").map(|m| m.as_str().to_string()),
            ),
            None => (key, None),
        };

        if path.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
                attribute,
            });
        }

        let segments = path
            .split(delimiter)
            .map(|raw| parse_segment(key, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments, attribute })
    }

    /// The key with its last segment removed, along with that segment.
    pub fn split_last(&self) -> Option<(&[Segment], &Segment)> {
        self.segments.split_last().map(|(last, parents)| (parents, last))
    }
}

fn parse_segment(key: &str, raw: &str) -> Result<Segment, StoreError> {
    if raw.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "empty segment".into(),
        });
    }
    let captures = SEGMENT_REGEX.captures(raw).ok_or_else(|| StoreError::InvalidKey {
        key: key.to_string(),
        reason: format!("malformed segment '{raw}'"),
    })?;
    let name = captures.name("name").map_or("", |m| m.as_str()).to_string();
    let index = match captures.name("index") {
        Some(index) => Some(index.as_str().parse::<usize>().map_err(|err| StoreError::InvalidKey {
            key: key.to_string(),
            reason: err.to_string(),
        })?),
        None => None,
    };
    Ok(Segment { name, index })
}
