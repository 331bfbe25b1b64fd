//! DataPath parsing and formatting.
//!
//! Grammar:
//!   [root.]segment(.segment)*
//! - the leading `root` token is a fixed marker and is stripped when at least
//!   one segment follows it
//! - segments are separated by '.', must be non-empty and contain no whitespace
//!   Examples:
//!   "root.joint1"       -> segments=["joint1"]
//!   "root.arm.j3"       -> segments=["arm", "j3"]
//!   "arm.j3"            -> segments=["arm", "j3"]
//!   "root"              -> segments=["root"]
//!
//! Resolution against a snapshot is done by [`crate::resolve`]; this module only
//! deals with the textual form.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Constant token that data paths in rule tables begin with.
pub const ROOT_TOKEN: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty data path")]
    Empty,
    #[error("invalid data path '{0}': empty segment")]
    EmptySegment(String),
    #[error("invalid data path '{0}': segment contains whitespace")]
    Whitespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    /// Ordered segments, root token excluded.
    segments: Vec<String>,
}

impl DataPath {
    /// Construct from already-split segments (no validation beyond non-emptiness).
    pub fn from_segments(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { segments })
    }

    /// Parse a path string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let mut parts: Vec<&str> = s.split('.').collect();
        if parts.iter().any(|seg| seg.is_empty()) {
            return Err(PathError::EmptySegment(s.to_string()));
        }
        if parts.iter().any(|seg| seg.chars().any(char::is_whitespace)) {
            return Err(PathError::Whitespace(s.to_string()));
        }
        if parts.len() > 1 && parts[0] == ROOT_TOKEN {
            parts.remove(0);
        }
        Ok(Self {
            segments: parts.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The dot-joined form without the root token (the flat telemetry key).
    pub fn key(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", ROOT_TOKEN, self.segments.join("."))
    }
}

impl FromStr for DataPath {
    type Err = PathError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataPath::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for DataPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D>(deserializer: D) -> Result<DataPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DataPath::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_root_token() {
        let p = DataPath::parse("root.arm.j3").unwrap();
        assert_eq!(p.segments(), &["arm".to_string(), "j3".to_string()]);
        assert_eq!(p.key(), "arm.j3");
        assert_eq!(p.to_string(), "root.arm.j3");
    }

    #[test]
    fn parse_without_root_token() {
        let p = DataPath::parse("joint1").unwrap();
        assert_eq!(p.segments(), &["joint1".to_string()]);
        assert_eq!(p.to_string(), "root.joint1");
    }

    #[test]
    fn lone_root_is_a_segment() {
        let p = DataPath::parse("root").unwrap();
        assert_eq!(p.key(), "root");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(DataPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            DataPath::parse("root..j1"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            DataPath::parse("root.j1."),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            DataPath::parse("root.joint 1"),
            Err(PathError::Whitespace(_))
        ));
    }

    #[test]
    fn serde_uses_string_form() {
        let p: DataPath = serde_json::from_str("\"root.a.b\"").unwrap();
        assert_eq!(p.key(), "a.b");
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"root.a.b\"");
        assert!(serde_json::from_str::<DataPath>("\"a..b\"").is_err());
    }
}
