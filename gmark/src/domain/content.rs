// gmark/src/domain/content.rs
use crate::domain::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content lives in physically separate collections; a content id is only
/// unique together with the collection it comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Items,
    AutoItems,
}

impl ContentSource {
    pub const ALL: [ContentSource; 2] = [ContentSource::Items, ContentSource::AutoItems];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Items => "items",
            ContentSource::AutoItems => "auto_items",
        }
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "items" => Ok(ContentSource::Items),
            "auto_items" => Ok(ContentSource::AutoItems),
            other => Err(DomainError::InvalidContentSource(format!(
                "'{}' (expected one of: items, auto_items)",
                other
            ))),
        }
    }
}

/// A pointer to one content item: `(content_id, source)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentRef {
    pub content_id: i64,
    pub source: ContentSource,
}

impl ContentRef {
    pub fn new(content_id: i64, source: ContentSource) -> Self {
        Self { content_id, source }
    }

    /// Key used in batch status maps: `"<contentId>-<source>"`.
    pub fn status_key(&self) -> String {
        format!("{}-{}", self.content_id, self.source)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_id, self.source)
    }
}

/// Parses `"<contentId>:<source>"`, the command line form.
impl FromStr for ContentRef {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let (id, source) = s.split_once(':').ok_or_else(|| {
            DomainError::InvalidContentRef(format!("'{}' (expected <contentId>:<source>)", s))
        })?;
        let content_id = id
            .trim()
            .parse::<i64>()
            .map_err(|e| DomainError::InvalidContentRef(format!("'{}': {}", id, e)))?;
        Ok(Self::new(content_id, source.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_key_format() {
        let content = ContentRef::new(1001, ContentSource::Items);
        assert_eq!(content.status_key(), "1001-items");
        assert_eq!(
            ContentRef::new(7, ContentSource::AutoItems).status_key(),
            "7-auto_items"
        );
    }

    #[test]
    fn test_parse_content_source() {
        assert_eq!("items".parse::<ContentSource>().unwrap(), ContentSource::Items);
        assert_eq!(
            " auto_items ".parse::<ContentSource>().unwrap(),
            ContentSource::AutoItems
        );
        assert!("videos".parse::<ContentSource>().is_err());
    }

    #[test]
    fn test_parse_content_ref() {
        let content: ContentRef = "1002:items".parse().unwrap();
        assert_eq!(content, ContentRef::new(1002, ContentSource::Items));

        assert!("1002".parse::<ContentRef>().is_err());
        assert!("abc:items".parse::<ContentRef>().is_err());
        assert!("1:unknown".parse::<ContentRef>().is_err());
    }

    #[test]
    fn test_source_serializes_as_snake_case() {
        let json = serde_json::to_string(&ContentSource::AutoItems).unwrap();
        assert_eq!(json, "\"auto_items\"");
    }
}
