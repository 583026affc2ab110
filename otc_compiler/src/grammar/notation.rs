//! Chain notation vocabulary

pub const SEGMENT_SEPARATOR: char = '.';

pub const COLLECTION_NOTATION: &str = "[*]";
pub const MAP_NOTATION: &str = "[*,*]";

pub const MAP_KEY_MARKER: &str = "<K>";
pub const MAP_VALUE_MARKER: &str = "<V>";

pub const ANCHOR: char = '^';
pub const PRE_ANCHOR: &str = "[^*";
pub const POST_ANCHOR: &str = "*^]";

/// Bracket bodies accepted on a collection segment
pub const COLLECTION_WILDCARD: &str = "*";
pub const ANCHOR_BODY: &str = "^";
pub const PRE_ANCHOR_BODY: &str = "^*";
pub const POST_ANCHOR_BODY: &str = "*^";

/// Which side of a map entry a segment addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MapSide {
    Key,
    Value,
}

impl MapSide {
    pub fn marker(&self) -> &'static str {
        match self {
            MapSide::Key => MAP_KEY_MARKER,
            MapSide::Value => MAP_VALUE_MARKER,
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            MAP_KEY_MARKER => Some(MapSide::Key),
            MAP_VALUE_MARKER => Some(MapSide::Value),
            _ => None,
        }
    }

    /// Child key of the synthesized map member, e.g. `<K>tags`
    pub fn member_key(&self, field_name: &str) -> String {
        format!("{}{}", self.marker(), field_name)
    }
}

/// Anchor placement inside a collection bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Anchor {
    /// `[^]`
    Plain,
    /// `[^*]`
    Pre,
    /// `[*^]`
    Post,
}

impl Anchor {
    pub fn from_bracket_body(body: &str) -> Option<Self> {
        match body {
            ANCHOR_BODY => Some(Anchor::Plain),
            PRE_ANCHOR_BODY => Some(Anchor::Pre),
            POST_ANCHOR_BODY => Some(Anchor::Post),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_keys() {
        assert_eq!(MapSide::Key.member_key("tags"), "<K>tags");
        assert_eq!(MapSide::Value.member_key("tags"), "<V>tags");
        assert_eq!(MapSide::from_marker("<V>"), Some(MapSide::Value));
        assert_eq!(MapSide::from_marker("<X>"), None);
    }

    #[test]
    fn test_anchor_bodies() {
        assert_eq!(Anchor::from_bracket_body("^*"), Some(Anchor::Pre));
        assert_eq!(Anchor::from_bracket_body("*^"), Some(Anchor::Post));
        assert_eq!(Anchor::from_bracket_body("^"), Some(Anchor::Plain));
        assert_eq!(Anchor::from_bracket_body("*"), None);
    }
}
