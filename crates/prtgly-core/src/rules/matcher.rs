// ── Rule matching ──
//
// Each rule carries compiled patterns; matching is a pure function of
// (entity, rule). The match kind is a closed set resolved once at load
// time, so evaluation never re-parses a pattern.

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::model::{ContentType, Entity};

/// How a pattern string is compared against an attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchKind {
    /// Whole-string, case-sensitive equality.
    Exact,
    /// Case-sensitive prefix.
    Prefix,
    /// Shell-style glob (`*`, `?`, `[...]`, `{a,b}`).
    #[default]
    Glob,
}

/// A compiled pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    Exact(String),
    Prefix(String),
    Glob(GlobMatcher),
}

impl Pattern {
    pub fn compile(kind: MatchKind, raw: &str) -> Result<Self, globset::Error> {
        Ok(match kind {
            MatchKind::Exact => Self::Exact(raw.to_owned()),
            MatchKind::Prefix => Self::Prefix(raw.to_owned()),
            MatchKind::Glob => Self::Glob(Glob::new(raw)?.compile_matcher()),
        })
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Exact(p) => value == p,
            Self::Prefix(p) => value.starts_with(p.as_str()),
            Self::Glob(g) => g.is_match(value),
        }
    }

    /// The pattern as written in the rule file.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(p) | Self::Prefix(p) => p,
            Self::Glob(g) => g.glob().glob(),
        }
    }
}

/// Predicate over an entity's simple attributes.
///
/// All present parts must match: the name pattern, the optional content
/// type, and every extra attribute pattern.
#[derive(Debug, Clone)]
pub struct MatchCriteria {
    pub kind: MatchKind,
    pub name: Pattern,
    pub content_type: Option<ContentType>,
    pub attributes: Vec<(String, Pattern)>,
}

impl MatchCriteria {
    pub fn matches(&self, entity: &Entity) -> bool {
        if self.content_type.is_some_and(|ct| ct != entity.content_type) {
            return false;
        }
        if !self.name.is_match(&entity.name) {
            return false;
        }
        self.attributes.iter().all(|(attr, pattern)| {
            entity
                .attribute(attr)
                .is_some_and(|value| pattern.is_match(&value))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::PropertyValue;

    fn criteria(kind: MatchKind, name: &str) -> MatchCriteria {
        MatchCriteria {
            kind,
            name: Pattern::compile(kind, name).unwrap(),
            content_type: None,
            attributes: Vec::new(),
        }
    }

    fn sw1() -> Entity {
        Entity::new(2, ContentType::Device, "SW1")
            .with_property("host", PropertyValue::Scalar("10.0.0.2".into()))
    }

    #[test]
    fn exact_is_whole_string_and_case_sensitive() {
        assert!(criteria(MatchKind::Exact, "SW1").matches(&sw1()));
        assert!(!criteria(MatchKind::Exact, "SW").matches(&sw1()));
        assert!(!criteria(MatchKind::Exact, "sw1").matches(&sw1()));
    }

    #[test]
    fn prefix_matches_leading_text() {
        assert!(criteria(MatchKind::Prefix, "SW").matches(&sw1()));
        assert!(!criteria(MatchKind::Prefix, "W1").matches(&sw1()));
    }

    #[test]
    fn glob_supports_wildcards() {
        assert!(criteria(MatchKind::Glob, "SW*").matches(&sw1()));
        assert!(criteria(MatchKind::Glob, "S?1").matches(&sw1()));
        assert!(criteria(MatchKind::Glob, "{RT,SW}[0-9]").matches(&sw1()));
        assert!(!criteria(MatchKind::Glob, "RT*").matches(&sw1()));
    }

    #[test]
    fn content_type_filter_applies() {
        let mut c = criteria(MatchKind::Glob, "*");
        c.content_type = Some(ContentType::Sensor);
        assert!(!c.matches(&sw1()));
        c.content_type = Some(ContentType::Device);
        assert!(c.matches(&sw1()));
    }

    #[test]
    fn attribute_patterns_must_all_match() {
        let mut c = criteria(MatchKind::Glob, "SW*");
        c.attributes
            .push(("host".into(), Pattern::compile(MatchKind::Glob, "10.0.*").unwrap()));
        assert!(c.matches(&sw1()));

        c.attributes
            .push(("probe".into(), Pattern::compile(MatchKind::Glob, "*").unwrap()));
        assert!(!c.matches(&sw1()), "missing attribute never matches");
    }

    #[test]
    fn pattern_keeps_source_text() {
        assert_eq!(Pattern::compile(MatchKind::Glob, "SW*").unwrap().as_str(), "SW*");
    }
}
