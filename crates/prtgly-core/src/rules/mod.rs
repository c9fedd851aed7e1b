// ── Declarative property rules ──
//
// Rules are loaded once per run from a YAML document:
//
//   rules:
//     - name: "SW*"          # pattern matched against the entity name
//       match: glob          # exact | prefix | glob (default)
//       type: device         # optional content-type filter
//       attributes:          # optional extra attribute patterns
//         host: "10.0.*"
//       prop: tags           # property to set
//       value: [core, mgmt]  # sequence or single string, may be absent
//       update: true         # merge into the current list instead of replacing
//
// Records are validated up front so a broken rule fails the run before
// any entity is touched.

mod matcher;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{ContentType, Entity};

pub use matcher::{MatchCriteria, MatchKind, Pattern};

/// One rule: when `criteria` match, set `property` from `value`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub criteria: MatchCriteria,
    pub property: String,
    pub value: Vec<String>,
    /// Merge mode (`true`) vs. replace mode (`false`).
    pub update: bool,
}

impl Rule {
    pub fn matches(&self, entity: &Entity) -> bool {
        self.criteria.matches(entity)
    }
}

// ── Serialized form ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    name: Option<String>,
    #[serde(rename = "match", default)]
    kind: MatchKind,
    #[serde(rename = "type")]
    content_type: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    prop: Option<String>,
    value: Option<RawValue>,
    #[serde(default)]
    update: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    One(String),
    Many(Vec<String>),
}

impl RawRule {
    fn into_rule(self, index: usize) -> Result<Rule, CoreError> {
        let malformed = |reason: String| CoreError::MalformedRule { index, reason };

        let property = self
            .prop
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| malformed("missing 'prop'".into()))?;
        let name = self
            .name
            .ok_or_else(|| malformed("missing 'name' pattern".into()))?;

        let compile = |raw: &str| {
            Pattern::compile(self.kind, raw)
                .map_err(|e| malformed(format!("invalid {} pattern {raw:?}: {e}", self.kind)))
        };

        let name = compile(&name)?;
        let content_type = self
            .content_type
            .map(|raw| {
                raw.parse::<ContentType>()
                    .map_err(|_| malformed(format!("unknown type {raw:?}")))
            })
            .transpose()?;
        let attributes = self
            .attributes
            .iter()
            .map(|(attr, raw)| -> Result<(String, Pattern), CoreError> {
                Ok((attr.clone(), compile(raw)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let value = match self.value {
            None => Vec::new(),
            Some(RawValue::One(v)) => vec![v],
            Some(RawValue::Many(vs)) => vs,
        };

        Ok(Rule {
            criteria: MatchCriteria {
                kind: self.kind,
                name,
                content_type,
                attributes,
            },
            property,
            value,
            update: self.update,
        })
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Parse and validate a YAML rule document.
///
/// `origin` names the source in error messages.
pub fn parse_rules(yaml: &str, origin: &str) -> Result<Vec<Rule>, CoreError> {
    let file: RuleFile = serde_yaml::from_str(yaml).map_err(|e| CoreError::RuleFile {
        path: origin.to_owned(),
        reason: e.to_string(),
    })?;

    let rules = file
        .rules
        .into_iter()
        .enumerate()
        .map(|(index, raw)| raw.into_rule(index))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = rules.len(), origin, "rules loaded");
    Ok(rules)
}

/// Read, parse and validate a rule file.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, CoreError> {
    let yaml = std::fs::read_to_string(path).map_err(|e| CoreError::RuleFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_rules(&yaml, &path.display().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RULES: &str = r#"
rules:
  - name: "SW*"
    prop: tags
    value: [core, mgmt]
    update: true
  - name: "core-"
    match: prefix
    type: group
    prop: priority
    value: "5"
  - name: "RT1"
    match: exact
    attributes:
      host: "10.0.0.1"
    prop: comments
"#;

    #[test]
    fn parses_all_record_shapes() {
        let rules = parse_rules(RULES, "inline").unwrap();
        assert_eq!(rules.len(), 3);

        assert_eq!(rules[0].property, "tags");
        assert_eq!(rules[0].value, vec!["core", "mgmt"]);
        assert!(rules[0].update);
        assert_eq!(rules[0].criteria.kind, MatchKind::Glob);

        assert_eq!(rules[1].criteria.kind, MatchKind::Prefix);
        assert_eq!(rules[1].criteria.content_type, Some(ContentType::Group));
        assert_eq!(rules[1].value, vec!["5"]);
        assert!(!rules[1].update);

        assert_eq!(rules[2].criteria.attributes.len(), 1);
        assert!(rules[2].value.is_empty());
    }

    #[test]
    fn missing_prop_is_malformed() {
        let err = parse_rules("rules:\n  - name: x\n    value: [a]\n", "inline").unwrap_err();
        assert!(
            matches!(err, CoreError::MalformedRule { index: 0, ref reason } if reason.contains("prop")),
            "got {err:?}"
        );
    }

    #[test]
    fn missing_name_is_malformed() {
        let err = parse_rules("rules:\n  - prop: tags\n  - name: x\n", "inline").unwrap_err();
        assert!(matches!(err, CoreError::MalformedRule { index: 0, .. }), "got {err:?}");
    }

    #[test]
    fn invalid_glob_is_malformed() {
        let err = parse_rules("rules:\n  - name: \"[SW\"\n    prop: tags\n", "inline").unwrap_err();
        assert!(matches!(err, CoreError::MalformedRule { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_type_is_malformed() {
        let yaml = "rules:\n  - name: x\n    type: router\n    prop: tags\n";
        let err = parse_rules(yaml, "inline").unwrap_err();
        assert!(matches!(err, CoreError::MalformedRule { .. }), "got {err:?}");
    }

    #[test]
    fn invalid_yaml_names_origin() {
        let err = parse_rules("rules: [", "rules.yaml").unwrap_err();
        assert!(
            matches!(err, CoreError::RuleFile { ref path, .. } if path == "rules.yaml"),
            "got {err:?}"
        );
    }

    #[test]
    fn load_rules_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, RULES).unwrap();
        assert_eq!(load_rules(&path).unwrap().len(), 3);
        assert!(matches!(
            load_rules(&dir.path().join("missing.yaml")),
            Err(CoreError::RuleFile { .. })
        ));
    }
}
