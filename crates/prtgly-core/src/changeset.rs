// ── Change-set generation ──
//
// Runs every rule over every selected entity, writes the intended values
// into the store, and collects one remote update per (object, property)
// whose value actually moved. Local state reflects intent as soon as the
// change set exists, before anything is sent.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::EngineConfig;
use crate::model::{ContentSelector, ContentType, ObjectId, PropertyValue};
use crate::reconcile::ValueReconciler;
use crate::rules::Rule;
use crate::store::EntityStore;

// ── Queries ─────────────────────────────────────────────────────────

/// Payload of a property-set request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyChange {
    pub object_id: ObjectId,
    pub property_name: String,
    pub property_value: String,
}

/// A single requested remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum Query {
    /// List every object of a content type.
    Table { content: ContentType },
    /// Server status.
    #[serde(rename = "getstatus")]
    Status,
    /// Set one property on one object.
    #[serde(rename = "setobjectproperty")]
    SetObjectProperty(PropertyChange),
}

impl Query {
    pub fn set_property(
        object_id: ObjectId,
        property_name: impl Into<String>,
        property_value: impl Into<String>,
    ) -> Self {
        Self::SetObjectProperty(PropertyChange {
            object_id,
            property_name: property_name.into(),
            property_value: property_value.into(),
        })
    }

    /// API endpoint this query targets.
    pub fn target(&self) -> &'static str {
        match self {
            Self::Table { .. } => "table.json",
            Self::Status => "getstatus.htm",
            Self::SetObjectProperty(_) => "setobjectproperty.htm",
        }
    }

    pub fn as_property_change(&self) -> Option<&PropertyChange> {
        match self {
            Self::SetObjectProperty(change) => Some(change),
            _ => None,
        }
    }
}

/// Endpoint plus encoded parameters. Credentials are never part of it.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params = form_urlencoded::Serializer::new(String::new());
        match self {
            Self::Table { content } => {
                params.append_pair("content", content.table_name());
            }
            Self::Status => {
                params.append_pair("id", "0");
            }
            Self::SetObjectProperty(change) => {
                params
                    .append_pair("id", &change.object_id.to_string())
                    .append_pair("name", &change.property_name)
                    .append_pair("value", &change.property_value);
            }
        }
        write!(f, "{}?{}", self.target(), params.finish())
    }
}

// ── Change set ──────────────────────────────────────────────────────

/// Deduplicated remote updates produced by one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    queries: Vec<Query>,
    /// Number of (entity, rule) pairs that matched.
    pub matches: usize,
    /// Number of entities with at least one changed property.
    pub entities_changed: usize,
}

impl ChangeSet {
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.queries.iter()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Pending change for one (object, property) pair.
    pub fn get(&self, object_id: ObjectId, property: &str) -> Option<&PropertyChange> {
        self.queries
            .iter()
            .filter_map(Query::as_property_change)
            .find(|c| c.object_id == object_id && c.property_name == property)
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Query;
    type IntoIter = std::slice::Iter<'a, Query>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Drives matching and reconciliation over the store.
pub struct ChangeSetBuilder<'a> {
    store: &'a mut EntityStore,
    config: &'a EngineConfig,
}

impl<'a> ChangeSetBuilder<'a> {
    pub fn new(store: &'a mut EntityStore, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Apply `rules`, in declared order, to every selected entity.
    ///
    /// Content types are processed root first so children reconcile
    /// against their parent's intended value. When several rules hit the
    /// same (object, property) the last one wins; a pair yields a query
    /// only if its final value differs from the loaded one.
    pub fn build(&mut self, selector: ContentSelector, rules: &[Rule]) -> ChangeSet {
        let mut change_set = ChangeSet::default();
        // (id, property) -> value before this pass, in first-touch order.
        let mut touched: IndexMap<(ObjectId, String), Option<PropertyValue>> = IndexMap::new();

        for content_type in selector.content_types() {
            for (id, matched) in self.match_rules(*content_type, rules) {
                change_set.matches += matched.len();
                for rule in matched {
                    self.apply_rule(id, rule, &mut touched);
                }
            }
        }

        let mut changed_ids: Vec<ObjectId> = Vec::new();
        for ((id, property), original) in touched {
            let Ok(entity) = self.store.get_by_id(id) else {
                continue;
            };
            let current = entity.property(&property).map(PropertyValue::render);
            let before = original.as_ref().map(PropertyValue::render);
            if current.as_deref().unwrap_or_default() == before.as_deref().unwrap_or_default() {
                continue;
            }
            change_set.queries.push(Query::set_property(
                id,
                property,
                current.unwrap_or_default(),
            ));
            if !changed_ids.contains(&id) {
                changed_ids.push(id);
            }
        }

        for id in &changed_ids {
            if let Err(e) = self.store.mark_dirty(*id) {
                warn!(id, error = %e, "changed entity left the store before marking");
            }
        }
        change_set.entities_changed = changed_ids.len();

        info!(
            selection = %selector,
            matches = change_set.matches,
            queries = change_set.len(),
            entities = change_set.entities_changed,
            "change set built"
        );
        change_set
    }

    /// Pair each entity of a content type with the rules matching it,
    /// evaluated against the loaded attributes.
    fn match_rules<'r>(
        &self,
        content_type: ContentType,
        rules: &'r [Rule],
    ) -> Vec<(ObjectId, Vec<&'r Rule>)> {
        self.store
            .get_by_content_type(content_type)
            .into_iter()
            .filter_map(|entity| {
                let matched: Vec<&Rule> = rules.iter().filter(|r| r.matches(entity)).collect();
                (!matched.is_empty()).then_some((entity.id, matched))
            })
            .collect()
    }

    fn apply_rule(
        &mut self,
        id: ObjectId,
        rule: &Rule,
        touched: &mut IndexMap<(ObjectId, String), Option<PropertyValue>>,
    ) {
        let Ok(entity) = self.store.get_by_id(id) else {
            return;
        };
        let reconciled = ValueReconciler::new(self.store, &self.config.schema).reconcile(entity, rule);
        let original = entity.property(&rule.property).cloned();

        touched
            .entry((id, rule.property.clone()))
            .or_insert(original);

        if let Ok(entity) = self.store.get_by_id_mut(id) {
            debug!(id, property = rule.property.as_str(), "writing intended value");
            entity
                .properties
                .insert(rule.property.clone(), reconciled.into_property_value());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Entity;
    use crate::rules::parse_rules;

    fn tags(values: &[&str]) -> PropertyValue {
        PropertyValue::List(values.iter().map(|s| (*s).to_owned()).collect())
    }

    fn rules(yaml: &str) -> Vec<Rule> {
        parse_rules(yaml, "test").unwrap()
    }

    /// NET (group 1, tags core) > SW1 (device 2, tags edge).
    fn network() -> EntityStore {
        let mut store = EntityStore::new();
        store.put(
            Entity::new(1, ContentType::Group, "NET").with_property("tags", tags(&["core"])),
            false,
        );
        store.put(
            Entity::new(2, ContentType::Device, "SW1")
                .with_parent(1)
                .with_property("tags", tags(&["edge"])),
            false,
        );
        store
    }

    const SW_RULE: &str = r#"
rules:
  - name: "SW*"
    prop: tags
    value: [core, mgmt]
    update: true
"#;

    #[test]
    fn end_to_end_inheritance() {
        let mut store = network();
        let config = EngineConfig::default();
        let cs = ChangeSetBuilder::new(&mut store, &config)
            .build(ContentType::Device.into(), &rules(SW_RULE));

        assert_eq!(cs.queries(), &[Query::set_property(2, "tags", "edge mgmt")]);
        assert_eq!(cs.entities_changed, 1);

        let sw1 = store.get_by_id(2).unwrap();
        assert!(sw1.dirty);
        assert_eq!(sw1.property("tags"), Some(&tags(&["edge", "mgmt"])));
        assert!(!store.get_by_id(1).unwrap().dirty);
    }

    #[test]
    fn second_run_is_empty() {
        let mut store = network();
        let config = EngineConfig::default();
        let rs = rules(SW_RULE);

        let first = ChangeSetBuilder::new(&mut store, &config).build(ContentSelector::All, &rs);
        assert_eq!(first.len(), 1);

        let second = ChangeSetBuilder::new(&mut store, &config).build(ContentSelector::All, &rs);
        assert!(second.is_empty());
        assert_eq!(second.matches, 1);
    }

    #[test]
    fn last_matching_rule_wins() {
        let mut store = network();
        let config = EngineConfig::default();
        let rs = rules(
            r#"
rules:
  - { name: "SW*", prop: tags, value: [r1] }
  - { name: "SW1", match: exact, prop: tags, value: [r2] }
  - { name: "SW*", prop: location, value: [lab] }
"#,
        );

        let cs = ChangeSetBuilder::new(&mut store, &config).build(ContentType::Device.into(), &rs);

        assert_eq!(cs.matches, 3);
        assert_eq!(
            cs.queries(),
            &[
                Query::set_property(2, "tags", "r2"),
                Query::set_property(2, "location", "lab"),
            ]
        );
        assert_eq!(cs.get(2, "tags").unwrap().property_value, "r2");
    }

    #[test]
    fn many_rules_one_query() {
        let mut store = network();
        let config = EngineConfig::default();
        let rs = rules(
            r#"
rules:
  - { name: "SW*", prop: tags, value: [a], update: true }
  - { name: "SW*", prop: tags, value: [b], update: true }
  - { name: "*1", prop: tags, value: [c], update: true }
"#,
        );

        let cs = ChangeSetBuilder::new(&mut store, &config).build(ContentType::Device.into(), &rs);
        assert_eq!(cs.queries(), &[Query::set_property(2, "tags", "edge a b c")]);
    }

    #[test]
    fn repeated_local_tag_is_not_rewritten() {
        let mut store = network();
        store.put(
            Entity::new(2, ContentType::Device, "SW1")
                .with_parent(1)
                .with_property("tags", tags(&["edge", "edge"])),
            false,
        );
        let config = EngineConfig::default();
        let rs = rules("rules:\n  - { name: SW1, prop: tags, value: [core], update: true }\n");

        let cs = ChangeSetBuilder::new(&mut store, &config).build(ContentType::Device.into(), &rs);
        assert!(cs.is_empty());
        assert!(!store.get_by_id(2).unwrap().dirty);
    }

    #[test]
    fn unchanged_value_yields_no_query_and_stays_clean() {
        let mut store = network();
        let config = EngineConfig::default();
        let rs = rules("rules:\n  - { name: SW1, prop: tags, value: [edge] }\n");

        let cs = ChangeSetBuilder::new(&mut store, &config).build(ContentType::Device.into(), &rs);
        assert!(cs.is_empty());
        assert_eq!(cs.matches, 1);
        assert!(!store.get_by_id(2).unwrap().dirty);
    }

    #[test]
    fn orphan_reconciles_without_parent() {
        let mut store = EntityStore::new();
        store.put(
            Entity::new(2, ContentType::Device, "SW1")
                .with_parent(77)
                .with_property("tags", tags(&["edge"])),
            false,
        );
        let config = EngineConfig::default();

        let cs = ChangeSetBuilder::new(&mut store, &config)
            .build(ContentType::Device.into(), &rules(SW_RULE));
        assert_eq!(cs.queries(), &[Query::set_property(2, "tags", "edge core mgmt")]);
    }

    #[test]
    fn children_see_parent_intended_value() {
        let mut store = network();
        let config = EngineConfig::default();
        let rs = rules(
            r#"
rules:
  - { name: NET, type: group, prop: tags, value: [core, mgmt], update: true }
  - { name: "SW*", type: device, prop: tags, value: [mgmt], update: true }
"#,
        );

        let cs = ChangeSetBuilder::new(&mut store, &config).build(ContentSelector::All, &rs);
        assert_eq!(cs.queries(), &[Query::set_property(1, "tags", "core mgmt")]);
    }

    #[test]
    fn only_selected_content_is_touched() {
        let mut store = network();
        let config = EngineConfig::default();
        let rs = rules("rules:\n  - { name: '*', prop: priority, value: ['4'] }\n");

        let cs = ChangeSetBuilder::new(&mut store, &config).build(ContentType::Group.into(), &rs);
        assert_eq!(cs.queries(), &[Query::set_property(1, "priority", "4")]);
        assert!(store.get_by_id(2).unwrap().property("priority").is_none());
    }

    #[test]
    fn query_display_is_url_encoded() {
        insta::assert_snapshot!(
            Query::set_property(2, "tags", "edge mgmt").to_string(),
            @"setobjectproperty.htm?id=2&name=tags&value=edge+mgmt"
        );
        insta::assert_snapshot!(
            Query::Table { content: ContentType::Sensor }.to_string(),
            @"table.json?content=sensors"
        );
        assert_eq!(Query::Status.to_string(), "getstatus.htm?id=0");
    }

    #[test]
    fn query_serializes_with_target_tag() {
        let json = serde_json::to_value(Query::set_property(2, "tags", "a")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "target": "setobjectproperty",
                "object_id": 2,
                "property_name": "tags",
                "property_value": "a"
            })
        );
    }
}
