// ── Value reconciliation ──
//
// Computes the value a rule assigns to a matched entity. List-typed
// properties in merge mode inherit from the parent: anything the parent
// already carries is not restated on the child, while values the child
// added on its own are kept. Re-running on the result is a no-op.

use tracing::debug;

use crate::model::{Entity, PropertySchema, PropertyValue};
use crate::rules::Rule;
use crate::store::{EntityStore, NotFoundError};

/// Result of reconciling one rule against one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Storage representation, trimmed; lists are space-joined.
    pub value: String,
    /// Whether the property is list-typed.
    pub list: bool,
}

impl Reconciled {
    pub fn into_property_value(self) -> PropertyValue {
        if self.list {
            PropertyValue::list_from_delimited(&self.value)
        } else {
            PropertyValue::Scalar(self.value)
        }
    }
}

/// Reads parents from the store to compute new property values.
pub struct ValueReconciler<'a> {
    store: &'a EntityStore,
    schema: &'a PropertySchema,
}

impl<'a> ValueReconciler<'a> {
    pub fn new(store: &'a EntityStore, schema: &'a PropertySchema) -> Self {
        Self { store, schema }
    }

    /// New value of `rule.property` for `entity`.
    pub fn reconcile(&self, entity: &Entity, rule: &Rule) -> Reconciled {
        let list = self.is_list_property(entity, &rule.property);

        let value = if rule.update && list {
            let parent = self.parent_value(entity, &rule.property);
            let current = entity
                .property(&rule.property)
                .map(PropertyValue::tokens)
                .unwrap_or_default();
            merge(&current, &parent, &rule.value)
        } else {
            replace(&rule.value)
        };

        debug!(
            id = entity.id,
            property = rule.property.as_str(),
            value = value.as_str(),
            "reconciled"
        );
        Reconciled { value, list }
    }

    /// The parent's value for `property`, or empty when there is no parent,
    /// the parent is not cached, or it lacks the property.
    pub fn parent_value(&self, entity: &Entity, property: &str) -> Vec<String> {
        let Some(parent_id) = entity.parent_id else {
            return Vec::new();
        };

        match self.store.get_by_id(parent_id) {
            Ok(parent) => parent
                .property(property)
                .map(PropertyValue::tokens)
                .unwrap_or_default(),
            Err(NotFoundError { id }) => {
                debug!(id = entity.id, parent = id, "parent not cached, nothing inherited");
                Vec::new()
            }
        }
    }

    fn is_list_property(&self, entity: &Entity, property: &str) -> bool {
        self.schema.is_list(property) || entity.property(property).is_some_and(PropertyValue::is_list)
    }
}

/// Merge mode: keep locally added values as they are, drop what the
/// parent supplies, append rule values that are new to both.
pub fn merge(current: &[String], parent: &[String], rule_value: &[String]) -> String {
    let mut merged: Vec<&str> = current
        .iter()
        .filter(|value| !parent.contains(value))
        .map(String::as_str)
        .collect();

    for value in rule_value {
        if !parent.contains(value) && !merged.contains(&value.as_str()) {
            merged.push(value);
        }
    }

    merged.join(" ").trim().to_owned()
}

/// Replace mode: the rule's values, space-joined.
pub fn replace(rule_value: &[String]) -> String {
    rule_value.join(" ").trim().to_owned()
}
