use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ContentType, PropertyValue};

/// Object id assigned by PRTG.
pub type ObjectId = u64;

/// One monitored object: a group, device, or sensor.
///
/// `parent_id` is a lookup key into the `EntityStore`, not an owning
/// pointer; root groups have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: ObjectId,
    pub parent_id: Option<ObjectId>,
    pub content_type: ContentType,
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
    /// Set when reconciliation changed a property since the last load.
    #[serde(default)]
    pub dirty: bool,
}

impl Entity {
    pub fn new(id: ObjectId, content_type: ContentType, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            content_type,
            name: name.into(),
            properties: BTreeMap::new(),
            dirty: false,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: ObjectId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Resolve a simple attribute by name for rule matching.
    ///
    /// Built-in fields (`name`, `objid`, `parentid`, `type`) come first,
    /// then properties in their rendered form.
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "name" => Some(Cow::Borrowed(self.name.as_str())),
            "objid" | "id" => Some(Cow::Owned(self.id.to_string())),
            "parentid" => self.parent_id.map(|p| Cow::Owned(p.to_string())),
            "type" => Some(Cow::Owned(self.content_type.to_string())),
            _ => self.properties.get(name).map(|v| match v {
                PropertyValue::Scalar(s) => Cow::Borrowed(s.as_str()),
                PropertyValue::List(_) => Cow::Owned(v.render()),
            }),
        }
    }

    /// Flatten into display columns. Bookkeeping fields are left out.
    pub fn to_row(&self) -> BTreeMap<String, String> {
        let mut row: BTreeMap<String, String> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.render()))
            .collect();
        row.insert("objid".into(), self.id.to_string());
        row.insert("type".into(), self.content_type.to_string());
        row.insert("name".into(), self.name.clone());
        if let Some(parent) = self.parent_id {
            row.insert("parentid".into(), parent.to_string());
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch() -> Entity {
        Entity::new(2, ContentType::Device, "SW1")
            .with_parent(1)
            .with_property("tags", PropertyValue::List(vec!["edge".into(), "lab".into()]))
            .with_property("host", PropertyValue::Scalar("10.0.0.2".into()))
    }

    #[test]
    fn attribute_resolves_builtins_and_properties() {
        let e = switch();
        assert_eq!(e.attribute("name").as_deref(), Some("SW1"));
        assert_eq!(e.attribute("parentid").as_deref(), Some("1"));
        assert_eq!(e.attribute("type").as_deref(), Some("device"));
        assert_eq!(e.attribute("tags").as_deref(), Some("edge lab"));
        assert_eq!(e.attribute("host").as_deref(), Some("10.0.0.2"));
        assert_eq!(e.attribute("missing"), None);
    }

    #[test]
    fn row_excludes_dirty_flag() {
        let mut e = switch();
        e.dirty = true;
        let row = e.to_row();
        assert_eq!(
            row.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["host", "name", "objid", "parentid", "tags", "type"]
        );
        assert_eq!(row["tags"], "edge lab");
    }
}
