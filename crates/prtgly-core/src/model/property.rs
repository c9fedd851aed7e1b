use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Value of a single entity property.
///
/// Whether a property is a list is decided when the entity is loaded
/// (see [`PropertySchema`]) and carried with the value from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(String),
    List(Vec<String>),
}

impl PropertyValue {
    /// Build a list value from a whitespace-delimited string.
    pub fn list_from_delimited(raw: &str) -> Self {
        Self::List(raw.split_whitespace().map(str::to_owned).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Individual tokens of the value. Scalars are split on whitespace.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) => s.split_whitespace().map(str::to_owned).collect(),
            Self::List(items) => items.clone(),
        }
    }

    /// Storage representation: lists are space-joined.
    pub fn render(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::List(items) => items.join(" "),
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

/// Names of list-typed properties.
///
/// PRTG exposes list properties (tags) as one space-delimited string;
/// everything not named here is treated as a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    list_properties: BTreeSet<String>,
}

impl PropertySchema {
    pub fn new<I, S>(list_properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            list_properties: list_properties.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_list(&self, property: &str) -> bool {
        self.list_properties.contains(property)
    }

    /// Type a raw string value according to the schema.
    pub fn value_for(&self, property: &str, raw: &str) -> PropertyValue {
        if self.is_list(property) {
            PropertyValue::list_from_delimited(raw)
        } else {
            PropertyValue::Scalar(raw.to_owned())
        }
    }
}

impl Default for PropertySchema {
    fn default() -> Self {
        Self::new(["tags"])
    }
}
