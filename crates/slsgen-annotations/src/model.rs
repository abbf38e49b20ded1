//! Annotation table types.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A positional annotation value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// A value parsed from the argument text.
    Literal(Value),
    /// The decorated parameter, for parameter-level annotations.
    Parameter(ParameterBinding),
}

impl AnnotationValue {
    /// Render a scalar literal as text. Strings are returned as-is.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AnnotationValue::Literal(Value::String(s)) => Some(s.clone()),
            AnnotationValue::Literal(Value::Null) => None,
            AnnotationValue::Literal(Value::Array(_) | Value::Object(_)) => None,
            AnnotationValue::Literal(other) => Some(other.to_string()),
            AnnotationValue::Parameter(_) => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterBinding> {
        match self {
            AnnotationValue::Parameter(binding) => Some(binding),
            AnnotationValue::Literal(_) => None,
        }
    }
}

/// Name and resolved type of a decorated parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterBinding {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One physical annotation application.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnnotationOccurrence {
    pub values: Vec<AnnotationValue>,
    /// Chained segments, keyed by segment name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, AnnotationOccurrence>,
}

impl AnnotationOccurrence {
    pub fn new(values: Vec<AnnotationValue>) -> Self {
        Self {
            values,
            children: BTreeMap::new(),
        }
    }

    pub fn value(&self, index: usize) -> Option<&AnnotationValue> {
        self.values.get(index)
    }

    /// Positional value `index` rendered as text.
    pub fn text(&self, index: usize) -> Option<String> {
        self.value(index).and_then(AnnotationValue::as_text)
    }

    /// The parameter binding carried by a parameter-level occurrence.
    pub fn parameter(&self) -> Option<&ParameterBinding> {
        self.values.first().and_then(AnnotationValue::as_parameter)
    }

    pub fn child(&self, name: &str) -> Option<&AnnotationOccurrence> {
        self.children.get(name)
    }
}

/// Annotation name to occurrences, in first-seen order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationTable {
    entries: Vec<(String, Vec<AnnotationOccurrence>)>,
}

impl AnnotationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an occurrence, keeping the name's first-seen position.
    pub fn push(&mut self, name: &str, occurrence: AnnotationOccurrence) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, occurrences)) => occurrences.push(occurrence),
            None => self.entries.push((name.to_string(), vec![occurrence])),
        }
    }

    /// All occurrences of an annotation; empty when absent.
    pub fn get(&self, name: &str) -> &[AnnotationOccurrence] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, occurrences)| occurrences.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> Option<&AnnotationOccurrence> {
        self.get(name).first()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AnnotationOccurrence])> {
        self.entries
            .iter()
            .map(|(n, occurrences)| (n.as_str(), occurrences.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AnnotationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, occurrences) in &self.entries {
            map.serialize_entry(name, occurrences)?;
        }
        map.end()
    }
}
