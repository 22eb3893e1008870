//! Typed field values and the record that grows as wizard steps are accepted.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use serde::Serialize;

use crate::validation::Schema;

/// Raw, as-typed form input keyed by field name.
pub type RawInput = BTreeMap<String, String>;

pub fn raw<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> RawInput {
    pairs
        .into_iter()
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Output of a successful validation: only the fields the schema declares,
/// coerced to their typed form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedStep {
    fields: BTreeMap<String, FieldValue>,
}

impl ValidatedStep {
    pub(crate) fn insert(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccumulatedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl AccumulatedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(fields: impl IntoIterator<Item = (String, FieldValue)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Returns a new record with `step`'s fields layered over this one.
    pub fn merged(&self, step: &ValidatedStep) -> Self {
        let mut fields = self.fields.clone();
        for (field, value) in step.iter() {
            fields.insert(field.to_string(), value.clone());
        }
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Display form of a field, empty when unset.
    pub fn text(&self, field: &str) -> String {
        self.fields
            .get(field)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Previously accepted values for the fields `schema` declares.
    pub fn prefill(&self, schema: &Schema) -> RawInput {
        schema
            .field_names()
            .filter_map(|field| {
                self.fields
                    .get(field)
                    .map(|value| (field.to_string(), value.to_string()))
            })
            .collect()
    }
}
