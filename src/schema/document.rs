// Parsed schema documents
//
// Schema documents are JSON Schema-like definitions resolved by URI. A
// parsed document exposes exactly what the node model needs: the
// required-field set, the declared property order, per-field sub-schemas,
// key patterns and enumerations. `allOf` entries and `$ref` references are
// resolved through the loader and merged into the referencing document.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde_json::Value as JsonValue;

use crate::internal::error::{Error, Result};
use crate::schema::store::SchemaStore;

/// The sub-schema governing a single property.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFragment {
    description: Option<String>,
    raw: JsonValue,
}

impl SchemaFragment {
    fn from_json(json: &JsonValue) -> Self {
        let description = json
            .get("description")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        Self {
            description,
            raw: json.clone(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn raw(&self) -> &JsonValue {
        &self.raw
    }
}

/// A parsed schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    uri: String,
    title: Option<String>,
    description: Option<String>,
    properties: BTreeMap<String, SchemaFragment>,
    required: BTreeSet<String>,
    property_order: Vec<String>,
    pattern_properties: Vec<String>,
    enum_values: Vec<String>,
}

impl SchemaDocument {
    fn empty(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            title: None,
            description: None,
            properties: BTreeMap::new(),
            required: BTreeSet::new(),
            property_order: Vec::new(),
            pattern_properties: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    /// Parses a JSON schema definition, resolving `$ref` and `allOf`
    /// through the given store. `seen` guards against circular references.
    pub(crate) fn parse(
        uri: &str,
        json: &JsonValue,
        store: &SchemaStore,
        seen: &mut HashSet<String>,
    ) -> Result<Self> {
        let mut doc = SchemaDocument::empty(uri);
        doc.absorb_json(json, store, seen)?;
        Ok(doc)
    }

    fn absorb_json(
        &mut self,
        json: &JsonValue,
        store: &SchemaStore,
        seen: &mut HashSet<String>,
    ) -> Result<()> {
        let obj = match json {
            JsonValue::Object(obj) => obj,
            _ => {
                return Err(Error::SchemaError(format!(
                    "schema document '{}' must be a JSON object",
                    self.uri
                )))
            }
        };

        if let Some(JsonValue::String(title)) = obj.get("title") {
            self.title = Some(title.clone());
        }
        if let Some(JsonValue::String(desc)) = obj.get("description") {
            self.description = Some(desc.clone());
        }

        // A `$ref` pulls the whole referenced document in.
        if let Some(JsonValue::String(reference)) = obj.get("$ref") {
            let referenced = store.load_guarded(reference, seen)?;
            self.absorb(&referenced);
        }

        // Every `allOf` entry merges into the referencing document.
        if let Some(JsonValue::Array(entries)) = obj.get("allOf") {
            for entry in entries {
                self.absorb_json(entry, store, seen)?;
            }
        }

        // `anyOf` branches contribute enumerations only.
        if let Some(JsonValue::Array(branches)) = obj.get("anyOf") {
            for branch in branches {
                if let Some(JsonValue::Array(values)) = branch.get("enum") {
                    self.collect_enum_values(values);
                }
            }
        }

        if let Some(JsonValue::Object(props)) = obj.get("properties") {
            for (name, sub) in props {
                self.properties
                    .insert(name.clone(), SchemaFragment::from_json(sub));
            }
        }

        if let Some(JsonValue::Array(names)) = obj.get("required") {
            for name in names {
                if let JsonValue::String(name) = name {
                    self.required.insert(name.clone());
                }
            }
        }

        if let Some(JsonValue::Array(names)) = obj.get("propertyOrder") {
            for name in names {
                if let JsonValue::String(name) = name {
                    if !self.property_order.iter().any(|n| n == name) {
                        self.property_order.push(name.clone());
                    }
                }
            }
        }

        if let Some(JsonValue::Object(patterns)) = obj.get("patternProperties") {
            for pattern in patterns.keys() {
                if !self.pattern_properties.iter().any(|p| p == pattern) {
                    self.pattern_properties.push(pattern.clone());
                }
            }
        }

        if let Some(JsonValue::Array(values)) = obj.get("enum") {
            self.collect_enum_values(values);
        }

        Ok(())
    }

    fn collect_enum_values(&mut self, values: &[JsonValue]) {
        for value in values {
            if let JsonValue::String(value) = value {
                if !self.enum_values.iter().any(|v| v == value) {
                    self.enum_values.push(value.clone());
                }
            }
        }
    }

    /// Merges an already-parsed document (a `$ref` target) into this one.
    fn absorb(&mut self, other: &SchemaDocument) {
        for (name, fragment) in &other.properties {
            self.properties.insert(name.clone(), fragment.clone());
        }
        self.required.extend(other.required.iter().cloned());
        for name in &other.property_order {
            if !self.property_order.iter().any(|n| n == name) {
                self.property_order.push(name.clone());
            }
        }
        for pattern in &other.pattern_properties {
            if !self.pattern_properties.iter().any(|p| p == pattern) {
                self.pattern_properties.push(pattern.clone());
            }
        }
        for value in &other.enum_values {
            if !self.enum_values.iter().any(|v| v == value) {
                self.enum_values.push(value.clone());
            }
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The sub-schema for a named property, if declared.
    pub fn fragment(&self, name: &str) -> Option<&SchemaFragment> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, SchemaFragment> {
        &self.properties
    }

    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    pub fn property_order(&self) -> &[String] {
        &self.property_order
    }

    pub fn pattern_properties(&self) -> &[String] {
        &self.pattern_properties
    }

    pub fn enum_values(&self) -> &[String] {
        &self.enum_values
    }

    /// Re-parses a property fragment as a nested document. This is how an
    /// implied node resolves its effective schema: the sub-schema of its
    /// container's schema at the containing property.
    pub fn sub_document(&self, property: &str) -> Result<SchemaDocument> {
        let fragment = self.properties.get(property).ok_or_else(|| {
            Error::SchemaError(format!(
                "schema '{}' declares no property '{}'",
                self.uri, property
            ))
        })?;
        let uri = format!("{}#{}", self.uri, property);
        SchemaDocument::parse(
            &uri,
            &fragment.raw,
            SchemaStore::global(),
            &mut HashSet::new(),
        )
    }
}
