// Deterministic ordering and dotted-path flattening
//
// The backing store is unordered; serialization order comes from the
// schema. Keys iterate in five classes: the schema's explicit property
// order, remaining schema-required fields, remaining declared fields,
// remaining extension fields, then leftover foreign keys, the last four
// alphabetical. A key is yielded exactly once.

use std::collections::BTreeSet;

use crate::internal::error::Result;
use crate::node::object::ObjectNode;
use crate::node::sequence::SequenceNode;
use crate::tree::Value;

impl ObjectNode {
    /// The backing-store keys in deterministic serialization order.
    pub fn ordered_keys(&self) -> Result<Vec<String>> {
        let schema = self.schema()?;
        let mut remaining: BTreeSet<&str> = self.store.keys().map(String::as_str).collect();
        let mut out: Vec<String> = Vec::new();

        for name in schema.property_order() {
            if remaining.remove(name.as_str()) {
                out.push(name.clone());
            }
        }
        for name in schema.required() {
            if remaining.remove(name.as_str()) {
                out.push(name.clone());
            }
        }
        let mut declared: Vec<&str> = self
            .ty
            .defined_fields()
            .iter()
            .map(|f| f.name())
            .collect();
        declared.sort_unstable();
        for name in declared {
            if remaining.remove(name) {
                out.push(name.to_string());
            }
        }
        let mut extension: Vec<&str> = self.ty.extra_fields().iter().map(|f| f.name()).collect();
        extension.sort_unstable();
        for name in extension {
            if remaining.remove(name) {
                out.push(name.to_string());
            }
        }
        // Leftover foreign keys, alphabetical by BTreeSet order.
        out.extend(remaining.into_iter().map(str::to_string));
        Ok(out)
    }

    /// The stored (key, value) pairs in deterministic order. Repeated
    /// calls on an unmutated node yield identical sequences.
    pub fn node_items(&self) -> Result<Vec<(String, &Value)>> {
        let mut items = Vec::with_capacity(self.store.len());
        for key in self.ordered_keys()? {
            if let Some(value) = self.store.get(&key) {
                items.push((key, value));
            }
        }
        Ok(items)
    }

    /// Flattens the node down to scalar leaves under dotted-path keys.
    pub fn flatten(&self) -> Result<Vec<(String, Value)>> {
        let mut out = Vec::new();
        for (key, value) in self.node_items()? {
            flatten_value(&key, value, &mut out)?;
        }
        Ok(out)
    }
}

impl SequenceNode {
    /// Flattens the sequence down to scalar leaves under dotted-path keys,
    /// elements by index.
    pub fn flatten(&self) -> Result<Vec<(String, Value)>> {
        let mut out = Vec::new();
        for (index, item) in self.items().iter().enumerate() {
            flatten_value(&index.to_string(), item, &mut out)?;
        }
        Ok(out)
    }
}

/// Walks object nodes (in schema order), sequence nodes and raw lists (by
/// index) and raw mappings (sorted, since they carry no schema order) down
/// to scalar leaves.
pub(crate) fn flatten_value(
    prefix: &str,
    value: &Value,
    out: &mut Vec<(String, Value)>,
) -> Result<()> {
    match value {
        Value::Object(node) => {
            for (key, nested) in node.node_items()? {
                flatten_value(&join(prefix, &key), nested, out)?;
            }
        }
        Value::Sequence(seq) => {
            for (index, item) in seq.items().iter().enumerate() {
                flatten_value(&join(prefix, &index.to_string()), item, out)?;
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(&join(prefix, &index.to_string()), item, out)?;
            }
        }
        Value::Mapping(map) => {
            for (key, nested) in map {
                flatten_value(&join(prefix, key), nested, out)?;
            }
        }
        Value::Scalar(scalar) => {
            out.push((prefix.to_string(), scalar.value().clone()));
        }
        leaf => {
            out.push((prefix.to_string(), leaf.clone()));
        }
    }
    Ok(())
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
