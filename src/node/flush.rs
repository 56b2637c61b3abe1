// Flush state machine
//
// Flushing forces materialization of a selected field subset so that
// required data exists before a document leaves the process. The options
// form a strict subset lattice: NONE ⊂ REQUIRED ⊆ ALL ⊂ EXTRA. Every
// serialization entry point performs at least a REQUIRED flush first.

use std::sync::Arc;

use crate::internal::error::{Error, Result};
use crate::node::coerce::coerce;
use crate::node::object::ObjectNode;
use crate::tree::Value;

/// Which field subset a flush materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOption {
    /// Materialize nothing.
    None,
    /// Materialize missing schema-required fields.
    Required,
    /// Materialize every formally declared field.
    All,
    /// Materialize declared and extension fields.
    Extra,
}

impl ObjectNode {
    /// Materializes every selected field not already present, returning
    /// the names synthesized by this call. With `warn`, each synthesized
    /// field is reported once per call; with `recurse`, object-node values
    /// in the backing store are flushed with the same option. Termination
    /// is guaranteed because the implied containment graph is acyclic.
    pub fn flush(&mut self, option: FlushOption, warn: bool, recurse: bool) -> Result<Vec<String>> {
        let ty = Arc::clone(&self.ty);
        let mut synthesized = Vec::new();
        for name in self.selected_field_names(option)? {
            if self.store.contains_key(&name) {
                continue;
            }
            let field = ty.field(&name).ok_or_else(|| {
                Error::SchemaError(format!(
                    "schema-required field '{}' has no declaration on '{}'",
                    name,
                    ty.name()
                ))
            })?;
            let value = coerce(self.synthesize_default(field), field.signature())?;
            self.store.insert(name.clone(), value);
            if warn {
                tracing::warn!(
                    node = ty.name(),
                    field = name.as_str(),
                    "flush synthesized a default value"
                );
            }
            synthesized.push(name);
        }
        if recurse {
            for value in self.store.values_mut() {
                flush_nested(value, option, warn)?;
            }
        }
        Ok(synthesized)
    }

    fn selected_field_names(&self, option: FlushOption) -> Result<Vec<String>> {
        match option {
            FlushOption::None => Ok(Vec::new()),
            FlushOption::Required => Ok(self.schema()?.required().iter().cloned().collect()),
            FlushOption::All => Ok(self
                .ty
                .defined_fields()
                .iter()
                .map(|f| f.name().to_string())
                .collect()),
            FlushOption::Extra => Ok(self
                .ty
                .defined_fields()
                .iter()
                .chain(self.ty.extra_fields().iter())
                .map(|f| f.name().to_string())
                .collect()),
        }
    }
}

/// Flushes every object node reachable inside a stored value.
fn flush_nested(value: &mut Value, option: FlushOption, warn: bool) -> Result<()> {
    match value {
        Value::Object(node) => {
            node.flush(option, warn, true)?;
        }
        Value::Sequence(seq) => {
            for item in &mut seq.items {
                flush_nested(item, option, warn)?;
            }
        }
        Value::List(items) => {
            for item in items {
                flush_nested(item, option, warn)?;
            }
        }
        Value::Mapping(map) => {
            for entry in map.values_mut() {
                flush_nested(entry, option, warn)?;
            }
        }
        _ => {}
    }
    Ok(())
}
