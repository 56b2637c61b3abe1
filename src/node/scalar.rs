// Scalar nodes
//
// A scalar node wraps a single primitive for enumerated-scalar classes.
// The wrapper carries the class so that tag selection and enum validation
// work without structural inference.

use std::fmt;
use std::sync::Arc;

use crate::internal::error::{Error, Result};
use crate::node::types::NodeType;
use crate::schema::{SchemaDocument, SchemaStore};
use crate::tree::Value;

/// A typed scalar wrapper.
#[derive(Clone)]
pub struct ScalarNode {
    pub(crate) ty: Arc<NodeType>,
    pub(crate) tag: Option<String>,
    pub(crate) value: Box<Value>,
}

impl ScalarNode {
    /// Wraps a primitive under the class-default tag.
    pub fn new(ty: &Arc<NodeType>, value: Value) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag: ty.latest_tag().map(str::to_string),
            value: Box::new(value),
        }
    }

    pub(crate) fn from_parts(ty: &Arc<NodeType>, tag: Option<String>, value: Value) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag,
            value: Box::new(value),
        }
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.ty
    }

    /// The instance tag the scalar was created or read under.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.tag = Some(tag.to_string());
    }

    /// The underlying primitive.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = Box::new(value.into());
    }

    pub fn into_value(self) -> Value {
        *self.value
    }

    /// The schema governing this instance: the one paired with its own
    /// tag when present, the class default otherwise.
    pub fn schema(&self) -> Result<Arc<SchemaDocument>> {
        let uri = self
            .tag
            .as_deref()
            .and_then(|tag| self.ty.schema_for_tag(tag))
            .or_else(|| self.ty.default_schema())
            .ok_or_else(|| {
                Error::SchemaError(format!(
                    "scalar type '{}' declares no schema URIs",
                    self.ty.name()
                ))
            })?;
        SchemaStore::global().load(uri)
    }

    /// Validates the wrapped value against the schema enumeration, when
    /// the schema declares one.
    pub fn check_enum(&self) -> Result<()> {
        let schema = self.schema()?;
        let allowed = schema.enum_values();
        if allowed.is_empty() {
            return Ok(());
        }
        let value = self.value.as_str().ok_or_else(|| {
            Error::SchemaError(format!(
                "enumerated scalar '{}' holds a non-string value",
                self.ty.name()
            ))
        })?;
        if allowed.iter().any(|v| v == value) {
            Ok(())
        } else {
            Err(Error::SchemaError(format!(
                "'{}' is not one of the values enumerated by '{}'",
                value,
                schema.uri()
            )))
        }
    }
}

impl PartialEq for ScalarNode {
    fn eq(&self, other: &ScalarNode) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty) && self.tag == other.tag && self.value == other.value
    }
}

impl fmt::Debug for ScalarNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarNode")
            .field("type", &self.ty.name())
            .field("tag", &self.tag)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::types::NodeTypeBuilder;

    #[test]
    fn test_enum_validation_consults_the_schema() {
        SchemaStore::global().add_source(
            "schema:test/scalar/detector-1.0.0",
            r#"{"enum": ["WFI01", "WFI02"]}"#,
        );
        let ty = NodeTypeBuilder::enum_scalar("ScalarDetector")
            .schema("schema:test/scalar/detector-1.0.0")
            .build()
            .expect("valid type");
        let good = ScalarNode::new(&ty, Value::from("WFI01"));
        assert!(good.check_enum().is_ok());
        let bad = ScalarNode::new(&ty, Value::from("WFI99"));
        assert!(matches!(bad.check_enum(), Err(Error::SchemaError(_))));
    }
}
