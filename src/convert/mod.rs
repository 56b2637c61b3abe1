// Converter protocol
//
// Bridges typed nodes to and from the external serialization library's
// tree form. Each of the three categories (object, sequence, scalar)
// selects the tag for a concrete instance (always the instance's own tag,
// never inferred structurally), produces a library-agnostic tree fragment
// for writing, and reconstructs a typed instance from a freshly parsed
// fragment plus the tag it was read under, preserving that exact tag.

use crate::internal::error::{Error, Result};
use crate::node::{FlushOption, NodeShape, ObjectNode, ScalarNode, SequenceNode};
use crate::registry::Registry;
use crate::tree::Value;

pub use self::time::{TimeConverter, TIME_TAG};

pub mod time;

/// A library-agnostic tree fragment produced for writing.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeFragment {
    /// Backing-store items after a recursive REQUIRED flush, in
    /// deterministic order.
    Object {
        tag: String,
        items: Vec<(String, Value)>,
    },
    /// The element list.
    Sequence { tag: String, items: Vec<Value> },
    /// The underlying primitive.
    Scalar { tag: String, value: Value },
}

/// One converter category, as registered with the external serialization
/// library: a tag-selection function plus to-tree/from-tree functions.
pub trait Converter: Send + Sync {
    /// The tag URIs this converter claims, from the process-wide registry.
    fn tags(&self) -> Vec<String>;

    /// Selects the tag to write a concrete instance under.
    fn select_tag(&self, value: &Value) -> Result<String>;

    /// Produces the tree fragment for writing.
    fn to_tree(&self, value: &mut Value, warn: bool) -> Result<TreeFragment>;

    /// Reconstructs a typed instance from a freshly parsed fragment plus
    /// the tag it was read under.
    fn from_tree(&self, raw: Value, tag: &str) -> Result<Value>;
}

/// Converter for tagged object classes.
pub struct ObjectConverter;

impl Converter for ObjectConverter {
    fn tags(&self) -> Vec<String> {
        Registry::global().tags_for_shape(NodeShape::Object)
    }

    fn select_tag(&self, value: &Value) -> Result<String> {
        match value {
            Value::Object(node) => instance_tag(node.tag(), node.node_type().name()),
            other => Err(Error::ConversionError(format!(
                "object converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn to_tree(&self, value: &mut Value, warn: bool) -> Result<TreeFragment> {
        let tag = self.select_tag(value)?;
        match value {
            Value::Object(node) => {
                // No required key may be missing from an emitted document.
                node.flush(FlushOption::Required, warn, true)?;
                let items = node
                    .node_items()?
                    .into_iter()
                    .map(|(k, v)| (k, v.clone()))
                    .collect();
                Ok(TreeFragment::Object { tag, items })
            }
            other => Err(Error::ConversionError(format!(
                "object converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn from_tree(&self, raw: Value, tag: &str) -> Result<Value> {
        node_from_tree(raw, tag)
    }
}

/// Converter for tagged sequence classes.
pub struct SequenceConverter;

impl Converter for SequenceConverter {
    fn tags(&self) -> Vec<String> {
        Registry::global().tags_for_shape(NodeShape::Sequence)
    }

    fn select_tag(&self, value: &Value) -> Result<String> {
        match value {
            Value::Sequence(seq) => instance_tag(seq.tag(), seq.node_type().name()),
            other => Err(Error::ConversionError(format!(
                "sequence converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn to_tree(&self, value: &mut Value, warn: bool) -> Result<TreeFragment> {
        let tag = self.select_tag(value)?;
        match value {
            Value::Sequence(seq) => {
                for item in &mut seq.items {
                    if let Value::Object(node) = item {
                        node.flush(FlushOption::Required, warn, true)?;
                    }
                }
                Ok(TreeFragment::Sequence {
                    tag,
                    items: seq.items().to_vec(),
                })
            }
            other => Err(Error::ConversionError(format!(
                "sequence converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn from_tree(&self, raw: Value, tag: &str) -> Result<Value> {
        node_from_tree(raw, tag)
    }
}

/// Converter for enumerated-scalar classes.
pub struct ScalarConverter;

impl Converter for ScalarConverter {
    fn tags(&self) -> Vec<String> {
        Registry::global().tags_for_shape(NodeShape::Scalar)
    }

    fn select_tag(&self, value: &Value) -> Result<String> {
        match value {
            Value::Scalar(scalar) => instance_tag(scalar.tag(), scalar.node_type().name()),
            other => Err(Error::ConversionError(format!(
                "scalar converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn to_tree(&self, value: &mut Value, _warn: bool) -> Result<TreeFragment> {
        let tag = self.select_tag(value)?;
        match value {
            Value::Scalar(scalar) => Ok(TreeFragment::Scalar {
                tag,
                value: scalar.value().unwrapped(),
            }),
            other => Err(Error::ConversionError(format!(
                "scalar converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn from_tree(&self, raw: Value, tag: &str) -> Result<Value> {
        node_from_tree(raw, tag)
    }
}

/// The default converter set to register with the external library.
pub fn default_converters() -> Vec<Box<dyn Converter>> {
    vec![
        Box::new(ObjectConverter),
        Box::new(SequenceConverter),
        Box::new(ScalarConverter),
        Box::new(TimeConverter),
    ]
}

/// Constructs a typed node from a raw tree fragment plus the tag it was
/// read under, against the process-wide registry. The instance keeps that
/// exact tag, supporting older on-disk tags after the in-memory default
/// has advanced.
pub fn node_from_tree(raw: Value, tag: &str) -> Result<Value> {
    node_from_tree_in(Registry::global(), raw, tag)
}

/// [`node_from_tree`] against an explicit registry.
pub fn node_from_tree_in(registry: &Registry, raw: Value, tag: &str) -> Result<Value> {
    let ty = registry.class_for_tag(tag).ok_or_else(|| {
        Error::ConversionError(format!("no registered class for tag '{}'", tag))
    })?;
    match ty.shape() {
        NodeShape::Object => match raw {
            Value::Mapping(map) => Ok(Value::Object(ObjectNode::from_parts(
                &ty,
                Some(tag.to_string()),
                map.into_iter().collect(),
            ))),
            other => Err(Error::ConversionError(format!(
                "tag '{}' names an object class but the fragment is a {}",
                tag,
                other.kind()
            ))),
        },
        NodeShape::Sequence => match raw {
            Value::List(items) => Ok(Value::Sequence(SequenceNode::from_parts(
                &ty,
                Some(tag.to_string()),
                items,
            ))),
            other => Err(Error::ConversionError(format!(
                "tag '{}' names a sequence class but the fragment is a {}",
                tag,
                other.kind()
            ))),
        },
        NodeShape::Scalar => match raw {
            leaf @ (Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Uint(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::Opaque(_)) => Ok(Value::Scalar(ScalarNode::from_parts(
                &ty,
                Some(tag.to_string()),
                leaf,
            ))),
            other => Err(Error::ConversionError(format!(
                "tag '{}' names a scalar class but the fragment is a {}",
                tag,
                other.kind()
            ))),
        },
    }
}

fn instance_tag(tag: Option<&str>, type_name: &str) -> Result<String> {
    tag.map(str::to_string).ok_or_else(|| {
        Error::ConversionError(format!(
            "instance of '{}' carries no tag to write under",
            type_name
        ))
    })
}
