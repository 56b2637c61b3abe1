// Wrap/coercion engine
//
// Bridges raw (freshly loaded, untyped) nested data and the typed node
// hierarchy. Coercion is idempotent; callers write the result back to the
// backing store so repeated reads skip recoercion.

use std::sync::Arc;

use crate::internal::error::{Error, Result};
use crate::node::field::TypeSignature;
use crate::node::object::ObjectNode;
use crate::node::scalar::ScalarNode;
use crate::node::sequence::SequenceNode;
use crate::node::types::{NodeShape, NodeType};
use crate::tree::Value;

/// Coerces a value against a declared type signature.
///
/// 1. Concrete node type, value not already that type: construct it.
/// 2. Object-of-elements: recursively coerce every value.
/// 3. Pattern object: same, key validity checked against the pattern
///    instead of a field list; non-matching keys pass through.
/// 4. Sequence-of-elements: recursively coerce every element.
/// 5. Plain scalar or opaque external type: unchanged.
pub fn coerce(value: Value, signature: &TypeSignature) -> Result<Value> {
    match signature {
        TypeSignature::Node(ty) => coerce_node(value, ty),
        TypeSignature::MapOf(element) => match value {
            Value::Mapping(map) => {
                let mut out = std::collections::BTreeMap::new();
                for (key, entry) in map {
                    out.insert(key, coerce(entry, element)?);
                }
                Ok(Value::Mapping(out))
            }
            other => Err(Error::CoercionError(format!(
                "cannot coerce {} into an object-of-elements mapping",
                other.kind()
            ))),
        },
        TypeSignature::Pattern { pattern, element } => match value {
            Value::Mapping(map) => {
                let mut out = std::collections::BTreeMap::new();
                for (key, entry) in map {
                    if pattern.is_match(&key) {
                        out.insert(key, coerce(entry, element)?);
                    } else {
                        // Tolerated foreign key from the permissive path.
                        tracing::debug!(key = key.as_str(), "key does not match the declared pattern");
                        out.insert(key, entry);
                    }
                }
                Ok(Value::Mapping(out))
            }
            other => Err(Error::CoercionError(format!(
                "cannot coerce {} into a pattern-keyed mapping",
                other.kind()
            ))),
        },
        TypeSignature::SeqOf(element) => match value {
            Value::List(items) => {
                let coerced = items
                    .into_iter()
                    .map(|item| coerce(item, element))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::List(coerced))
            }
            Value::Sequence(mut seq) => {
                for item in &mut seq.items {
                    let taken = std::mem::replace(item, Value::Null);
                    *item = coerce(taken, element)?;
                }
                Ok(Value::Sequence(seq))
            }
            other => Err(Error::CoercionError(format!(
                "cannot coerce {} into a sequence of elements",
                other.kind()
            ))),
        },
        TypeSignature::Scalar(_) => Ok(value),
    }
}

fn coerce_node(value: Value, ty: &Arc<NodeType>) -> Result<Value> {
    match ty.shape() {
        NodeShape::Object => match value {
            Value::Object(node) if Arc::ptr_eq(&node.ty, ty) => Ok(Value::Object(node)),
            Value::Object(node) => Ok(Value::Object(ObjectNode::from_parts(
                ty,
                ty.latest_tag().map(str::to_string),
                node.into_store(),
            ))),
            Value::Mapping(map) => Ok(Value::Object(ObjectNode::from_mapping(ty, map))),
            other => Err(Error::CoercionError(format!(
                "cannot coerce {} into object node '{}'",
                other.kind(),
                ty.name()
            ))),
        },
        NodeShape::Sequence => match value {
            Value::Sequence(seq) if Arc::ptr_eq(&seq.ty, ty) => Ok(Value::Sequence(seq)),
            Value::Sequence(seq) => Ok(Value::Sequence(SequenceNode::from_list(ty, seq.items))),
            Value::List(items) => Ok(Value::Sequence(SequenceNode::from_list(ty, items))),
            other => Err(Error::CoercionError(format!(
                "cannot coerce {} into sequence node '{}'",
                other.kind(),
                ty.name()
            ))),
        },
        NodeShape::Scalar => match value {
            Value::Scalar(scalar) if Arc::ptr_eq(&scalar.ty, ty) => Ok(Value::Scalar(scalar)),
            Value::Scalar(scalar) => Ok(Value::Scalar(ScalarNode::new(ty, scalar.into_value()))),
            leaf @ (Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Uint(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::Opaque(_)) => Ok(Value::Scalar(ScalarNode::new(ty, leaf))),
            other => Err(Error::CoercionError(format!(
                "cannot coerce {} into scalar node '{}'",
                other.kind(),
                ty.name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::field::{FieldDescriptor, ScalarKind};
    use crate::node::types::NodeTypeBuilder;
    use std::collections::BTreeMap;

    fn element_type() -> Arc<NodeType> {
        NodeTypeBuilder::schema_bound("CoerceElement")
            .schema("schema:test/coerce/element-1.0.0")
            .field(FieldDescriptor::new(
                "abvega_offset",
                TypeSignature::Scalar(ScalarKind::Float),
                || Value::Float(0.0),
            ))
            .build()
            .expect("valid type")
    }

    fn raw_element(offset: f64) -> Value {
        let mut map = BTreeMap::new();
        map.insert("abvega_offset".to_string(), Value::Float(offset));
        Value::Mapping(map)
    }

    #[test]
    fn test_mapping_coerces_into_object_node() {
        let ty = element_type();
        let signature = TypeSignature::Node(Arc::clone(&ty));
        let coerced = coerce(raw_element(1.5), &signature).expect("coercible");
        let node = coerced.as_object().expect("object node");
        assert!(Arc::ptr_eq(node.node_type(), &ty));
        assert_eq!(node.try_get("abvega_offset"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let ty = element_type();
        let signature = TypeSignature::Node(Arc::clone(&ty));
        let once = coerce(raw_element(2.0), &signature).expect("coercible");
        let twice = coerce(once.clone(), &signature).expect("idempotent");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pattern_signature_coerces_matching_keys_only() {
        let ty = element_type();
        let signature = TypeSignature::pattern(
            r"^(F\d{3}|GRISM|PRISM|DARK)$",
            TypeSignature::Node(Arc::clone(&ty)),
        )
        .expect("valid pattern");
        let mut map = BTreeMap::new();
        map.insert("F158".to_string(), raw_element(1.5));
        map.insert("bonus_row".to_string(), Value::Int(7));
        let coerced = coerce(Value::Mapping(map), &signature).expect("coercible");
        let out = coerced.as_mapping().expect("mapping");
        assert!(matches!(out.get("F158"), Some(Value::Object(_))));
        assert_eq!(out.get("bonus_row"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_sequence_of_elements_coerces_each_element() {
        let ty = element_type();
        let signature = TypeSignature::seq_of(TypeSignature::Node(Arc::clone(&ty)));
        let coerced = coerce(
            Value::List(vec![raw_element(0.5), raw_element(0.7)]),
            &signature,
        )
        .expect("coercible");
        match coerced {
            Value::List(items) => {
                assert!(items.iter().all(|i| matches!(i, Value::Object(_))));
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_signature_passes_through() {
        let signature = TypeSignature::Scalar(ScalarKind::Float);
        let value = coerce(Value::Float(1.0), &signature).expect("unchanged");
        assert_eq!(value, Value::Float(1.0));
    }

    #[test]
    fn test_shape_mismatch_is_a_coercion_error() {
        let ty = element_type();
        let signature = TypeSignature::Node(Arc::clone(&ty));
        assert!(matches!(
            coerce(Value::Int(1), &signature),
            Err(Error::CoercionError(_))
        ));
    }
}
