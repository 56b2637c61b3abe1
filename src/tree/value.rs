use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::internal::error::{Error, Result};
use crate::node::{ObjectNode, ScalarNode, SequenceNode};
use crate::tree::opaque::OpaqueValue;

/// A single value in a document tree.
///
/// Raw trees (freshly parsed, schema-less) use the `List` and `Mapping`
/// variants; the coercion engine rewrites them into the typed `Object`,
/// `Sequence` and `Scalar` node variants according to declared field
/// signatures. Opaque scientific leaves pass through untouched.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// Raw sequence with no schema binding.
    List(Vec<Value>),
    /// Raw mapping with no schema binding. Keys iterate sorted.
    Mapping(BTreeMap<String, Value>),
    /// A typed object node.
    Object(ObjectNode),
    /// A typed sequence node.
    Sequence(SequenceNode),
    /// A typed scalar wrapper (enumerated-scalar classes).
    Scalar(ScalarNode),
    /// An opaque external leaf.
    Opaque(OpaqueValue),
}

/// Discriminant for the value variants.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Uint,
    Float,
    String,
    List,
    Mapping,
    Object,
    Sequence,
    Scalar,
    Opaque,
}

impl Value {
    /// Returns the corresponding ValueKind for the value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Uint(_) => ValueKind::Uint,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Mapping(_) => ValueKind::Mapping,
            Value::Object(_) => ValueKind::Object,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Returns true if the value is a scalar leaf (neither a container nor
    /// a node wrapper around one).
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            Value::List(_) | Value::Mapping(_) | Value::Object(_) | Value::Sequence(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Value::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectNode> {
        match self {
            Value::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Recursively strips node wrappers, producing the raw tree form:
    /// object nodes become mappings of their backing stores, sequence
    /// nodes become lists, scalar wrappers become their primitives.
    pub fn unwrapped(&self) -> Value {
        match self {
            Value::Object(node) => node.to_raw(),
            Value::Sequence(seq) => {
                Value::List(seq.items().iter().map(Value::unwrapped).collect())
            }
            Value::Scalar(scalar) => scalar.value().unwrapped(),
            Value::List(items) => Value::List(items.iter().map(Value::unwrapped).collect()),
            Value::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.unwrapped()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Builds a raw value from a parsed JSON document.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts the value to JSON. Node wrappers are stripped first; opaque
    /// leaves have no JSON form and fail.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Int(i) => Ok(serde_json::Value::from(*i)),
            Value::Uint(u) => Ok(serde_json::Value::from(*u)),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    Error::ConversionError(format!("non-finite float {} has no JSON form", f))
                }),
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::List(items) => Ok(serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>>>()?,
            )),
            Value::Mapping(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json()?);
                }
                Ok(serde_json::Value::Object(out))
            }
            Value::Object(_) | Value::Sequence(_) | Value::Scalar(_) => self.unwrapped().to_json(),
            Value::Opaque(o) => Err(Error::ConversionError(format!(
                "opaque leaf {} is converted by the external library, not as JSON",
                o
            ))),
        }
    }
}

// Equality normalizes across typed and raw shapes so that stripping a node
// to raw form and recoercing reconstructs an equal value.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Int(a), Value::Uint(b)) | (Value::Uint(b), Value::Int(a)) => {
                *a >= 0 && *a as u64 == *b
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            (Value::Object(node), Value::Mapping(map))
            | (Value::Mapping(map), Value::Object(node)) => node.store_eq(map),
            (Value::Sequence(seq), Value::List(items))
            | (Value::List(items), Value::Sequence(seq)) => seq.items() == items.as_slice(),
            (Value::Scalar(scalar), value) | (value, Value::Scalar(scalar)) => {
                scalar.value() == value
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Uint => "uint",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Mapping => "mapping",
            ValueKind::Object => "object node",
            ValueKind::Sequence => "sequence node",
            ValueKind::Scalar => "scalar node",
            ValueKind::Opaque => "opaque",
        };
        write!(f, "{}", name)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Mapping(v)
    }
}

impl From<ObjectNode> for Value {
    fn from(v: ObjectNode) -> Self {
        Value::Object(v)
    }
}

impl From<SequenceNode> for Value {
    fn from(v: SequenceNode) -> Self {
        Value::Sequence(v)
    }
}

impl From<ScalarNode> for Value {
    fn from(v: ScalarNode) -> Self {
        Value::Scalar(v)
    }
}

impl From<OpaqueValue> for Value {
    fn from(v: OpaqueValue) -> Self {
        Value::Opaque(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Opaque(OpaqueValue::Time(v))
    }
}
