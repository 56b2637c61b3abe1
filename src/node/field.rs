// Field descriptors and type signatures
//
// Each declared field binds a pure default-value producer with a declared
// result-type signature. Defaults are computed on first read and memoized
// into the owning node's backing store; the descriptor itself memoizes its
// generated docstring once per concrete descriptor identity.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::internal::error::{Error, Result};
use crate::node::alias;
use crate::node::types::NodeType;
use crate::schema::SchemaDocument;
use crate::tree::Value;

/// A pure default-value producer.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Plain scalar and opaque leaf kinds a field may declare. Values under
/// these signatures pass through coercion unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Time,
    Quantity,
    Table,
    Wcs,
    NdArray,
    Any,
}

/// The declared result-type signature of a field.
#[derive(Debug, Clone)]
pub enum TypeSignature {
    /// A concrete node type: mappings become object nodes, lists become
    /// sequence nodes, primitives become scalar wrappers.
    Node(Arc<NodeType>),
    /// A homogeneous sequence of elements.
    SeqOf(Box<TypeSignature>),
    /// A homogeneous object-of-elements mapping with an explicit key set.
    MapOf(Box<TypeSignature>),
    /// An object whose keys are matched by a regular expression rather
    /// than an explicit field list.
    Pattern {
        pattern: Regex,
        element: Box<TypeSignature>,
    },
    /// A plain scalar or opaque external leaf, passed through unchanged.
    Scalar(ScalarKind),
}

impl TypeSignature {
    /// Builds a pattern-object signature, compiling the key pattern.
    pub fn pattern(pattern: &str, element: TypeSignature) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::SchemaError(format!("invalid key pattern '{}': {}", pattern, e)))?;
        Ok(TypeSignature::Pattern {
            pattern,
            element: Box::new(element),
        })
    }

    pub fn seq_of(element: TypeSignature) -> Self {
        TypeSignature::SeqOf(Box::new(element))
    }

    pub fn map_of(element: TypeSignature) -> Self {
        TypeSignature::MapOf(Box::new(element))
    }
}

/// Classification of a field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrigin {
    /// Declared on the class itself or a non-extension ancestor; part of
    /// the formal schema.
    Defined,
    /// Declared via an extension mixin; absent from the formal schema.
    Extra,
}

/// A class-level field declaration on an object node type.
pub struct FieldDescriptor {
    name: String,
    signature: TypeSignature,
    default: DefaultFn,
    description: Option<String>,
    origin: FieldOrigin,
    doc: OnceLock<String>,
}

impl FieldDescriptor {
    /// Declares a field under its canonical schema name with a pure
    /// default producer. Fields start out classified as defined; builder
    /// composition reclassifies mixin declarations.
    pub fn new(
        name: &str,
        signature: TypeSignature,
        default: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            signature,
            default: Arc::new(default),
            description: None,
            origin: FieldOrigin::Defined,
            doc: OnceLock::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub(crate) fn with_origin(mut self, origin: FieldOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// The canonical schema name the field is stored under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The accessor name the field is exposed under.
    pub fn accessor(&self) -> &str {
        alias::to_alias(&self.name)
    }

    pub fn signature(&self) -> &TypeSignature {
        &self.signature
    }

    pub fn origin(&self) -> FieldOrigin {
        self.origin
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Computes the default value. Producers are pure; memoization happens
    /// in the owning node's backing store, at most once per living
    /// instance per field.
    pub fn produce_default(&self) -> Value {
        (self.default)()
    }

    /// The generated docstring: the descriptor's own description followed
    /// by the schema-fragment description for the field. Computed once per
    /// concrete descriptor identity; clones carry a fresh cache so
    /// subclass copies differentiate correctly.
    pub fn docstring(&self, schema: Option<&SchemaDocument>) -> &str {
        self.doc.get_or_init(|| {
            let own = self.description.as_deref().unwrap_or("");
            let fragment = schema
                .and_then(|s| s.fragment(&self.name))
                .and_then(|f| f.description())
                .unwrap_or("");
            match (own.is_empty(), fragment.is_empty()) {
                (false, false) => format!("{}\n\n{}", own, fragment),
                (false, true) => own.to_string(),
                (true, false) => fragment.to_string(),
                (true, true) => format!("Field '{}'", self.name),
            }
        })
    }
}

impl Clone for FieldDescriptor {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            signature: self.signature.clone(),
            default: Arc::clone(&self.default),
            description: self.description.clone(),
            origin: self.origin,
            // A clone is a new concrete descriptor identity.
            doc: OnceLock::new(),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("origin", &self.origin)
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_producer_is_pure() {
        let field = FieldDescriptor::new("nresultants", TypeSignature::Scalar(ScalarKind::Int), || {
            Value::Int(6)
        });
        assert_eq!(field.produce_default(), Value::Int(6));
        assert_eq!(field.produce_default(), Value::Int(6));
    }

    #[test]
    fn test_docstring_without_schema_uses_own_description() {
        let field = FieldDescriptor::new("type", TypeSignature::Scalar(ScalarKind::String), || {
            Value::from("WFI_IMAGE")
        })
        .with_description("Exposure type.");
        assert_eq!(field.docstring(None), "Exposure type.");
        assert_eq!(field.accessor(), "type_");
    }

    #[test]
    fn test_clone_carries_a_fresh_docstring_cache() {
        let field = FieldDescriptor::new("a", TypeSignature::Scalar(ScalarKind::Any), || Value::Null);
        assert_eq!(field.docstring(None), "Field 'a'");
        let copy = field.clone();
        assert!(copy.doc.get().is_none());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = TypeSignature::pattern("([unclosed", TypeSignature::Scalar(ScalarKind::Any));
        assert!(matches!(result, Err(Error::SchemaError(_))));
    }
}
