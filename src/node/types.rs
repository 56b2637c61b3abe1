// Node type descriptors
//
// A `NodeType` is the per-class record the registry hands out: its tag and
// schema bindings, its composed field lists and its classification. Types
// are composed once, at registration time, through `NodeTypeBuilder`;
// there is no inheritance graph to walk afterwards.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::internal::error::{Error, Result};
use crate::node::field::{FieldDescriptor, FieldOrigin};
use crate::registry::Registry;

/// One tag URI paired with the schema URI it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBinding {
    pub tag: String,
    pub schema: String,
}

/// Classification of a node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Carries an ordered tag map; the lexically-last tag is the default
    /// for new instances.
    Tagged,
    /// Bound to schema URIs but never independently tagged.
    SchemaBound,
    /// Reachable only through exactly one field of exactly one containing
    /// type; its effective schema is the sub-schema of the container's
    /// schema at that property.
    Implied { containing: String, property: String },
    /// A scalar class constrained to a schema enumeration.
    EnumScalar,
}

/// The structural shape a node type instantiates as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Object,
    Sequence,
    Scalar,
}

/// The per-class descriptor produced by [`NodeTypeBuilder`].
pub struct NodeType {
    name: String,
    shape: NodeShape,
    kind: NodeKind,
    tags: Vec<TagBinding>,
    schemas: Vec<String>,
    defined: Vec<FieldDescriptor>,
    extra: Vec<FieldDescriptor>,
    key_pattern: Option<Regex>,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The ordered tag map. Empty for untagged kinds.
    pub fn tags(&self) -> &[TagBinding] {
        &self.tags
    }

    /// The default tag for new instances: the lexically-last declaration.
    pub fn latest_tag(&self) -> Option<&str> {
        self.tags.last().map(|b| b.tag.as_str())
    }

    /// The schema URI paired with a tag.
    pub fn schema_for_tag(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|b| b.tag == tag)
            .map(|b| b.schema.as_str())
    }

    /// Every schema URI the type is bound to.
    pub fn schema_uris(&self) -> &[String] {
        &self.schemas
    }

    /// The class-default schema URI: the one paired with the latest tag,
    /// or the latest schema binding for untagged kinds.
    pub fn default_schema(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Tagged => self.tags.last().map(|b| b.schema.as_str()),
            _ => self.schemas.last().map(String::as_str),
        }
    }

    /// Looks up a declared field by canonical name, defined before extra.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.defined
            .iter()
            .chain(self.extra.iter())
            .find(|f| f.name() == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Fields declared on the class or a non-extension ancestor.
    pub fn defined_fields(&self) -> &[FieldDescriptor] {
        &self.defined
    }

    /// Fields contributed by extension mixins.
    pub fn extra_fields(&self) -> &[FieldDescriptor] {
        &self.extra
    }

    /// Key pattern for pattern-keyed object types.
    pub fn key_pattern(&self) -> Option<&Regex> {
        self.key_pattern.as_ref()
    }

    /// The conventional association name for an implied node type:
    /// the containing type name joined with the PascalCase property name.
    pub fn implied_name(containing: &str, property: &str) -> String {
        let mut suffix = String::new();
        for segment in property.split('_') {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                suffix.extend(first.to_uppercase());
                suffix.push_str(chars.as_str());
            }
        }
        format!("{}_{}", containing, suffix)
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("kind", &self.kind)
            .field("tags", &self.tags)
            .field("schemas", &self.schemas)
            .finish()
    }
}

/// Composes a node type from its own declarations, inherited fields and
/// extension mixins in a single pass.
pub struct NodeTypeBuilder {
    name: String,
    shape: NodeShape,
    kind: NodeKind,
    tags: Vec<TagBinding>,
    schemas: Vec<String>,
    inherited: Vec<FieldDescriptor>,
    own: Vec<FieldDescriptor>,
    mixins: Vec<FieldDescriptor>,
    key_pattern: Option<String>,
}

impl NodeTypeBuilder {
    fn new(name: &str, shape: NodeShape, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            shape,
            kind,
            tags: Vec::new(),
            schemas: Vec::new(),
            inherited: Vec::new(),
            own: Vec::new(),
            mixins: Vec::new(),
            key_pattern: None,
        }
    }

    /// A tag-bound class.
    pub fn tagged(name: &str) -> Self {
        Self::new(name, NodeShape::Object, NodeKind::Tagged)
    }

    /// A schema-bound class with no tags of its own.
    pub fn schema_bound(name: &str) -> Self {
        Self::new(name, NodeShape::Object, NodeKind::SchemaBound)
    }

    /// An implied class, named by convention from its containing type and
    /// property.
    pub fn implied(containing: &str, property: &str) -> Self {
        let name = NodeType::implied_name(containing, property);
        Self::new(
            &name,
            NodeShape::Object,
            NodeKind::Implied {
                containing: containing.to_string(),
                property: property.to_string(),
            },
        )
    }

    /// An enumerated-scalar class.
    pub fn enum_scalar(name: &str) -> Self {
        Self::new(name, NodeShape::Scalar, NodeKind::EnumScalar)
    }

    /// Overrides the structural shape (tagged sequence classes).
    pub fn shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    /// Appends a tag→schema binding. Declaration order is meaningful: the
    /// last binding is the class default.
    pub fn tag(mut self, tag: &str, schema: &str) -> Self {
        self.tags.push(TagBinding {
            tag: tag.to_string(),
            schema: schema.to_string(),
        });
        self.schemas.push(schema.to_string());
        self
    }

    /// Appends a schema URI binding for untagged kinds.
    pub fn schema(mut self, uri: &str) -> Self {
        self.schemas.push(uri.to_string());
        self
    }

    /// Declares a field on the class itself.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.own.push(field);
        self
    }

    /// Copies the defined fields of a non-extension ancestor.
    pub fn inherit(mut self, parent: &NodeType) -> Self {
        self.inherited.extend(parent.defined_fields().iter().cloned());
        self
    }

    /// Adds an extension mixin's fields, classified as extra.
    pub fn extend_with(mut self, mixin: &[FieldDescriptor]) -> Self {
        self.mixins.extend(mixin.iter().cloned());
        self
    }

    /// Declares the key pattern for a pattern-keyed object type. Compiled
    /// at build time.
    pub fn key_pattern(mut self, pattern: &str) -> Self {
        self.key_pattern = Some(pattern.to_string());
        self
    }

    /// Composes and validates the type descriptor. Field classification
    /// happens here, once: a field a class both inherits from a mixin and
    /// re-declares itself is counted once, as defined.
    pub fn build(self) -> Result<Arc<NodeType>> {
        match self.kind {
            NodeKind::Tagged => {
                if self.tags.is_empty() {
                    return Err(Error::SchemaError(format!(
                        "tagged node type '{}' declares no tags",
                        self.name
                    )));
                }
            }
            NodeKind::SchemaBound | NodeKind::EnumScalar => {
                if self.schemas.is_empty() {
                    return Err(Error::SchemaError(format!(
                        "schema-bound node type '{}' declares no schema URIs",
                        self.name
                    )));
                }
            }
            NodeKind::Implied { .. } => {
                if !self.tags.is_empty() {
                    return Err(Error::SchemaError(format!(
                        "implied node type '{}' must not declare tags",
                        self.name
                    )));
                }
            }
        }

        let mut defined: Vec<FieldDescriptor> = Vec::new();
        for field in self
            .inherited
            .into_iter()
            .chain(self.own.into_iter())
        {
            let field = field.with_origin(FieldOrigin::Defined);
            match defined.iter_mut().find(|f| f.name() == field.name()) {
                // A re-declaration replaces the inherited descriptor but
                // keeps its position.
                Some(slot) => *slot = field,
                None => defined.push(field),
            }
        }

        let mut extra: Vec<FieldDescriptor> = Vec::new();
        for field in self.mixins.into_iter() {
            if defined.iter().any(|f| f.name() == field.name()) {
                continue;
            }
            if extra.iter().any(|f| f.name() == field.name()) {
                continue;
            }
            extra.push(field.with_origin(FieldOrigin::Extra));
        }

        let key_pattern = match self.key_pattern {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|e| {
                Error::SchemaError(format!(
                    "invalid key pattern '{}' on '{}': {}",
                    pattern, self.name, e
                ))
            })?),
            None => None,
        };

        Ok(Arc::new(NodeType {
            name: self.name,
            shape: self.shape,
            kind: self.kind,
            tags: self.tags,
            schemas: self.schemas,
            defined,
            extra,
            key_pattern,
        }))
    }

    /// Builds and self-registers in the process-wide registry.
    pub fn register(self) -> Result<Arc<NodeType>> {
        self.register_in(Registry::global())
    }

    /// Builds and self-registers in an explicit registry.
    pub fn register_in(self, registry: &Registry) -> Result<Arc<NodeType>> {
        let ty = self.build()?;
        registry.register(&ty)?;
        Ok(ty)
    }
}
