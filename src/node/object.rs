// Object nodes
//
// An object node is a string-keyed mapping with a private backing store
// holding only values that have already been loaded or materialized. Reads
// resolve through one path: stored values are coerced in place, declared
// but absent fields materialize their defaults, anything else raises.
// Attribute-style writes are strict; index-style writes are deliberately
// permissive for interoperability with externally sourced, possibly
// schema-nonconformant data.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::internal::error::{Error, Result};
use crate::node::alias;
use crate::node::coerce::coerce;
use crate::node::field::FieldDescriptor;
use crate::node::types::{NodeKind, NodeType};
use crate::registry::Registry;
use crate::schema::{SchemaDocument, SchemaStore};
use crate::tree::Value;

/// A typed, lazily-materialized object node.
#[derive(Clone)]
pub struct ObjectNode {
    pub(crate) ty: Arc<NodeType>,
    pub(crate) tag: Option<String>,
    pub(crate) store: HashMap<String, Value>,
}

impl ObjectNode {
    /// Creates an empty instance carrying the class-default (latest) tag.
    pub fn new(ty: &Arc<NodeType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag: ty.latest_tag().map(str::to_string),
            store: HashMap::new(),
        }
    }

    /// Wraps an existing raw mapping, e.g. freshly parsed from a
    /// serialized tree, under the class-default tag.
    pub fn from_mapping(ty: &Arc<NodeType>, raw: BTreeMap<String, Value>) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag: ty.latest_tag().map(str::to_string),
            store: raw.into_iter().collect(),
        }
    }

    pub(crate) fn from_parts(
        ty: &Arc<NodeType>,
        tag: Option<String>,
        store: HashMap<String, Value>,
    ) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag,
            store,
        }
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.ty
    }

    /// The instance tag: the tag the node was created or read under,
    /// which may differ from the class default.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.tag = Some(tag.to_string());
    }

    /// Resolves the schema governing this instance. Tag-bound instances
    /// always resolve through their own tag, not the class default;
    /// implied instances resolve the sub-schema of their container's
    /// schema at the containing property.
    pub fn schema(&self) -> Result<Arc<SchemaDocument>> {
        match self.ty.kind() {
            NodeKind::Tagged => {
                let tag = self.tag.as_deref().ok_or_else(|| {
                    Error::SchemaError(format!(
                        "tagged node '{}' carries no instance tag",
                        self.ty.name()
                    ))
                })?;
                let uri = self.ty.schema_for_tag(tag).ok_or_else(|| {
                    Error::SchemaError(format!(
                        "tag '{}' is not declared by '{}'",
                        tag,
                        self.ty.name()
                    ))
                })?;
                SchemaStore::global().load(uri)
            }
            NodeKind::Implied {
                containing,
                property,
            } => {
                let container = Registry::global().class_named(containing).ok_or_else(|| {
                    Error::SchemaError(format!(
                        "implied node '{}' names unregistered container '{}'",
                        self.ty.name(),
                        containing
                    ))
                })?;
                let uri = container.default_schema().ok_or_else(|| {
                    Error::SchemaError(format!(
                        "container '{}' declares no schema URIs",
                        containing
                    ))
                })?;
                let doc = SchemaStore::global().load(uri)?;
                Ok(Arc::new(doc.sub_document(property)?))
            }
            NodeKind::SchemaBound | NodeKind::EnumScalar => {
                let uri = self.ty.default_schema().ok_or_else(|| {
                    Error::SchemaError(format!(
                        "node type '{}' declares no schema URIs",
                        self.ty.name()
                    ))
                })?;
                SchemaStore::global().load(uri)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Canonical keys currently present in the backing store, unordered.
    pub fn stored_keys(&self) -> Vec<&str> {
        self.store.keys().map(String::as_str).collect()
    }

    /// Probes whether a name (accessor or canonical) is a declared field.
    pub fn has_field(&self, name: &str) -> bool {
        self.ty.has_field(alias::to_canonical(name))
    }

    /// Probes whether a field already has a backing-store entry.
    pub fn is_materialized(&self, name: &str) -> bool {
        self.store.contains_key(alias::to_canonical(name))
    }

    /// A stored value, without materializing or coercing anything.
    pub fn try_get(&self, name: &str) -> Option<&Value> {
        self.store.get(alias::to_canonical(name))
    }

    /// Attribute-style read. Raises a missing-field error for a key that
    /// is neither stored nor declared, distinct from the hard key error of
    /// [`ObjectNode::get_index`] so callers can probe declared fields
    /// before giving up.
    pub fn get_attr(&mut self, name: &str) -> Result<&Value> {
        let key = alias::to_canonical(name).to_string();
        self.resolve_entry(key, |key, ty| {
            Error::MissingField(format!("'{}' is not a field of '{}'", key, ty))
        })
    }

    /// Index-style read. Raises a key error for a truly absent key.
    pub fn get_index(&mut self, name: &str) -> Result<&Value> {
        let key = alias::to_canonical(name).to_string();
        self.resolve_entry(key, |key, ty| {
            Error::KeyError(format!("'{}' not present in '{}'", key, ty))
        })
    }

    fn resolve_entry(
        &mut self,
        key: String,
        absent: fn(&str, &str) -> Error,
    ) -> Result<&Value> {
        let ty = Arc::clone(&self.ty);
        if let Some(field) = ty.field(&key) {
            let value = match self.store.get(&key) {
                Some(stored) => stored.clone(),
                None => self.synthesize_default(field),
            };
            // Self-updating coercion: repeated reads skip recoercion.
            let coerced = coerce(value, field.signature())?;
            let slot = self.store.entry(key).or_insert(Value::Null);
            *slot = coerced;
            return Ok(slot);
        }
        match self.store.get(&key) {
            Some(value) => Ok(value),
            None => Err(absent(&key, ty.name())),
        }
    }

    /// Computes a field default, warning when the instance tag is stale
    /// relative to the class's latest tag: the synthesized value may not
    /// match the schema version actually governing this instance.
    pub(crate) fn synthesize_default(&self, field: &FieldDescriptor) -> Value {
        if let (Some(tag), Some(latest)) = (self.tag.as_deref(), self.ty.latest_tag()) {
            if tag != latest {
                tracing::warn!(
                    node = self.ty.name(),
                    field = field.name(),
                    instance_tag = tag,
                    latest_tag = latest,
                    "field default synthesized under a stale instance tag"
                );
            }
        }
        field.produce_default()
    }

    /// Attribute-style write: the key must already be stored or be a
    /// declared field.
    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let key = alias::to_canonical(name);
        if self.store.contains_key(key) || self.ty.has_field(key) {
            self.store.insert(key.to_string(), value.into());
            Ok(())
        } else {
            Err(Error::AttributeError(format!(
                "cannot set undeclared field '{}' on '{}'",
                name,
                self.ty.name()
            )))
        }
    }

    /// Index-style write: accepts arbitrary keys, stored as given. This is
    /// the tolerated path for foreign keys in externally sourced data.
    pub fn set_index(&mut self, name: &str, value: impl Into<Value>) {
        self.store.insert(name.to_string(), value.into());
    }

    /// Removes a stored entry, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.store.remove(alias::to_canonical(name))
    }

    /// Duplicates the node wrapper and its immediate backing store as a
    /// new container.
    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }

    /// The raw tree form: a mapping of the backing store with every node
    /// wrapper stripped recursively.
    pub fn to_raw(&self) -> Value {
        Value::Mapping(
            self.store
                .iter()
                .map(|(k, v)| (k.clone(), v.unwrapped()))
                .collect(),
        )
    }

    /// The generated docstring for a declared field, combining the
    /// descriptor's own description with this instance's schema fragment.
    pub fn field_docstring(&self, name: &str) -> Result<String> {
        let key = alias::to_canonical(name);
        let field = self.ty.field(key).ok_or_else(|| {
            Error::MissingField(format!(
                "'{}' is not a field of '{}'",
                key,
                self.ty.name()
            ))
        })?;
        let schema = self.schema().ok();
        Ok(field.docstring(schema.as_deref()).to_string())
    }

    pub(crate) fn into_store(self) -> HashMap<String, Value> {
        self.store
    }

    pub(crate) fn store_eq(&self, map: &BTreeMap<String, Value>) -> bool {
        self.store.len() == map.len()
            && self
                .store
                .iter()
                .all(|(k, v)| map.get(k).map_or(false, |m| m == v))
    }
}

impl PartialEq for ObjectNode {
    fn eq(&self, other: &ObjectNode) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty)
            && self.tag == other.tag
            && self.store.len() == other.store.len()
            && self
                .store
                .iter()
                .all(|(k, v)| other.store.get(k).map_or(false, |o| o == v))
    }
}

impl fmt::Debug for ObjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectNode")
            .field("type", &self.ty.name())
            .field("tag", &self.tag)
            .field("store", &self.store)
            .finish()
    }
}
