// Sequence nodes
//
// An ordered list shape for tagged sequence classes. The backing store is
// the element vector itself; elements are coerced by the engine when the
// sequence is built through a declared field signature.

use std::fmt;
use std::sync::Arc;

use crate::node::types::NodeType;
use crate::tree::Value;

/// A typed sequence node.
#[derive(Clone)]
pub struct SequenceNode {
    pub(crate) ty: Arc<NodeType>,
    pub(crate) tag: Option<String>,
    pub(crate) items: Vec<Value>,
}

impl SequenceNode {
    /// Creates an empty instance carrying the class-default (latest) tag.
    pub fn new(ty: &Arc<NodeType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag: ty.latest_tag().map(str::to_string),
            items: Vec::new(),
        }
    }

    /// Wraps an existing element list under the class-default tag.
    pub fn from_list(ty: &Arc<NodeType>, items: Vec<Value>) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag: ty.latest_tag().map(str::to_string),
            items,
        }
    }

    pub(crate) fn from_parts(ty: &Arc<NodeType>, tag: Option<String>, items: Vec<Value>) -> Self {
        Self {
            ty: Arc::clone(ty),
            tag,
            items,
        }
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.ty
    }

    /// The instance tag the sequence was created or read under.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.tag = Some(tag.to_string());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl PartialEq for SequenceNode {
    fn eq(&self, other: &SequenceNode) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty) && self.tag == other.tag && self.items == other.items
    }
}

impl fmt::Debug for SequenceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceNode")
            .field("type", &self.ty.name())
            .field("tag", &self.tag)
            .field("items", &self.items)
            .finish()
    }
}
