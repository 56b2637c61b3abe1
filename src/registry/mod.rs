// Tag and schema registries
//
// Process-wide URI→class maps, populated once as every concrete node type
// self-registers the tag and schema URIs it declares. A URI already
// claimed by a different class is a fatal configuration error, raised at
// registration time rather than at first use.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockWriteGuard};

use crate::internal::error::{Error, Result};
use crate::node::types::{NodeKind, NodeShape, NodeType};

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Read-mostly lookup tables from tag URI, schema URI and class name to
/// node type descriptors.
#[derive(Debug, Default)]
pub struct Registry {
    by_tag: RwLock<HashMap<String, Arc<NodeType>>>,
    by_schema: RwLock<HashMap<String, Arc<NodeType>>>,
    by_name: RwLock<HashMap<String, Arc<NodeType>>>,
}

/// Derived classification of every registered class, for generic tooling.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryIndex {
    pub tagged: Vec<String>,
    pub schema_bound: Vec<String>,
    pub implied: Vec<String>,
    pub enum_scalars: Vec<String>,
}

impl Registry {
    /// Creates an empty registry. Most callers want [`Registry::global`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry that `NodeTypeBuilder::register` and the
    /// converter layer consult.
    pub fn global() -> &'static Registry {
        GLOBAL_REGISTRY.get_or_init(Registry::new)
    }

    /// Registers every tag and schema URI a type declares, plus its name.
    ///
    /// Every claim is checked before any map is touched, so a duplicate
    /// leaves no partial state behind. Re-registering the same descriptor
    /// is idempotent; a URI or name claimed by a different class fails.
    pub fn register(&self, ty: &Arc<NodeType>) -> Result<()> {
        let mut by_tag = write(&self.by_tag);
        let mut by_schema = write(&self.by_schema);
        let mut by_name = write(&self.by_name);

        if let Some(existing) = by_name.get(ty.name()) {
            if !Arc::ptr_eq(existing, ty) {
                return Err(Error::DuplicateRegistration(format!(
                    "class name '{}' is already registered",
                    ty.name()
                )));
            }
        }
        for binding in ty.tags() {
            if let Some(existing) = by_tag.get(&binding.tag) {
                if !Arc::ptr_eq(existing, ty) {
                    return Err(Error::DuplicateRegistration(format!(
                        "tag '{}' is already claimed by '{}'",
                        binding.tag,
                        existing.name()
                    )));
                }
            }
        }
        for uri in ty.schema_uris() {
            if let Some(existing) = by_schema.get(uri) {
                if !Arc::ptr_eq(existing, ty) {
                    return Err(Error::DuplicateRegistration(format!(
                        "schema '{}' is already claimed by '{}'",
                        uri,
                        existing.name()
                    )));
                }
            }
        }

        by_name.insert(ty.name().to_string(), Arc::clone(ty));
        for binding in ty.tags() {
            by_tag.insert(binding.tag.clone(), Arc::clone(ty));
        }
        for uri in ty.schema_uris() {
            by_schema.insert(uri.clone(), Arc::clone(ty));
        }
        Ok(())
    }

    /// The class claiming a tag URI.
    pub fn class_for_tag(&self, tag: &str) -> Option<Arc<NodeType>> {
        read(&self.by_tag).get(tag).cloned()
    }

    /// The class claiming a schema URI.
    pub fn class_for_schema(&self, uri: &str) -> Option<Arc<NodeType>> {
        read(&self.by_schema).get(uri).cloned()
    }

    /// The class registered under a name.
    pub fn class_named(&self, name: &str) -> Option<Arc<NodeType>> {
        read(&self.by_name).get(name).cloned()
    }

    /// Resolves an implied class from its containing type and property,
    /// by the naming convention. No backlink table is consulted.
    pub fn implied_class(&self, containing: &str, property: &str) -> Option<Arc<NodeType>> {
        self.class_named(&NodeType::implied_name(containing, property))
    }

    /// Every registered (tag URI, class) pair.
    pub fn tag_entries(&self) -> Vec<(String, Arc<NodeType>)> {
        let mut entries: Vec<_> = read(&self.by_tag)
            .iter()
            .map(|(tag, ty)| (tag.clone(), Arc::clone(ty)))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    /// Classifies every registered class for generic tooling.
    pub fn classify(&self) -> RegistryIndex {
        let mut index = RegistryIndex::default();
        for (name, ty) in read(&self.by_name).iter() {
            match ty.kind() {
                NodeKind::Tagged => index.tagged.push(name.clone()),
                NodeKind::SchemaBound => index.schema_bound.push(name.clone()),
                NodeKind::Implied { .. } => index.implied.push(name.clone()),
                NodeKind::EnumScalar => index.enum_scalars.push(name.clone()),
            }
        }
        index.tagged.sort();
        index.schema_bound.sort();
        index.implied.sort();
        index.enum_scalars.sort();
        index
    }

    /// Every registered tag URI for classes of the given shape, sorted.
    pub fn tags_for_shape(&self, shape: NodeShape) -> Vec<String> {
        let mut tags: Vec<String> = read(&self.by_tag)
            .iter()
            .filter(|(_, ty)| ty.shape() == shape)
            .map(|(tag, _)| tag.clone())
            .collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        read(&self.by_name).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read<'a>(
    lock: &'a RwLock<HashMap<String, Arc<NodeType>>>,
) -> std::sync::RwLockReadGuard<'a, HashMap<String, Arc<NodeType>>> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<'a>(
    lock: &'a RwLock<HashMap<String, Arc<NodeType>>>,
) -> RwLockWriteGuard<'a, HashMap<String, Arc<NodeType>>> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
