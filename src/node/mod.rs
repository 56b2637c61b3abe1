// Node module for the Fulmen model
//
// This module provides the typed node hierarchy and its supporting
// machinery. It includes:
//
// 1. Object, sequence and scalar node shapes with private backing stores
// 2. Field descriptors with lazy, memoized defaults
// 3. The wrap/coercion engine bridging raw data and typed nodes
// 4. Node type descriptors composed at registration time
// 5. The flush state machine and deterministic ordering/flattening
// 6. Reserved-word field aliasing

// Re-export public types and functions
pub use self::coerce::coerce;
pub use self::field::{DefaultFn, FieldDescriptor, FieldOrigin, ScalarKind, TypeSignature};
pub use self::flush::FlushOption;
pub use self::object::ObjectNode;
pub use self::scalar::ScalarNode;
pub use self::sequence::SequenceNode;
pub use self::types::{NodeKind, NodeShape, NodeType, NodeTypeBuilder, TagBinding};

// Sub-modules
pub mod alias;
pub mod coerce;
pub mod field;
pub mod flush;
pub mod object;
pub mod order;
pub mod scalar;
pub mod sequence;
pub mod types;
