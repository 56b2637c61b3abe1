// Fulmen library entry point
// Core modules are declared here

pub mod convert;
pub mod internal;
pub mod node;
pub mod registry;
pub mod schema;
pub mod tree;

pub use internal::error::{Error, Result};
pub use node::{FlushOption, ObjectNode, ScalarNode, SequenceNode};
pub use registry::Registry;
pub use tree::{OpaqueValue, Value};
