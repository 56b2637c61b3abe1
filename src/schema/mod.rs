// Schema module for the Fulmen node model
//
// This module provides schema document parsing and URI resolution for the
// node model. It includes:
//
// 1. A parsed schema document exposing the required-field set, declared
//    property order, per-field sub-schemas, key patterns and enumerations
// 2. An in-memory resource manager resolving schema URIs to document text
// 3. A process-wide loader caching one parse per URI

// Re-export public types and functions
pub use self::document::{SchemaDocument, SchemaFragment};
pub use self::store::SchemaStore;

// Sub-modules
pub mod document;
pub mod store;
