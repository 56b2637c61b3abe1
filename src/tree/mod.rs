// Tree value model for the Fulmen node system
//
// This module defines the single value enum shared by raw (freshly loaded,
// untyped) trees and typed node instances, plus the opaque scientific leaf
// values the core never introspects.

pub use self::opaque::{NdArrayHandle, OpaqueValue, TableHandle, WcsHandle};
pub use self::value::{Value, ValueKind};

pub mod opaque;
pub mod value;
