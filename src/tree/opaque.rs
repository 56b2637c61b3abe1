// Opaque scientific leaf values
//
// Temporal values, physical-unit quantities, tables, coordinate transforms
// and N-D arrays are produced and consumed by the external serialization
// library's native converters. The node model carries them through
// unchanged; nothing here is introspected beyond clone, equality and
// display.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// An opaque external leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum OpaqueValue {
    /// A temporal value. The one leaf with a documented two-step
    /// conversion, see `convert::TimeConverter`.
    Time(DateTime<Utc>),
    /// A physical-unit quantity.
    Quantity { value: f64, unit: String },
    /// A tabular data handle.
    Table(TableHandle),
    /// A coordinate-transform handle.
    Wcs(WcsHandle),
    /// An N-D array handle.
    NdArray(NdArrayHandle),
}

/// Handle to tabular data owned by the external library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Handle to a coordinate-transform model owned by the external library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WcsHandle {
    pub name: String,
}

/// Handle to an N-D array. The buffer uses `Bytes` for zero-copy sharing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdArrayHandle {
    pub shape: Vec<usize>,
    pub dtype: String,
    pub data: Bytes,
}

impl OpaqueValue {
    /// Creates a quantity leaf.
    pub fn quantity(value: f64, unit: &str) -> Self {
        OpaqueValue::Quantity {
            value,
            unit: unit.to_string(),
        }
    }
}

impl fmt::Display for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpaqueValue::Time(t) => write!(f, "time({})", t.to_rfc3339()),
            OpaqueValue::Quantity { value, unit } => write!(f, "{} {}", value, unit),
            OpaqueValue::Table(t) => write!(f, "table({} columns, {} rows)", t.columns.len(), t.rows),
            OpaqueValue::Wcs(w) => write!(f, "wcs({})", w.name),
            OpaqueValue::NdArray(a) => write!(f, "ndarray({:?}, {})", a.shape, a.dtype),
        }
    }
}
