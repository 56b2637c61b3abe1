// Temporal value conversion
//
// Temporal leaves are the one documented exception to direct conversion:
// a two-step path that delegates to the external library's native
// primitive converter first (here, RFC 3339 text), then wraps or unwraps
// the opaque leaf.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::convert::{Converter, TreeFragment};
use crate::internal::error::{Error, Result};
use crate::tree::{OpaqueValue, Value};

/// The tag the native temporal converter claims.
pub const TIME_TAG: &str = "tag:fulmen.dev:primitive/time-1.0.0";

/// Two-step converter for temporal leaves.
pub struct TimeConverter;

impl TimeConverter {
    /// Step one of reading: the native primitive conversion.
    fn parse_native(text: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                Error::ConversionError(format!("'{}' is not an RFC 3339 timestamp: {}", text, e))
            })
    }

    /// Step one of writing: the native primitive rendering.
    fn format_native(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl Converter for TimeConverter {
    fn tags(&self) -> Vec<String> {
        vec![TIME_TAG.to_string()]
    }

    fn select_tag(&self, value: &Value) -> Result<String> {
        match value {
            Value::Opaque(OpaqueValue::Time(_)) => Ok(TIME_TAG.to_string()),
            other => Err(Error::ConversionError(format!(
                "time converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn to_tree(&self, value: &mut Value, _warn: bool) -> Result<TreeFragment> {
        match value {
            Value::Opaque(OpaqueValue::Time(dt)) => Ok(TreeFragment::Scalar {
                tag: TIME_TAG.to_string(),
                value: Value::String(Self::format_native(dt)),
            }),
            other => Err(Error::ConversionError(format!(
                "time converter handed a {}",
                other.kind()
            ))),
        }
    }

    fn from_tree(&self, raw: Value, tag: &str) -> Result<Value> {
        if tag != TIME_TAG {
            return Err(Error::ConversionError(format!(
                "time converter handed tag '{}'",
                tag
            )));
        }
        let text = raw.as_str().ok_or_else(|| {
            Error::ConversionError(format!(
                "temporal fragment must be a string, got {}",
                raw.kind()
            ))
        })?;
        // Step two: wrap the native result as an opaque leaf.
        let parsed = Self::parse_native(text)?;
        Ok(Value::Opaque(OpaqueValue::Time(parsed)))
    }
}
