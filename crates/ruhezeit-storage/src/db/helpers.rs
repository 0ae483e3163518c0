//! Database helper functions for safe type conversions.

use rusqlite::types::Type;
use serde_json::Value;

/// Parse a stored JSON document, returning a rusqlite error on failure.
pub fn parse_json(s: &str) -> rusqlite::Result<Value> {
    serde_json::from_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))
}
