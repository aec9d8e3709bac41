use std::fmt;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Values that can be stored in a database row or used as query parameters.
///
/// ```rust
/// use dbmaker_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Interpret the value as a boolean. ODBC hands most values back as text, so `"1"`/`"0"`
    /// count as well as integers.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(value) => Some(*value),
            RowValues::Int(1) => Some(true),
            RowValues::Int(0) => Some(false),
            RowValues::Text(s) => match s.trim() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// The form this value takes when bound to an ODBC parameter. Blobs stay binary; every other
    /// non-null value is sent as text.
    #[must_use]
    pub fn to_driver_param(&self) -> DriverParam {
        match self {
            RowValues::Int(i) => DriverParam::Text(i.to_string()),
            RowValues::Float(f) => DriverParam::Text(f.to_string()),
            RowValues::Text(s) => DriverParam::Text(s.clone()),
            RowValues::Bool(b) => DriverParam::Text(i64::from(*b).to_string()),
            RowValues::Timestamp(dt) => DriverParam::Text(dt.format("%F %T%.f").to_string()),
            RowValues::Null => DriverParam::Null,
            RowValues::JSON(jval) => DriverParam::Text(jval.to_string()),
            RowValues::Blob(bytes) => DriverParam::Binary(bytes.clone()),
        }
    }
}

/// A positional value as handed to the ODBC driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverParam {
    Null,
    Text(String),
    Binary(Vec<u8>),
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

/// Key of a bound statement parameter.
///
/// Named keys keep the literal token text including the colon (`":id"`); positional keys are
/// 1-based, the way the host framework binds `?` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Named(String),
    Positional(usize),
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Named(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Named(name)
    }
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Positional(position)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Named(name) => f.write_str(name),
            ParamKey::Positional(position) => write!(f, "{position}"),
        }
    }
}

/// Which side of the connector produced a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// A host-supplied driver that speaks the standard contract natively.
    Native,
    /// The ODBC-backed emulation in [`crate::emulation`].
    Emulated,
}

/// Identity recovered after an insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertId {
    /// The catalog value was numeric.
    Int(i64),
    /// The catalog value as returned, when it was not numeric.
    Raw(RowValues),
}

impl InsertId {
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            InsertId::Int(id) => Some(*id),
            InsertId::Raw(_) => None,
        }
    }
}
