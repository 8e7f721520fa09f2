//! value representation
//!
//! Scalars keep their raw text inside a [crate::document::Document]. The type of a scalar is tracked separately as a
//! [ScalarType] so that `port: 8080` and `port: "8080"` stay an integer and a string on the way out.
//!
//! The output model contains the following data types
//! - null
//! - boolean (true/false)
//! - integer (signed, i64)
//! - decimal (f64)
//! - string (utf-8)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", keys are values themselves)
//!
//! Plain scalars are typed according to the yaml 1.2 core schema. An integer that does not fit an `i64` becomes a
//! decimal and a decimal that cannot be parsed stays a string.
use crate::document::{Document, NodeData, NodeId};
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// Type tag of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl ScalarType {
    /// Infer the type of an untagged plain scalar
    pub fn infer(text: &str) -> Self {
        if is_null(text) {
            ScalarType::Null
        } else if is_bool(text) {
            ScalarType::Bool
        } else if is_int(text) {
            ScalarType::Int
        } else if is_float(text) {
            ScalarType::Float
        } else {
            ScalarType::Str
        }
    }

    /// Type of an explicitly tagged scalar (`!!int 1`), by tag suffix
    pub fn from_tag(suffix: &str) -> Option<Self> {
        match suffix {
            "null" => Some(ScalarType::Null),
            "bool" => Some(ScalarType::Bool),
            "int" => Some(ScalarType::Int),
            "float" => Some(ScalarType::Float),
            "str" => Some(ScalarType::Str),
            _ => None,
        }
    }
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

fn is_bool(text: &str) -> bool {
    matches!(
        text,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE"
    )
}

fn is_int(text: &str) -> bool {
    if let Some(octal) = text.strip_prefix("0o") {
        return !octal.is_empty() && octal.chars().all(|c| c.is_digit(8));
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }

    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_float(text: &str) -> bool {
    if matches!(text, ".nan" | ".NaN" | ".NAN") {
        return true;
    }

    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    if matches!(unsigned, ".inf" | ".Inf" | ".INF") {
        return true;
    }

    // [0-9]*(\.[0-9]*)?([eE][-+]?[0-9]+)? with at least one mantissa digit
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(split) => (&unsigned[..split], Some(&unsigned[split + 1..])),
        None => (unsigned, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    if !all_digits(whole) || !all_digits(fraction) {
        return false;
    }

    match exponent {
        None => true,
        Some(exponent) => {
            let exponent = exponent.strip_prefix(['-', '+']).unwrap_or(exponent);
            !exponent.is_empty() && all_digits(exponent)
        }
    }
}

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(Value, Value)>),
}

impl Value {
    /// Typed value of a scalar's raw text
    pub fn from_scalar(text: &str, ty: ScalarType) -> Self {
        match ty {
            ScalarType::Null => Value::Null,
            ScalarType::Bool => match text {
                "true" | "True" | "TRUE" => Value::Boolean(true),
                "false" | "False" | "FALSE" => Value::Boolean(false),
                _ => text.into(),
            },
            ScalarType::Int => parse_int(text)
                .map(Value::Integer)
                .or_else(|| parse_float(text).map(Value::Decimal))
                .unwrap_or_else(|| text.into()),
            ScalarType::Float => parse_float(text)
                .map(Value::Decimal)
                .unwrap_or_else(|| text.into()),
            ScalarType::Str => text.into(),
        }
    }

    /// Build the value of `node` and everything below it
    pub fn from_node(document: &Document, node: NodeId) -> Self {
        match document.data(node) {
            NodeData::Scalar(scalar) => Value::from_scalar(&scalar.text, scalar.ty),
            NodeData::Sequence => Value::Array(
                document
                    .children(node)
                    .iter()
                    .map(|item| Value::from_node(document, *item))
                    .collect(),
            ),
            NodeData::Mapping => Value::Object(
                document
                    .entries(node)
                    .map(|(key, value)| {
                        (
                            Value::from_node(document, key),
                            Value::from_node(document, value),
                        )
                    })
                    .collect(),
            ),
            NodeData::Document => document
                .content()
                .map(|content| Value::from_node(document, content))
                .unwrap_or(Value::Null),
        }
    }
}

fn parse_int(text: &str) -> Option<i64> {
    if let Some(octal) = text.strip_prefix("0o") {
        return i64::from_str_radix(octal, 8).ok();
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    text.strip_prefix('+').unwrap_or(text).parse().ok()
}

fn parse_float(text: &str) -> Option<f64> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let magnitude = match unsigned {
        ".inf" | ".Inf" | ".INF" => f64::INFINITY,
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => unsigned.parse().ok()?,
    };

    Some(if negative { -magnitude } else { magnitude })
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&Document> for Value {
    fn from(document: &Document) -> Self {
        Value::from_node(document, document.root())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}
