//! Value types stored in config nodes

use crate::text;

/// The value held by a config node
///
/// Exactly one representation is active at a time. Setting a node replaces
/// both the payload and the type.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value (pure container node)
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Single byte character
    Char(u8),
    /// Signed 32-bit integer
    Int(i32),
    /// 32-bit float
    Float(f32),
    /// Unsigned 32-bit integer
    UInt(u32),
    /// String value
    String(String),
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::UInt(_) => "uint32",
            Value::String(_) => "string",
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse a literal, choosing the narrowest type that matches
    ///
    /// Tries `true`/`false`, then `5u` style unsigned, signed integers,
    /// unsigned integers too large for `i32`, floats and `'c'` character
    /// literals. Anything else is kept as a string.
    pub fn parse_literal(text: &str) -> Value {
        match text {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Some(digits) = text.strip_suffix('u') {
            if let Ok(u) = digits.parse::<u32>() {
                return Value::UInt(u);
            }
        }
        if let Ok(i) = text.parse::<i32>() {
            return Value::Int(i);
        }
        if let Ok(u) = text.parse::<u32>() {
            return Value::UInt(u);
        }
        if let Ok(f) = text.parse::<f32>() {
            return Value::Float(f);
        }
        if let Some(c) = text::parse_char_literal(text) {
            return Value::Char(c);
        }
        Value::String(text.to_string())
    }

    /// Coerce to bool
    ///
    /// Numbers are true when non-zero, strings when they parse to a true
    /// literal or a non-zero number.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(*b),
            Value::Char(c) => Some(*c != 0),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::UInt(u) => Some(*u != 0),
            Value::String(s) => Self::parse_numeric(s)?.as_bool(),
        }
    }

    /// Coerce to i32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(*b as i32),
            Value::Char(c) => Some(*c as i32),
            Value::Int(i) => Some(*i),
            Value::Float(f) => {
                if f.is_finite() && *f >= i32::MIN as f32 && *f <= i32::MAX as f32 {
                    Some(*f as i32)
                } else {
                    None
                }
            }
            Value::UInt(u) => i32::try_from(*u).ok(),
            Value::String(s) => Self::parse_numeric(s)?.as_i32(),
        }
    }

    /// Coerce to u32
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(*b as u32),
            Value::Char(c) => Some(*c as u32),
            Value::Int(i) => u32::try_from(*i).ok(),
            Value::Float(f) => {
                if f.is_finite() && *f >= 0.0 && *f <= u32::MAX as f32 {
                    Some(*f as u32)
                } else {
                    None
                }
            }
            Value::UInt(u) => Some(*u),
            Value::String(s) => Self::parse_numeric(s)?.as_u32(),
        }
    }

    /// Coerce to f32
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Char(c) => Some(*c as f32),
            Value::Int(i) => Some(*i as f32),
            Value::Float(f) => Some(*f),
            Value::UInt(u) => Some(*u as f32),
            Value::String(s) => Self::parse_numeric(s)?.as_f32(),
        }
    }

    /// Coerce to a single byte character
    pub fn as_char(&self) -> Option<u8> {
        match self {
            Value::Char(c) => Some(*c),
            Value::String(s) if s.len() == 1 => s.bytes().next(),
            other => other.as_u32().and_then(|u| u8::try_from(u).ok()),
        }
    }

    /// Borrow the string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Plain text form of the value (strings unquoted, null empty)
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => (*c as char).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{:?}", f),
            Value::UInt(u) => u.to_string(),
            Value::String(s) => s.clone(),
        }
    }

    /// Parse a string that holds a non-string literal
    fn parse_numeric(s: &str) -> Option<Value> {
        match Self::parse_literal(s.trim()) {
            Value::String(_) => None,
            v => Some(v),
        }
    }
}

/// Values compare per active type; floats compare numerically, with NaN
/// equal to NaN so that a tree always equals its own copy.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u8> for Value {
    fn from(c: u8) -> Self {
        Value::Char(c)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::UInt(u)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        let v = Value::from(42i32);
        assert_eq!(v.as_i32(), Some(42));
        assert_eq!(v.as_u32(), Some(42));
        assert_eq!(v.as_f32(), Some(42.0));
        assert_eq!(v.as_bool(), Some(true));

        let v = Value::from(3.75f32);
        assert_eq!(v.as_i32(), Some(3));
        assert_eq!(v.as_f32(), Some(3.75));

        let v = Value::from("hello");
        assert_eq!(v.as_str(), Some("hello"));
        assert_eq!(v.as_i32(), None);

        let v = Value::from(-1i32);
        assert_eq!(v.as_u32(), None);
    }

    #[test]
    fn test_parse_literal_narrowest() {
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal("false"), Value::Bool(false));
        assert_eq!(Value::parse_literal("-12"), Value::Int(-12));
        assert_eq!(Value::parse_literal("7u"), Value::UInt(7));
        assert_eq!(Value::parse_literal("3000000000"), Value::UInt(3_000_000_000));
        assert_eq!(Value::parse_literal("1.5"), Value::Float(1.5));
        assert_eq!(Value::parse_literal("1e3"), Value::Float(1000.0));
        assert_eq!(Value::parse_literal("'x'"), Value::Char(b'x'));
        assert_eq!(
            Value::parse_literal("grass"),
            Value::String("grass".to_string())
        );
    }

    #[test]
    fn test_numeric_strings_coerce() {
        let v = Value::from("12");
        assert_eq!(v.as_i32(), Some(12));
        assert_eq!(v.as_bool(), Some(true));
        assert_eq!(Value::from("false").as_bool(), Some(false));
    }

    #[test]
    fn test_float_equality_includes_nan() {
        assert_eq!(Value::Float(f32::NAN), Value::Float(f32::NAN));
        assert_ne!(Value::Float(1.0), Value::Int(1));
    }

    #[test]
    fn test_out_of_range_float() {
        assert_eq!(Value::Float(1e20).as_i32(), None);
        assert_eq!(Value::Float(f32::INFINITY).as_u32(), None);
    }
}
