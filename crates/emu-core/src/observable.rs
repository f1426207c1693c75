//! Read-only inspection of chip state.
//!
//! Debuggers and tests look at chip internals through string paths. A query
//! never changes emulation state.

use std::collections::BTreeMap;
use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Signed register contents such as bitplane modulos.
    I16(i16),
    String(String),
    Array(Vec<Value>),
    /// Keys are kept sorted so listings are stable between runs.
    Map(BTreeMap<String, Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i16 => I16,
    String => String,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a property by dotted path, e.g. `beam.v` or `agnus.dmacon`.
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// All paths accepted by `query()`.
    fn query_paths(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_display_as_hex() {
        assert_eq!(Value::from(0x0200u16).to_string(), "0x0200");
        assert_eq!(Value::from(0x2Cu8).to_string(), "0x2C");
        assert_eq!(Value::from(-2i16).to_string(), "-2");
    }

    #[test]
    fn map_listing_is_sorted() {
        let mut map = BTreeMap::new();
        map.insert("refresh".to_string(), Value::U64(4));
        map.insert("bitplane".to_string(), Value::U64(80));
        assert_eq!(Value::Map(map).to_string(), "{bitplane: 80, refresh: 4}");
    }

    #[test]
    fn vec_converts_element_wise() {
        let v: Value = vec![1u8, 2u8].into();
        assert_eq!(v, Value::Array(vec![Value::U8(1), Value::U8(2)]));
    }
}
