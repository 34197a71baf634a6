//! Dynamic values for options, block data and view variables.
//!
//! Blocks carry data of arbitrary shape: a scalar for a text block, a map for
//! a compound block, a list for a collection. [`Value`] is the single tree
//! type used for all of them, and [`Map`] keeps insertion order so that
//! option and variable maps iterate the way they were declared.
//!
//! # Example
//!
//! ```
//! use tessera_core::{Value, options};
//!
//! let data = options! {
//!     "name" => "Ada",
//!     "tags" => vec!["math", "engines"],
//! };
//! let value = Value::from(data);
//!
//! assert_eq!(value.get("name").and_then(Value::as_str), Some("Ada"));
//! assert!(!value.is_empty());
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Insertion-ordered string-keyed map of values.
pub type Map = IndexMap<String, Value>;

/// Option maps are plain value maps.
pub type Options = Map;

/// A dynamically typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

/// The kind of a [`Value`], used to declare allowed option types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
}

impl ValueKind {
    /// Returns the lowercase name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for `Null` and the empty string.
    ///
    /// Empty lists and maps are *not* empty values: they are data a block
    /// can map onto its children.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Returns the value as a boolean flag, treating `Null` as `false`.
    ///
    /// Non-boolean values are truthy unless empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            other => !other.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, item)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().collect())
    }
}

/// Builds a [`Map`] from `key => value` pairs.
///
/// Keys are converted with `String::from`, values with `Value::from`.
///
/// ```
/// use tessera_core::{Value, options};
///
/// let opts = options! { "compound" => false, "label" => "Email" };
/// assert_eq!(opts.get("compound"), Some(&Value::Bool(false)));
/// assert!(options!().is_empty());
/// ```
#[macro_export]
macro_rules! options {
    () => {
        $crate::value::Map::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Map::new();
        $(
            map.insert(::std::string::String::from($key), $crate::value::Value::from($value));
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(!Value::from("a").is_empty());
        assert!(!Value::from(0).is_empty());
        assert!(!Value::List(Vec::new()).is_empty());
        assert!(!Value::Map(Map::new()).is_empty());
    }

    #[test]
    fn test_kind() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::from(1.5).kind(), ValueKind::Float);
        assert_eq!(Value::from(vec![1, 2]).kind(), ValueKind::List);
        assert_eq!(ValueKind::Map.to_string(), "map");
    }

    #[test]
    fn test_options_macro_preserves_order() {
        let map = options! { "z" => 1, "a" => 2, "m" => 3 };
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "a, b");
        assert_eq!(Value::from(options! { "k" => 1 }).to_string(), "{k: 1}");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from("yes").is_truthy());
        assert!(!Value::from(0).is_truthy());
    }
}
