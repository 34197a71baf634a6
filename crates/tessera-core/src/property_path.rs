//! Property paths into value trees.
//!
//! A property path addresses a value nested inside a [`Value`] tree. Dotted
//! segments (`address.city`) and bracketed segments (`[address][city]`) may be
//! mixed freely; both look up a map key, and a segment made of digits also
//! indexes into a list.
//!
//! # Example
//!
//! ```
//! use tessera_core::{PropertyPath, Value, options};
//!
//! let data = Value::from(options! {
//!     "address" => options! { "lines" => vec!["1 Main St", "Apt 2"] },
//! });
//!
//! let path: PropertyPath = "address.lines[1]".parse().unwrap();
//! assert_eq!(path.get_value(&data), Some(&Value::from("Apt 2")));
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;
use winnow::{
    Parser as _,
    combinator::{alt, delimited, preceded, repeat},
    error::ModalResult,
    token::take_while,
};

use crate::value::Value;

/// Error raised for malformed property paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid property path \"{path}\"")]
    Invalid { path: String },
}

/// One segment of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// A dotted segment such as `city` in `address.city`.
    Property(String),
    /// A bracketed segment such as `city` in `address[city]`.
    Index(String),
}

impl PathElement {
    /// Returns the key this element looks up.
    pub fn key(&self) -> &str {
        match self {
            Self::Property(key) | Self::Index(key) => key,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// A parsed property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    source: String,
    elements: Vec<PathElement>,
}

fn property<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| !matches!(c, '.' | '[' | ']')).parse_next(input)
}

fn index<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited('[', take_while(1.., |c: char| c != ']'), ']').parse_next(input)
}

fn element(input: &mut &str) -> ModalResult<PathElement> {
    alt((
        index.map(|key: &str| PathElement::Index(key.to_owned())),
        preceded('.', property).map(|key: &str| PathElement::Property(key.to_owned())),
    ))
    .parse_next(input)
}

fn path(input: &mut &str) -> ModalResult<Vec<PathElement>> {
    let first = alt((
        index.map(|key: &str| PathElement::Index(key.to_owned())),
        property.map(|key: &str| PathElement::Property(key.to_owned())),
    ))
    .parse_next(input)?;
    let rest: Vec<PathElement> = repeat(0.., element).parse_next(input)?;

    let mut elements = Vec::with_capacity(rest.len() + 1);
    elements.push(first);
    elements.extend(rest);
    Ok(elements)
}

impl PropertyPath {
    /// Parses a property path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invalid`] for empty paths, unbalanced brackets or
    /// empty segments.
    pub fn new(source: &str) -> Result<Self, PathError> {
        let elements = path.parse(source).map_err(|_| PathError::Invalid {
            path: source.to_owned(),
        })?;
        Ok(Self {
            source: source.to_owned(),
            elements,
        })
    }

    /// Builds the single-segment property path `key`.
    pub fn for_property(key: &str) -> Self {
        Self {
            source: key.to_owned(),
            elements: vec![PathElement::Property(key.to_owned())],
        }
    }

    /// Builds the single-segment index path `[key]`.
    pub fn for_index(key: &str) -> Self {
        Self {
            source: format!("[{key}]"),
            elements: vec![PathElement::Index(key.to_owned())],
        }
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Reads the value this path addresses inside `data`.
    ///
    /// Returns `None` when any segment is missing or traverses a scalar.
    pub fn get_value<'v>(&self, data: &'v Value) -> Option<&'v Value> {
        self.elements
            .iter()
            .try_fold(data, |current, element| match current {
                Value::Map(map) => map.get(element.key()),
                Value::List(items) => element
                    .key()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| items.get(idx)),
                _ => None,
            })
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
