//! Tessera Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Tessera block
//! framework. It includes:
//!
//! - **Values**: The dynamic [`Value`] tree used for options, block data and
//!   view variables ([`value`] module)
//! - **Options**: The option schema resolver ([`options::OptionsResolver`])
//! - **Property paths**: Parsing and reading of `a.b[c]` style paths
//!   ([`property_path`] module)
//! - **Names**: Block name validation and generation ([`name`] module)

pub mod name;
pub mod options;
pub mod property_path;
pub mod value;

pub use options::{OptionsAccess, OptionsError, OptionsResolver};
pub use property_path::{PathError, PropertyPath};
pub use value::{Map, Options, Value, ValueKind};
