//! Mapping of compound data onto child blocks.

use std::vec;

use log::trace;

use tessera_core::Value;

use crate::{
    block::Block,
    error::{BlockError, Result},
};

/// Distributes the data of a compound block over its children.
pub trait DataMapper {
    /// Sets the data of each child from `data`.
    ///
    /// `children` yields the children to map, already flattened through
    /// blocks that inherit their parent's data.
    fn map_data_to_views(&self, data: &Value, children: &mut dyn Iterator<Item = Block>) -> Result<()>;
}

/// Maps children through their property paths.
///
/// A mapped child receives the value its property path addresses inside the
/// parent data, or `Null` if the path cannot be read. Unmapped children, and
/// all children when the parent data is empty, receive their configured
/// data.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyPathMapper;

impl PropertyPathMapper {
    pub fn new() -> Self {
        Self
    }
}

impl DataMapper for PropertyPathMapper {
    fn map_data_to_views(&self, data: &Value, children: &mut dyn Iterator<Item = Block>) -> Result<()> {
        let empty = match data {
            Value::Null => true,
            Value::Map(map) => map.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        };

        for child in children {
            let config = child.config();
            match child.property_path() {
                Some(path) if !empty && config.mapped() => {
                    if !matches!(data, Value::Map(_) | Value::List(_)) {
                        return Err(BlockError::UnexpectedType {
                            expected: "map, list or null".to_owned(),
                            actual: data.kind().to_string(),
                        });
                    }
                    let value = path.get_value(data).cloned().unwrap_or_default();
                    trace!(child = child.name(), path:% = path; "Mapping child data");
                    child.set_data(value)?;
                }
                _ => {
                    child.set_data(config.data().clone())?;
                }
            }
        }
        Ok(())
    }
}

/// Iterates over blocks, descending into those that inherit their parent's
/// data.
///
/// Blocks with `inherit_data` are not yielded themselves; their children are
/// yielded in their place, recursively. This lets a data mapper reach the
/// fields of an inherit-data group as if they were direct children.
pub struct InheritDataAwareIter {
    stack: Vec<vec::IntoIter<Block>>,
}

impl InheritDataAwareIter {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            stack: vec![blocks.into_iter()],
        }
    }
}

impl Iterator for InheritDataAwareIter {
    type Item = Block;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(block) if block.config().inherit_data() => {
                    self.stack.push(block.children().into_iter());
                }
                Some(block) => return Some(block),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
