//! The built-in block types.
//!
//! [`CoreExtension`] provides the root `block` type every other type
//! descends from, and the `text` leaf type used when a child is added
//! without a type.

mod base;
mod text;

use std::rc::Rc;

pub use base::BaseType;
pub use text::TextType;

use crate::{
    block_type::BlockType,
    error::Result,
    extension::{ExtensionLoader, LazyExtension},
    factory::BlockFactory,
    registry::BlockRegistry,
};

/// Name of the root block type.
pub const BLOCK_TYPE: &str = "block";

/// Name of the text leaf type.
pub const TEXT_TYPE: &str = "text";

/// Loads the built-in types.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreExtension;

impl ExtensionLoader for CoreExtension {
    fn load_types(&self) -> Vec<Rc<dyn BlockType>> {
        vec![Rc::new(BaseType), Rc::new(TextType)]
    }
}

/// Creates a factory over a registry holding only the built-in types.
pub fn create_block_factory() -> Result<BlockFactory> {
    let registry = BlockRegistry::builder()
        .with_extension(LazyExtension::new(CoreExtension))
        .build()?;
    Ok(BlockFactory::new(registry))
}
