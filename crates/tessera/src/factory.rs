//! The block factory.
//!
//! [`BlockFactory`] is the entry point for creating blocks. It resolves a
//! type through the registry, asks the resolved type for a builder with
//! validated options and runs the type's build pipeline over it:
//!
//! ```text
//! type name -> ResolvedBlockType -> BlockBuilder -> build_block -> finish_block -> Block
//! ```
//!
//! Blocks for data class properties go through the registry's type guesser
//! instead of an explicit type.

use std::{fmt, rc::Rc};

use log::debug;

use tessera_core::{Options, Value};

use crate::{
    block::Block,
    block_type::TypeRef,
    builder::BlockBuilder,
    builtin::TEXT_TYPE,
    error::Result,
    registry::BlockRegistry,
    resolved::ResolvedBlockType,
};

/// Creates blocks and block builders.
///
/// Cloning a factory is cheap; clones share the registry.
#[derive(Clone)]
pub struct BlockFactory {
    registry: Rc<BlockRegistry>,
}

impl BlockFactory {
    pub fn new(registry: BlockRegistry) -> Self {
        Self {
            registry: Rc::new(registry),
        }
    }

    pub fn from_shared(registry: Rc<BlockRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Rc<BlockRegistry> {
        &self.registry
    }

    /// Creates a block named after its type's block prefix.
    pub fn create(
        &self,
        block_type: impl Into<TypeRef>,
        data: impl Into<Value>,
        options: Options,
    ) -> Result<Block> {
        self.create_builder(block_type, data, options)?.get_block()
    }

    pub fn create_named(
        &self,
        name: &str,
        block_type: impl Into<TypeRef>,
        data: impl Into<Value>,
        options: Options,
    ) -> Result<Block> {
        self.create_named_builder(name, block_type, data, options)?
            .get_block()
    }

    /// Creates a block for `property` of `class`, with a guessed type.
    pub fn create_for_property(
        &self,
        class: &str,
        property: &str,
        data: impl Into<Value>,
        options: Options,
    ) -> Result<Block> {
        self.create_builder_for_property(class, property, data, options)?
            .get_block()
    }

    /// Creates a builder named after its type's block prefix.
    pub fn create_builder(
        &self,
        block_type: impl Into<TypeRef>,
        data: impl Into<Value>,
        options: Options,
    ) -> Result<BlockBuilder> {
        let block_type = block_type.into();
        let resolved = self.registry.resolve(&block_type)?;
        let name = resolved.block_prefix().to_owned();
        self.build_resolved(&name, resolved, data.into(), options)
    }

    /// Creates a builder of `block_type` named `name`.
    ///
    /// Non-null `data` becomes the `data` option of the block.
    ///
    /// # Errors
    ///
    /// Returns an error if the type cannot be resolved, the options are
    /// invalid, or a build hook fails.
    pub fn create_named_builder(
        &self,
        name: &str,
        block_type: impl Into<TypeRef>,
        data: impl Into<Value>,
        options: Options,
    ) -> Result<BlockBuilder> {
        let resolved = self.registry.resolve(&block_type.into())?;
        self.build_resolved(name, resolved, data.into(), options)
    }

    /// Creates a builder for `property` of `class`.
    ///
    /// The type and its options come from the registry's type guesser;
    /// options passed here override guessed ones. Without a guess the
    /// property becomes a `text` block.
    pub fn create_builder_for_property(
        &self,
        class: &str,
        property: &str,
        data: impl Into<Value>,
        options: Options,
    ) -> Result<BlockBuilder> {
        let guess = self
            .registry
            .type_guesser()
            .and_then(|guesser| guesser.guess_type(class, property));

        let (block_type, options) = match guess {
            Some(guess) => {
                debug!(class, property, type_name = guess.type_name(), confidence:? = guess.confidence(); "Guessed block type");
                let mut merged = guess.options().clone();
                merged.extend(options);
                (guess.type_name().to_owned(), merged)
            }
            None => (TEXT_TYPE.to_owned(), options),
        };
        self.create_named_builder(property, block_type, data, options)
    }

    fn build_resolved(
        &self,
        name: &str,
        resolved: Rc<ResolvedBlockType>,
        data: Value,
        mut options: Options,
    ) -> Result<BlockBuilder> {
        if !data.is_null() {
            options.insert("data".to_owned(), data);
        }

        let mut builder = resolved.create_builder(self, name, options)?;
        let options = builder.options().clone();
        resolved.build_block(&mut builder, &options)?;
        resolved.finish_block(&mut builder, &options)?;
        Ok(builder)
    }
}

/// Factories are equal when they share a registry.
impl PartialEq for BlockFactory {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }
}

impl fmt::Debug for BlockFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockFactory")
            .field("registry", &self.registry)
            .finish()
    }
}
