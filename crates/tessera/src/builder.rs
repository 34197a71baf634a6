//! Block builders.
//!
//! A [`BlockBuilder`] is a [`BlockConfigBuilder`] that also manages child
//! builders. Children can be added eagerly as builders, or lazily as a name
//! with an optional type and options; lazy children are only materialized
//! through the factory when they are accessed or when the block is built.
//!
//! # Example
//!
//! ```
//! use tessera::builtin;
//! use tessera_core::{Value, options};
//!
//! let factory = builtin::create_block_factory().unwrap();
//! let mut builder = factory
//!     .create_named_builder("profile", "block", Value::Null, options! {})
//!     .unwrap();
//! builder
//!     .add_named(Some("first_name"), None, options! {})
//!     .unwrap()
//!     .add_named(Some("last_name"), Some("text".into()), options! { "label" => "Surname" })
//!     .unwrap();
//!
//! let block = builder.get_block().unwrap();
//! assert_eq!(block.child_names(), ["first_name", "last_name"]);
//! ```

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use log::debug;

use tessera_core::{Options, Value, name};

use crate::{
    block::Block,
    block_config::BlockConfigBuilder,
    block_type::TypeRef,
    builtin::TEXT_TYPE,
    error::{BlockError, Result},
    factory::BlockFactory,
};

#[derive(Debug)]
enum ChildSlot {
    Resolved(BlockBuilder),
    Unresolved {
        block_type: Option<TypeRef>,
        options: Options,
    },
}

/// Builds a block and its children.
///
/// Dereferences to its [`BlockConfigBuilder`], so configuration setters and
/// getters are available directly on the builder.
#[derive(Debug)]
pub struct BlockBuilder {
    config: BlockConfigBuilder,
    children: IndexMap<String, ChildSlot>,
}

impl BlockBuilder {
    /// Creates a builder that creates children through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidArgument`] if `name` is not a valid block
    /// name.
    pub fn new(
        name: &str,
        data_class: Option<String>,
        factory: BlockFactory,
        options: Options,
    ) -> Result<Self> {
        let mut config = BlockConfigBuilder::new(name, data_class, options)?;
        config.set_factory(factory);
        Ok(Self {
            config,
            children: IndexMap::new(),
        })
    }

    fn block_factory(&self) -> Result<BlockFactory> {
        self.config.factory().cloned().ok_or_else(|| {
            BlockError::logic(format!("Builder \"{}\" has no block factory", self.name()))
        })
    }

    /// Adds a child builder, replacing any child of the same name.
    pub fn add(&mut self, child: BlockBuilder) -> &mut Self {
        self.children
            .insert(child.name().to_owned(), ChildSlot::Resolved(child));
        self
    }

    /// Adds a child that is created lazily.
    ///
    /// Without a name a unique one is generated. Without a type the child
    /// becomes a `text` block, or the guessed type for the property when
    /// this builder has a data class.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidArgument`] if `name` is not a valid block
    /// name.
    pub fn add_named(
        &mut self,
        name: Option<&str>,
        block_type: Option<TypeRef>,
        options: Options,
    ) -> Result<&mut Self> {
        let name = match name {
            Some(name) if name::is_valid_name(name) => name.to_owned(),
            Some(name) => {
                return Err(BlockError::InvalidArgument(format!(
                    "The child name \"{name}\" contains illegal characters"
                )));
            }
            None => name::create_unique_name(),
        };
        self.children.insert(
            name,
            ChildSlot::Unresolved {
                block_type,
                options,
            },
        );
        Ok(self)
    }

    /// Creates a child builder through the factory without adding it.
    pub fn create(
        &self,
        name: &str,
        block_type: Option<TypeRef>,
        options: Options,
    ) -> Result<BlockBuilder> {
        let factory = self.block_factory()?;
        match (block_type, self.data_class()) {
            (Some(block_type), _) => {
                factory.create_named_builder(name, block_type, Value::Null, options)
            }
            (None, None) => factory.create_named_builder(name, TEXT_TYPE, Value::Null, options),
            (None, Some(data_class)) => {
                factory.create_builder_for_property(data_class, name, Value::Null, options)
            }
        }
    }

    fn resolve_child(&mut self, name: &str) -> Result<()> {
        let (block_type, options) = match self.children.get(name) {
            Some(ChildSlot::Unresolved {
                block_type,
                options,
            }) => (block_type.clone(), options.clone()),
            Some(ChildSlot::Resolved(_)) => return Ok(()),
            None => return Err(BlockError::ChildNotFound(name.to_owned())),
        };

        let child = self.create(name, block_type, options)?;
        self.children
            .insert(name.to_owned(), ChildSlot::Resolved(child));
        Ok(())
    }

    /// Returns the child builder `name`, creating it first if it was added
    /// lazily.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::ChildNotFound`] if there is no such child.
    pub fn get(&mut self, name: &str) -> Result<&mut BlockBuilder> {
        self.resolve_child(name)?;
        match self.children.get_mut(name) {
            Some(ChildSlot::Resolved(child)) => Ok(child),
            _ => Err(BlockError::ChildNotFound(name.to_owned())),
        }
    }

    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.children.shift_remove(name);
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Returns whether the child `name` has been created already.
    pub fn is_resolved(&self, name: &str) -> bool {
        matches!(self.children.get(name), Some(ChildSlot::Resolved(_)))
    }

    /// Creates every lazily added child, keeping insertion order.
    pub fn resolve_children(&mut self) -> Result<()> {
        let unresolved: Vec<String> = self
            .children
            .iter()
            .filter(|(_, slot)| matches!(slot, ChildSlot::Unresolved { .. }))
            .map(|(name, _)| name.clone())
            .collect();
        for name in unresolved {
            self.resolve_child(&name)?;
        }
        Ok(())
    }

    /// Returns all child builders in insertion order, creating lazy ones.
    pub fn all(&mut self) -> Result<Vec<&BlockBuilder>> {
        self.resolve_children()?;
        Ok(self
            .children
            .values()
            .filter_map(|slot| match slot {
                ChildSlot::Resolved(child) => Some(child),
                ChildSlot::Unresolved { .. } => None,
            })
            .collect())
    }

    /// Builds the block tree.
    ///
    /// Every child is built with automatic initialization disabled; the
    /// resulting root is initialized if this builder asks for it.
    ///
    /// # Errors
    ///
    /// Returns an error if a lazy child cannot be created, if children were
    /// added to a builder that is not compound, or if initialization fails.
    pub fn get_block(&mut self) -> Result<Block> {
        self.resolve_children()?;

        let block = Block::new(self.get_block_config())?;
        for slot in self.children.values_mut() {
            if let ChildSlot::Resolved(child) = slot {
                child.set_auto_initialize(false);
                block.add(child.get_block()?)?;
            }
        }

        if self.auto_initialize() {
            block.initialize()?;
        }
        debug!(block = block.name(), children_count = block.count(); "Built block");
        Ok(block)
    }
}

impl Deref for BlockBuilder {
    type Target = BlockConfigBuilder;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

impl DerefMut for BlockBuilder {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.config
    }
}
