//! Tessera - typed block trees with themed rendering.
//!
//! A block is a node of a tree of structured input/output widgets. Blocks are
//! created from named types registered by extensions:
//!
//! - [`BlockRegistry`] resolves a type name into a [`ResolvedBlockType`],
//!   linking its parent types and the type extensions targeting it.
//! - [`BlockFactory`] and [`BlockBuilder`] assemble the block tree, validating
//!   options against the merged schema of the type chain.
//! - [`Block`] holds data in its model, normalized and view forms, maps it
//!   onto its children and builds a [`BlockView`] tree.
//! - [`render::BlockRenderer`] renders views with theme fragments found by
//!   walking each view's block-prefix hierarchy.
//!
//! # Example
//!
//! ```
//! use tessera::{Value, builtin, options};
//!
//! let factory = builtin::create_block_factory().unwrap();
//! let mut builder = factory
//!     .create_builder(builtin::BLOCK_TYPE, Value::Null, options! {})
//!     .unwrap();
//! builder.add_named(Some("email"), None, options! {}).unwrap();
//!
//! let block = builder.get_block().unwrap();
//! block.set_data(options! { "email" => "ada@example.com" }).unwrap();
//! assert_eq!(
//!     block.get("email").unwrap().data().unwrap(),
//!     Value::from("ada@example.com")
//! );
//! ```

pub mod builtin;
pub mod config;
pub mod render;

mod block;
mod block_config;
mod block_type;
mod builder;
mod error;
mod events;
mod extension;
mod factory;
mod guess;
mod mapper;
mod registry;
mod resolved;
mod transformer;
mod view;

pub use tessera_core::{
    Map, Options, OptionsError, OptionsResolver, PathError, PropertyPath, Value, ValueKind, name,
    options,
};

pub use block::Block;
pub use block_config::{BlockConfig, BlockConfigBuilder, EmptyData};
pub use block_type::{BlockType, BlockTypeExtension, TypeRef};
pub use builder::BlockBuilder;
pub use error::{BlockError, Result};
pub use events::{BlockEvent, BlockEvents, EventDispatcher, EventSubscriber, Listener};
pub use extension::{BlockExtension, ExtensionLoader, LazyExtension, PreloadedExtension};
pub use factory::BlockFactory;
pub use guess::{BlockTypeGuesser, BlockTypeGuesserChain, Confidence, TypeGuess};
pub use mapper::{DataMapper, InheritDataAwareIter, PropertyPathMapper};
pub use registry::{BlockRegistry, BlockRegistryBuilder, TypeConstructor};
pub use resolved::{PASSED_OPTIONS_ATTRIBUTE, ResolvedBlockType};
pub use transformer::{CallbackTransformer, DataTransformer, TransformerChain, expect_kind};
pub use view::BlockView;
