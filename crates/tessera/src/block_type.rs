//! Block types and type extensions.
//!
//! A [`BlockType`] is a named unit of behavior. It declares its options,
//! optionally names a parent type whose behavior it inherits, and hooks
//! into four lifecycle stages:
//!
//! - `build_block` / `finish_block` configure a [`BlockBuilder`]
//! - `build_view` / `finish_view` fill the variables of a [`BlockView`]
//!
//! A [`BlockTypeExtension`] attaches the same hooks to existing types by
//! name, without subclassing them.
//!
//! All hooks have no-op defaults, so an implementation only overrides what
//! it needs.
//!
//! # Example
//!
//! ```
//! use tessera::{BlockType, Result};
//! use tessera_core::OptionsResolver;
//!
//! struct EmailType;
//!
//! impl BlockType for EmailType {
//!     fn name(&self) -> &str {
//!         "email"
//!     }
//!
//!     fn parent(&self) -> Option<&str> {
//!         Some("text")
//!     }
//!
//!     fn configure_options(&self, resolver: &mut OptionsResolver) -> Result<()> {
//!         resolver.set_default("placeholder", "name@example.com");
//!         Ok(())
//!     }
//! }
//! ```

use std::{fmt, rc::Rc};

use tessera_core::{Options, OptionsResolver};

use crate::{block::Block, builder::BlockBuilder, error::Result, view::BlockView};

/// A named block type.
pub trait BlockType {
    /// The unique name of the type, used as its registry key.
    fn name(&self) -> &str;

    /// The prefix used to build template block names for this type.
    ///
    /// Defaults to the type name.
    fn block_prefix(&self) -> &str {
        self.name()
    }

    /// The name of the parent type, if any.
    fn parent(&self) -> Option<&str> {
        None
    }

    /// Declares the options accepted by this type.
    ///
    /// The resolver already carries the options of the parent type.
    fn configure_options(&self, _resolver: &mut OptionsResolver) -> Result<()> {
        Ok(())
    }

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn finish_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn build_view(&self, _view: &BlockView, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    /// Called once the views of all children have been built.
    fn finish_view(&self, _view: &BlockView, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    /// Called when `child` is attached to a block of this type.
    fn add_child(&self, _block: &Block, _child: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn remove_child(&self, _block: &Block, _child: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    /// Called when a block of this type is attached to `parent`.
    fn add_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn remove_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }
}

/// Behavior attached to existing block types.
pub trait BlockTypeExtension {
    /// Names of the types this extension decorates.
    fn extended_types(&self) -> Vec<&str>;

    /// Adds or overrides options of the extended types.
    fn configure_options(&self, _resolver: &mut OptionsResolver) -> Result<()> {
        Ok(())
    }

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn finish_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn build_view(&self, _view: &BlockView, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }

    fn finish_view(&self, _view: &BlockView, _block: &Block, _options: &Options) -> Result<()> {
        Ok(())
    }
}

/// A reference to a block type, either by registry name or by instance.
#[derive(Clone)]
pub enum TypeRef {
    Name(String),
    /// An unregistered type instance, resolved on the fly.
    Instance(Rc<dyn BlockType>),
}

impl TypeRef {
    /// Returns the name of the referenced type.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Instance(ty) => ty.name(),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Instance(ty) => f.debug_tuple("Instance").field(&ty.name()).finish(),
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Rc<dyn BlockType>> for TypeRef {
    fn from(ty: Rc<dyn BlockType>) -> Self {
        Self::Instance(ty)
    }
}
