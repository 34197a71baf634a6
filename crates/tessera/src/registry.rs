//! The block type registry.
//!
//! A [`BlockRegistry`] resolves type names to [`ResolvedBlockType`]s. It
//! searches its extensions in registration order (the first extension that
//! provides a name wins), links the type to the type extensions every
//! extension contributes for it, resolves the parent chain and caches the
//! result for the registry's lifetime.
//!
//! Types not provided by any extension can be registered as type
//! constructors; they are only instantiated when no extension knows the
//! name.
//!
//! # Example
//!
//! ```
//! use tessera::{BlockRegistry, LazyExtension, builtin::CoreExtension};
//!
//! let registry = BlockRegistry::builder()
//!     .with_extension(LazyExtension::new(CoreExtension))
//!     .build()
//!     .unwrap();
//!
//! let text = registry.get_type("text").unwrap();
//! assert_eq!(text.parent().map(|parent| parent.name()), Some("block"));
//! assert!(!registry.has_type("missing").unwrap());
//! ```

use std::{
    cell::{OnceCell, RefCell},
    fmt,
    rc::Rc,
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use crate::{
    block_type::{BlockType, TypeRef},
    error::{BlockError, Result},
    extension::BlockExtension,
    guess::{BlockTypeGuesser, BlockTypeGuesserChain},
    resolved::ResolvedBlockType,
};

/// Creates a block type that is not provided by an extension.
pub type TypeConstructor = Rc<dyn Fn() -> Rc<dyn BlockType>>;

/// Resolves and caches block types.
pub struct BlockRegistry {
    extensions: Vec<Rc<dyn BlockExtension>>,
    constructors: IndexMap<String, TypeConstructor>,
    types: RefCell<IndexMap<String, Rc<ResolvedBlockType>>>,
    resolving: RefCell<IndexSet<String>>,
    guesser: OnceCell<Option<Rc<dyn BlockTypeGuesser>>>,
}

impl BlockRegistry {
    /// Creates a registry over `extensions` without validating them.
    ///
    /// Prefer [`BlockRegistry::builder`], which checks that every extended
    /// type exists.
    pub fn new(extensions: Vec<Rc<dyn BlockExtension>>) -> Self {
        Self {
            extensions,
            constructors: IndexMap::new(),
            types: RefCell::new(IndexMap::new()),
            resolving: RefCell::new(IndexSet::new()),
            guesser: OnceCell::new(),
        }
    }

    pub fn builder() -> BlockRegistryBuilder {
        BlockRegistryBuilder::default()
    }

    pub fn extensions(&self) -> &[Rc<dyn BlockExtension>] {
        &self.extensions
    }

    /// Returns the resolved type registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`BlockError::TypeNotFound`] if neither an extension nor a type
    ///   constructor provides `name`
    /// - [`BlockError::Logic`] if the parent chain of the type is circular
    pub fn get_type(&self, name: &str) -> Result<Rc<ResolvedBlockType>> {
        if let Some(resolved) = self.types.borrow().get(name) {
            return Ok(Rc::clone(resolved));
        }

        let inner = self.find_type(name)?;
        let resolved = self.resolve_type(inner)?;
        self.types
            .borrow_mut()
            .insert(name.to_owned(), Rc::clone(&resolved));
        debug!(type_name = name, extensions_count = resolved.type_extensions().len(); "Resolved block type");
        Ok(resolved)
    }

    /// Resolves a type reference.
    ///
    /// Named types go through [`BlockRegistry::get_type`]. Type instances
    /// are linked on the fly and not cached; their parent is looked up by
    /// name.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<Rc<ResolvedBlockType>> {
        match type_ref {
            TypeRef::Name(name) => self.get_type(name),
            TypeRef::Instance(ty) => self.resolve_type(Rc::clone(ty)),
        }
    }

    /// Returns whether `name` can be resolved.
    ///
    /// # Errors
    ///
    /// Errors other than [`BlockError::TypeNotFound`] are propagated.
    pub fn has_type(&self, name: &str) -> Result<bool> {
        if self.types.borrow().contains_key(name) {
            return Ok(true);
        }
        match self.get_type(name) {
            Ok(_) => Ok(true),
            Err(BlockError::TypeNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Returns a guesser chaining the guessers of all extensions, if any
    /// extension has one.
    pub fn type_guesser(&self) -> Option<Rc<dyn BlockTypeGuesser>> {
        self.guesser
            .get_or_init(|| {
                let guessers: Vec<_> = self
                    .extensions
                    .iter()
                    .filter_map(|extension| extension.type_guesser())
                    .collect();
                if guessers.is_empty() {
                    None
                } else {
                    Some(Rc::new(BlockTypeGuesserChain::new(guessers)) as Rc<dyn BlockTypeGuesser>)
                }
            })
            .clone()
    }

    fn find_type(&self, name: &str) -> Result<Rc<dyn BlockType>> {
        if let Some(extension) = self.extensions.iter().find(|extension| extension.has_type(name)) {
            return extension.get_type(name);
        }
        if let Some(constructor) = self.constructors.get(name) {
            trace!(type_name = name; "Constructing unregistered block type");
            return Ok(constructor());
        }

        let suggestion = self
            .extensions
            .iter()
            .flat_map(|extension| extension.type_names())
            .chain(self.constructors.keys().cloned())
            .min_by_key(|known| strsim::levenshtein(name, known))
            .filter(|known| strsim::levenshtein(name, known) <= 3);
        Err(BlockError::TypeNotFound {
            name: name.to_owned(),
            suggestion,
        })
    }

    fn resolve_type(&self, inner: Rc<dyn BlockType>) -> Result<Rc<ResolvedBlockType>> {
        let name = inner.name().to_owned();
        if !self.resolving.borrow_mut().insert(name.clone()) {
            let chain: Vec<String> = self.resolving.borrow().iter().cloned().collect();
            return Err(BlockError::logic(format!(
                "Circular reference detected for block type \"{name}\" ({} > {name})",
                chain.join(" > ")
            )));
        }

        let result = self.link_type(inner);
        self.resolving.borrow_mut().shift_remove(&name);
        result
    }

    fn link_type(&self, inner: Rc<dyn BlockType>) -> Result<Rc<ResolvedBlockType>> {
        let type_extensions: Vec<_> = self
            .extensions
            .iter()
            .flat_map(|extension| extension.type_extensions(inner.name()))
            .collect();
        let parent = match inner.parent() {
            Some(parent) => Some(self.get_type(parent)?),
            None => None,
        };
        Ok(Rc::new(ResolvedBlockType::new(inner, type_extensions, parent)))
    }
}

impl fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("extensions", &self.extensions.len())
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .field("resolved", &self.types.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Assembles a [`BlockRegistry`].
#[derive(Default)]
pub struct BlockRegistryBuilder {
    extensions: Vec<Rc<dyn BlockExtension>>,
    constructors: IndexMap<String, TypeConstructor>,
}

impl BlockRegistryBuilder {
    /// Appends an extension. Earlier extensions win on name clashes.
    pub fn with_extension(mut self, extension: impl BlockExtension + 'static) -> Self {
        self.extensions.push(Rc::new(extension));
        self
    }

    pub fn with_shared_extension(mut self, extension: Rc<dyn BlockExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Registers a constructor used when no extension provides `name`.
    pub fn with_type_constructor<F>(mut self, name: &str, constructor: F) -> Self
    where
        F: Fn() -> Rc<dyn BlockType> + 'static,
    {
        self.constructors
            .insert(name.to_owned(), Rc::new(constructor));
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidArgument`] if a type extension decorates
    /// a type that cannot be resolved.
    pub fn build(self) -> Result<BlockRegistry> {
        let mut registry = BlockRegistry::new(self.extensions);
        registry.constructors = self.constructors;

        for extension in &registry.extensions {
            for extended in extension.extended_type_names() {
                if !registry.has_type(&extended)? {
                    return Err(BlockError::InvalidArgument(format!(
                        "The extended type \"{extended}\" specified for a type extension is not registered"
                    )));
                }
            }
        }

        debug!(extensions_count = registry.extensions.len(); "Built block registry");
        Ok(registry)
    }
}
