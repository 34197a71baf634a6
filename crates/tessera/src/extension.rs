//! Extensions bundle block types, type extensions and a type guesser.
//!
//! Most extensions implement [`ExtensionLoader`] and are wrapped in a
//! [`LazyExtension`], which loads each of the three parts on first access
//! and keeps it for the extension's lifetime. [`PreloadedExtension`] holds
//! parts that were created up front.

use std::{cell::OnceCell, fmt, rc::Rc};

use indexmap::IndexMap;
use log::debug;

use crate::{
    block_type::{BlockType, BlockTypeExtension},
    error::{BlockError, Result},
    guess::BlockTypeGuesser,
};

/// A bundle of types, type extensions and an optional guesser.
pub trait BlockExtension {
    /// Returns the type registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidArgument`] if this extension has no such
    /// type.
    fn get_type(&self, name: &str) -> Result<Rc<dyn BlockType>>;

    fn has_type(&self, name: &str) -> bool;

    /// Names of the types provided by this extension.
    fn type_names(&self) -> Vec<String>;

    /// Returns the extensions for the type `name`, in registration order.
    fn type_extensions(&self, name: &str) -> Vec<Rc<dyn BlockTypeExtension>>;

    fn has_type_extensions(&self, name: &str) -> bool {
        !self.type_extensions(name).is_empty()
    }

    /// Names of all types decorated by this extension's type extensions.
    fn extended_type_names(&self) -> Vec<String>;

    fn type_guesser(&self) -> Option<Rc<dyn BlockTypeGuesser>>;
}

/// Supplies the parts of a [`LazyExtension`].
pub trait ExtensionLoader {
    fn load_types(&self) -> Vec<Rc<dyn BlockType>> {
        Vec::new()
    }

    fn load_type_extensions(&self) -> Vec<Rc<dyn BlockTypeExtension>> {
        Vec::new()
    }

    fn load_type_guesser(&self) -> Option<Rc<dyn BlockTypeGuesser>> {
        None
    }
}

type TypeMap = IndexMap<String, Rc<dyn BlockType>>;
type TypeExtensionMap = IndexMap<String, Vec<Rc<dyn BlockTypeExtension>>>;

fn index_types(types: Vec<Rc<dyn BlockType>>) -> TypeMap {
    types
        .into_iter()
        .map(|ty| (ty.name().to_owned(), ty))
        .collect()
}

fn index_type_extensions(extensions: Vec<Rc<dyn BlockTypeExtension>>) -> TypeExtensionMap {
    let mut indexed = TypeExtensionMap::new();
    for extension in extensions {
        for extended in extension.extended_types() {
            indexed
                .entry(extended.to_owned())
                .or_default()
                .push(Rc::clone(&extension));
        }
    }
    indexed
}

fn type_not_in_extension(name: &str) -> BlockError {
    BlockError::InvalidArgument(format!(
        "The type \"{name}\" cannot be loaded by this extension"
    ))
}

/// An extension that loads its parts on first access.
pub struct LazyExtension<L> {
    loader: L,
    types: OnceCell<TypeMap>,
    type_extensions: OnceCell<TypeExtensionMap>,
    guesser: OnceCell<Option<Rc<dyn BlockTypeGuesser>>>,
}

impl<L: ExtensionLoader> LazyExtension<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            types: OnceCell::new(),
            type_extensions: OnceCell::new(),
            guesser: OnceCell::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    fn types(&self) -> &TypeMap {
        self.types.get_or_init(|| {
            let types = index_types(self.loader.load_types());
            debug!(types_count = types.len(); "Loaded extension types");
            types
        })
    }

    fn extensions(&self) -> &TypeExtensionMap {
        self.type_extensions
            .get_or_init(|| index_type_extensions(self.loader.load_type_extensions()))
    }
}

impl<L: ExtensionLoader> BlockExtension for LazyExtension<L> {
    fn get_type(&self, name: &str) -> Result<Rc<dyn BlockType>> {
        self.types()
            .get(name)
            .cloned()
            .ok_or_else(|| type_not_in_extension(name))
    }

    fn has_type(&self, name: &str) -> bool {
        self.types().contains_key(name)
    }

    fn type_names(&self) -> Vec<String> {
        self.types().keys().cloned().collect()
    }

    fn type_extensions(&self, name: &str) -> Vec<Rc<dyn BlockTypeExtension>> {
        self.extensions().get(name).cloned().unwrap_or_default()
    }

    fn has_type_extensions(&self, name: &str) -> bool {
        self.extensions().contains_key(name)
    }

    fn extended_type_names(&self) -> Vec<String> {
        self.extensions().keys().cloned().collect()
    }

    fn type_guesser(&self) -> Option<Rc<dyn BlockTypeGuesser>> {
        self.guesser
            .get_or_init(|| self.loader.load_type_guesser())
            .clone()
    }
}

impl<L> fmt::Debug for LazyExtension<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyExtension")
            .field("types_loaded", &self.types.get().is_some())
            .field("type_extensions_loaded", &self.type_extensions.get().is_some())
            .field("guesser_loaded", &self.guesser.get().is_some())
            .finish()
    }
}

/// An extension whose parts are supplied at construction.
#[derive(Default)]
pub struct PreloadedExtension {
    types: TypeMap,
    type_extensions: TypeExtensionMap,
    guesser: Option<Rc<dyn BlockTypeGuesser>>,
}

impl PreloadedExtension {
    pub fn new(
        types: Vec<Rc<dyn BlockType>>,
        type_extensions: Vec<Rc<dyn BlockTypeExtension>>,
        guesser: Option<Rc<dyn BlockTypeGuesser>>,
    ) -> Self {
        Self {
            types: index_types(types),
            type_extensions: index_type_extensions(type_extensions),
            guesser,
        }
    }

    pub fn with_type(mut self, ty: Rc<dyn BlockType>) -> Self {
        self.types.insert(ty.name().to_owned(), ty);
        self
    }

    pub fn with_type_extension(mut self, extension: Rc<dyn BlockTypeExtension>) -> Self {
        for extended in extension.extended_types() {
            self.type_extensions
                .entry(extended.to_owned())
                .or_default()
                .push(Rc::clone(&extension));
        }
        self
    }

    pub fn with_guesser(mut self, guesser: Rc<dyn BlockTypeGuesser>) -> Self {
        self.guesser = Some(guesser);
        self
    }
}

impl BlockExtension for PreloadedExtension {
    fn get_type(&self, name: &str) -> Result<Rc<dyn BlockType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| type_not_in_extension(name))
    }

    fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    fn type_extensions(&self, name: &str) -> Vec<Rc<dyn BlockTypeExtension>> {
        self.type_extensions.get(name).cloned().unwrap_or_default()
    }

    fn has_type_extensions(&self, name: &str) -> bool {
        self.type_extensions.contains_key(name)
    }

    fn extended_type_names(&self) -> Vec<String> {
        self.type_extensions.keys().cloned().collect()
    }

    fn type_guesser(&self) -> Option<Rc<dyn BlockTypeGuesser>> {
        self.guesser.clone()
    }
}

impl fmt::Debug for PreloadedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadedExtension")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("type_extensions", &self.type_extensions.keys().collect::<Vec<_>>())
            .field("guesser", &self.guesser.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Named(&'static str);

    impl BlockType for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    struct Decorator(Vec<&'static str>);

    impl BlockTypeExtension for Decorator {
        fn extended_types(&self) -> Vec<&str> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        type_loads: Cell<usize>,
    }

    impl ExtensionLoader for CountingLoader {
        fn load_types(&self) -> Vec<Rc<dyn BlockType>> {
            self.type_loads.set(self.type_loads.get() + 1);
            vec![Rc::new(Named("text")), Rc::new(Named("number"))]
        }

        fn load_type_extensions(&self) -> Vec<Rc<dyn BlockTypeExtension>> {
            vec![
                Rc::new(Decorator(vec!["text", "number"])),
                Rc::new(Decorator(vec!["text"])),
            ]
        }
    }

    #[test]
    fn test_lazy_extension_loads_types_once() {
        let extension = LazyExtension::new(CountingLoader::default());
        assert_eq!(extension.loader().type_loads.get(), 0);

        assert!(extension.has_type("text"));
        assert!(extension.get_type("number").is_ok());
        assert!(!extension.has_type("date"));
        assert_eq!(extension.loader().type_loads.get(), 1);
    }

    #[test]
    fn test_unknown_type_is_invalid_argument() {
        let extension = LazyExtension::new(CountingLoader::default());
        let err = extension.get_type("date").err().unwrap();
        assert!(matches!(err, BlockError::InvalidArgument(_)));
    }

    #[test]
    fn test_type_extensions_are_indexed_by_extended_type() {
        let extension = LazyExtension::new(CountingLoader::default());
        assert_eq!(extension.type_extensions("text").len(), 2);
        assert_eq!(extension.type_extensions("number").len(), 1);
        assert!(!extension.has_type_extensions("date"));
        assert_eq!(extension.extended_type_names(), ["text", "number"]);
        assert!(extension.type_guesser().is_none());
    }

    #[test]
    fn test_preloaded_extension() {
        let extension = PreloadedExtension::default()
            .with_type(Rc::new(Named("money")))
            .with_type_extension(Rc::new(Decorator(vec!["money"])));
        assert_eq!(extension.type_names(), ["money"]);
        assert!(extension.has_type_extensions("money"));
        assert_eq!(extension.get_type("money").unwrap().name(), "money");
    }
}
