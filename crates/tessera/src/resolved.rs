//! Resolved block types.
//!
//! A [`ResolvedBlockType`] links a [`BlockType`] to its type extensions and
//! to the resolved form of its parent type. It owns the merged option schema
//! and the lifecycle pipeline used to build blocks and views.
//!
//! # Lifecycle order
//!
//! The pipeline is flattened once at construction: the hooks of the parent
//! chain come first (root type first), then the type extensions in
//! registration order, then the type itself. The same order applies to all
//! four stages. `finish_view` still observes complete child views because
//! [`Block::create_view`] only calls it after every child view is built.
//!
//! Attachment hooks (`add_child`, `add_parent` and their removal
//! counterparts) are delivered to the inner type only.

use std::{cell::OnceCell, fmt, rc::Rc};

use log::{debug, trace};

use tessera_core::{Options, OptionsResolver, Value};

use crate::{
    block::Block,
    block_type::{BlockType, BlockTypeExtension},
    builder::BlockBuilder,
    error::Result,
    factory::BlockFactory,
    view::BlockView,
};

/// Attribute under which the options passed by the caller are recorded.
pub const PASSED_OPTIONS_ATTRIBUTE: &str = "data_collector/passed_options";

#[derive(Clone)]
enum Hook {
    Type(Rc<dyn BlockType>),
    Extension(Rc<dyn BlockTypeExtension>),
}

impl Hook {
    fn build_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<()> {
        match self {
            Self::Type(ty) => ty.build_block(builder, options),
            Self::Extension(ext) => ext.build_block(builder, options),
        }
    }

    fn finish_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<()> {
        match self {
            Self::Type(ty) => ty.finish_block(builder, options),
            Self::Extension(ext) => ext.finish_block(builder, options),
        }
    }

    fn build_view(&self, view: &BlockView, block: &Block, options: &Options) -> Result<()> {
        match self {
            Self::Type(ty) => ty.build_view(view, block, options),
            Self::Extension(ext) => ext.build_view(view, block, options),
        }
    }

    fn finish_view(&self, view: &BlockView, block: &Block, options: &Options) -> Result<()> {
        match self {
            Self::Type(ty) => ty.finish_view(view, block, options),
            Self::Extension(ext) => ext.finish_view(view, block, options),
        }
    }
}

/// A block type linked to its extensions and its resolved parent.
pub struct ResolvedBlockType {
    inner: Rc<dyn BlockType>,
    type_extensions: Vec<Rc<dyn BlockTypeExtension>>,
    parent: Option<Rc<ResolvedBlockType>>,
    pipeline: Vec<Hook>,
    options_resolver: OnceCell<OptionsResolver>,
}

impl ResolvedBlockType {
    /// Links `inner` to its extensions and parent.
    ///
    /// # Arguments
    ///
    /// * `inner` - The wrapped block type.
    /// * `type_extensions` - Extensions decorating `inner`, in registration order.
    /// * `parent` - The resolved parent type, if `inner` names one.
    pub fn new(
        inner: Rc<dyn BlockType>,
        type_extensions: Vec<Rc<dyn BlockTypeExtension>>,
        parent: Option<Rc<ResolvedBlockType>>,
    ) -> Self {
        let mut pipeline = parent
            .as_ref()
            .map(|parent| parent.pipeline.clone())
            .unwrap_or_default();
        pipeline.extend(type_extensions.iter().cloned().map(Hook::Extension));
        pipeline.push(Hook::Type(Rc::clone(&inner)));

        Self {
            inner,
            type_extensions,
            parent,
            pipeline,
            options_resolver: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn block_prefix(&self) -> &str {
        self.inner.block_prefix()
    }

    pub fn parent(&self) -> Option<&Rc<ResolvedBlockType>> {
        self.parent.as_ref()
    }

    pub fn inner_type(&self) -> &Rc<dyn BlockType> {
        &self.inner
    }

    pub fn type_extensions(&self) -> &[Rc<dyn BlockTypeExtension>] {
        &self.type_extensions
    }

    /// Iterates from this type up to the root of its parent chain.
    pub fn ancestry(&self) -> impl Iterator<Item = &ResolvedBlockType> {
        std::iter::successors(Some(self), |ty| ty.parent.as_deref())
    }

    /// Returns the merged option schema, building it on first access.
    ///
    /// The schema extends the parent's schema with the options of the inner
    /// type, then with those of each type extension.
    pub fn options_resolver(&self) -> Result<&OptionsResolver> {
        if let Some(resolver) = self.options_resolver.get() {
            return Ok(resolver);
        }

        let mut resolver = match &self.parent {
            Some(parent) => parent.options_resolver()?.clone(),
            None => OptionsResolver::new(),
        };
        self.inner.configure_options(&mut resolver)?;
        for extension in &self.type_extensions {
            extension.configure_options(&mut resolver)?;
        }
        trace!(type_name = self.name(), resolver:?; "Built options resolver");

        Ok(self.options_resolver.get_or_init(|| resolver))
    }

    /// Creates a builder of this type with resolved options.
    ///
    /// The builder is not built yet; see [`ResolvedBlockType::build_block`].
    ///
    /// # Errors
    ///
    /// Returns an error if the options do not satisfy the schema or `name`
    /// is not a valid block name.
    pub fn create_builder(
        self: &Rc<Self>,
        factory: &BlockFactory,
        name: &str,
        options: Options,
    ) -> Result<BlockBuilder> {
        let passed = Value::from(options.clone());
        let options = self.options_resolver()?.resolve(options)?;
        let data_class = options
            .get("data_class")
            .and_then(Value::as_str)
            .map(str::to_owned);

        debug!(type_name = self.name(), name; "Creating block builder");
        let mut builder = BlockBuilder::new(name, data_class, factory.clone(), options)?;
        builder.set_type(Rc::clone(self));
        builder.set_attribute(PASSED_OPTIONS_ATTRIBUTE, passed);
        Ok(builder)
    }

    /// Creates an empty view for `block`, attached to `parent`.
    pub fn create_view(&self, _block: &Block, parent: Option<&BlockView>) -> BlockView {
        BlockView::new(parent)
    }

    pub fn build_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<()> {
        self.pipeline
            .iter()
            .try_for_each(|hook| hook.build_block(builder, options))
    }

    pub fn finish_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<()> {
        self.pipeline
            .iter()
            .try_for_each(|hook| hook.finish_block(builder, options))
    }

    pub fn build_view(&self, view: &BlockView, block: &Block, options: &Options) -> Result<()> {
        self.pipeline
            .iter()
            .try_for_each(|hook| hook.build_view(view, block, options))
    }

    pub fn finish_view(&self, view: &BlockView, block: &Block, options: &Options) -> Result<()> {
        self.pipeline
            .iter()
            .try_for_each(|hook| hook.finish_view(view, block, options))
    }

    pub fn add_child(&self, block: &Block, child: &Block, options: &Options) -> Result<()> {
        self.inner.add_child(block, child, options)
    }

    pub fn remove_child(&self, block: &Block, child: &Block, options: &Options) -> Result<()> {
        self.inner.remove_child(block, child, options)
    }

    pub fn add_parent(&self, parent: &Block, block: &Block, options: &Options) -> Result<()> {
        self.inner.add_parent(parent, block, options)
    }

    pub fn remove_parent(&self, parent: &Block, block: &Block, options: &Options) -> Result<()> {
        self.inner.remove_parent(parent, block, options)
    }
}

impl fmt::Debug for ResolvedBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBlockType")
            .field("name", &self.name())
            .field("type_extensions", &self.type_extensions.len())
            .field("parent", &self.parent.as_ref().map(|parent| parent.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::options;

    use super::*;

    struct Root;

    impl BlockType for Root {
        fn name(&self) -> &str {
            "root"
        }

        fn configure_options(&self, resolver: &mut OptionsResolver) -> Result<()> {
            resolver.set_default("label", "root").set_default("size", 1);
            Ok(())
        }
    }

    struct Leaf;

    impl BlockType for Leaf {
        fn name(&self) -> &str {
            "leaf"
        }

        fn block_prefix(&self) -> &str {
            "leaf_prefix"
        }

        fn parent(&self) -> Option<&str> {
            Some("root")
        }

        fn configure_options(&self, resolver: &mut OptionsResolver) -> Result<()> {
            resolver.set_default("label", "leaf");
            Ok(())
        }
    }

    struct SizeExtension;

    impl BlockTypeExtension for SizeExtension {
        fn extended_types(&self) -> Vec<&str> {
            vec!["leaf"]
        }

        fn configure_options(&self, resolver: &mut OptionsResolver) -> Result<()> {
            resolver.set_default("size", 2).set_default("label", "extended");
            Ok(())
        }
    }

    fn leaf_type(with_extension: bool) -> ResolvedBlockType {
        let root = Rc::new(ResolvedBlockType::new(Rc::new(Root), Vec::new(), None));
        let extensions: Vec<Rc<dyn BlockTypeExtension>> = if with_extension {
            vec![Rc::new(SizeExtension)]
        } else {
            Vec::new()
        };
        ResolvedBlockType::new(Rc::new(Leaf), extensions, Some(root))
    }

    #[test]
    fn test_options_merge_parent_type_then_extensions() {
        let resolved = leaf_type(true).options_resolver().unwrap().resolve(options! {}).unwrap();
        assert_eq!(resolved["label"], Value::from("extended"));
        assert_eq!(resolved["size"], Value::from(2));

        let resolved = leaf_type(false).options_resolver().unwrap().resolve(options! {}).unwrap();
        assert_eq!(resolved["label"], Value::from("leaf"));
        assert_eq!(resolved["size"], Value::from(1));
    }

    #[test]
    fn test_options_resolver_is_cached() {
        let leaf = leaf_type(false);
        let first: *const OptionsResolver = leaf.options_resolver().unwrap();
        let second: *const OptionsResolver = leaf.options_resolver().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ancestry_and_accessors() {
        let leaf = leaf_type(true);
        let names: Vec<_> = leaf.ancestry().map(ResolvedBlockType::name).collect();
        assert_eq!(names, ["leaf", "root"]);
        assert_eq!(leaf.block_prefix(), "leaf_prefix");
        assert_eq!(leaf.type_extensions().len(), 1);
        assert_eq!(leaf.parent().map(|parent| parent.name()), Some("root"));
        assert_eq!(leaf.pipeline.len(), 3);
    }
}
