//! Blocks, the runtime nodes of a block tree.
//!
//! A [`Block`] is created from an immutable [`BlockConfig`] and holds its
//! data in three layers:
//!
//! - **model data**, as set by the caller or mapped from the parent
//! - **normalized data**, the model data after the model transformers
//! - **view data**, the normalized data after the view transformers
//!
//! Compound blocks own an ordered set of named children and distribute
//! their normalized data over them with their [`DataMapper`]. A block that
//! inherits its parent's data stores nothing itself: its data getters read
//! the parent's layers.
//!
//! Data is set lazily. The first read of a block's data, or
//! [`Block::initialize`] on the root, sets the configured default data and
//! maps it down the tree.
//!
//! [`DataMapper`]: crate::DataMapper

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use log::{debug, trace};

use tessera_core::{Options, PropertyPath, Value};

use crate::{
    block_config::BlockConfig,
    block_type::TypeRef,
    builtin::TEXT_TYPE,
    error::{BlockError, Result},
    events::{BlockEvent, BlockEvents},
    mapper::InheritDataAwareIter,
    view::BlockView,
};

#[derive(Debug, Default)]
struct DataLayers {
    model: Value,
    norm: Value,
    view: Value,
    default_data_set: bool,
}

struct BlockNode {
    config: BlockConfig,
    parent: RefCell<Weak<BlockNode>>,
    children: RefCell<IndexMap<String, Block>>,
    data: RefCell<DataLayers>,
    lock_set_data: Cell<bool>,
}

/// A node of the block tree.
///
/// `Block` is a shared handle; clones refer to the same node. Parents own
/// their children, children refer back to their parent weakly.
#[derive(Clone)]
pub struct Block(Rc<BlockNode>);

impl Block {
    /// Creates a block from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Logic`] if the block is compound but has no
    /// data mapper.
    pub fn new(config: BlockConfig) -> Result<Self> {
        if config.compound() && config.data_mapper().is_none() {
            return Err(BlockError::logic(format!(
                "Compound block \"{}\" needs a data mapper",
                config.name()
            )));
        }

        Ok(Self(Rc::new(BlockNode {
            config,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(IndexMap::new()),
            data: RefCell::new(DataLayers::default()),
            lock_set_data: Cell::new(false),
        })))
    }

    pub fn name(&self) -> &str {
        self.0.config.name()
    }

    pub fn config(&self) -> &BlockConfig {
        &self.0.config
    }

    pub fn is_compound(&self) -> bool {
        self.0.config.compound()
    }

    pub fn parent(&self) -> Option<Block> {
        self.0.parent.borrow().upgrade().map(Block)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Returns the root of the tree this block belongs to.
    pub fn root(&self) -> Block {
        let mut root = self.clone();
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    /// Returns whether both handles point to the same block.
    pub fn ptr_eq(&self, other: &Block) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn set_parent(&self, parent: Option<&Block>) -> Result<()> {
        if parent.is_some() && self.name().is_empty() {
            return Err(BlockError::logic(
                "A block with an empty name cannot have a parent block",
            ));
        }
        *self.0.parent.borrow_mut() = parent.map_or_else(Weak::new, |parent| Rc::downgrade(&parent.0));
        Ok(())
    }

    /// Returns the path under which this block reads its data from its
    /// parent.
    ///
    /// An explicitly configured path wins. Otherwise the block name is used,
    /// as an index (`[name]`) when the nearest data-owning ancestor has no
    /// data class and as a property otherwise. Unnamed blocks have no path.
    pub fn property_path(&self) -> Option<PropertyPath> {
        if let Some(path) = self.0.config.property_path() {
            return Some(path.clone());
        }
        if self.name().is_empty() {
            return None;
        }

        let mut parent = self.parent();
        while let Some(ancestor) = parent.clone().filter(|p| p.config().inherit_data()) {
            parent = ancestor.parent();
        }

        match parent {
            Some(parent) if parent.config().data_class().is_none() => {
                Some(PropertyPath::for_index(self.name()))
            }
            _ => Some(PropertyPath::for_property(self.name())),
        }
    }

    /// Sets the model data and propagates it to the children.
    ///
    /// The pre-set-data listeners may replace `data`. `Null` is replaced by
    /// the configured empty data. The result is run through the model and
    /// view transformers, mapped onto the children, and finally announced to
    /// the post-set-data listeners.
    ///
    /// A block whose data is locked ignores data other than its configured
    /// data.
    ///
    /// # Errors
    ///
    /// - [`BlockError::Runtime`] if the block inherits its parent's data, or
    ///   if called from one of its own pre-set-data listeners
    /// - [`BlockError::TransformationFailed`] if a transformer rejects the data
    /// - any error raised by a listener or the data mapper
    pub fn set_data(&self, data: impl Into<Value>) -> Result<&Self> {
        let data = data.into();
        let config = &self.0.config;

        if config.inherit_data() {
            return Err(BlockError::runtime(
                "You cannot change the data of a block inheriting its parent data",
            ));
        }
        if config.data_locked() && data != *config.data() {
            return Ok(self);
        }
        if self.0.lock_set_data.get() {
            return Err(BlockError::runtime(
                "A cycle was detected. Listeners to the PRE_SET_DATA event must not call \
                 set_data(). You should call set_data() on the event object instead",
            ));
        }

        self.0.lock_set_data.set(true);
        let result = self.store_data(data);
        self.0.lock_set_data.set(false);
        result?;

        let has_children = !self.0.children.borrow().is_empty();
        if let Some(mapper) = config.data_mapper().filter(|_| has_children) {
            let norm = self.0.data.borrow().norm.clone();
            mapper.map_data_to_views(&norm, &mut InheritDataAwareIter::new(self.children()))?;
        }

        let dispatcher = config.dispatcher();
        if dispatcher.has_listeners(BlockEvents::PostSetData) {
            let model = self.0.data.borrow().model.clone();
            let mut event = BlockEvent::new(self, model);
            dispatcher.dispatch(BlockEvents::PostSetData, &mut event)?;
        }

        Ok(self)
    }

    fn store_data(&self, data: Value) -> Result<()> {
        let config = &self.0.config;
        let dispatcher = config.dispatcher();

        let mut model = data;
        if dispatcher.has_listeners(BlockEvents::PreSetData) {
            let mut event = BlockEvent::new(self, model);
            dispatcher.dispatch(BlockEvents::PreSetData, &mut event)?;
            model = event.into_data();
        }
        if model.is_null() {
            model = config.empty_data().resolve(self)?;
        }

        let norm = config.model_transformers().transform(model.clone())?;
        let view = config.view_transformers().transform(norm.clone())?;
        trace!(block = self.name(), model:?, norm:?, view:?; "Stored block data");

        *self.0.data.borrow_mut() = DataLayers {
            model,
            norm,
            view,
            default_data_set: true,
        };
        Ok(())
    }

    fn inherited_parent(&self) -> Result<Block> {
        self.parent().ok_or_else(|| {
            BlockError::runtime(
                "The block is configured to inherit its parent's data, but does not have a parent",
            )
        })
    }

    fn ensure_default_data(&self) -> Result<()> {
        if self.0.data.borrow().default_data_set {
            return Ok(());
        }
        if self.0.lock_set_data.get() {
            return Err(BlockError::runtime(
                "A cycle was detected. Listeners to the PRE_SET_DATA event must not read the \
                 block data before it has been set. You should read the data from the event \
                 object instead",
            ));
        }
        self.set_data(self.0.config.data().clone())?;
        Ok(())
    }

    /// Returns the model data.
    pub fn data(&self) -> Result<Value> {
        if self.0.config.inherit_data() {
            return self.inherited_parent()?.data();
        }
        self.ensure_default_data()?;
        Ok(self.0.data.borrow().model.clone())
    }

    /// Returns the normalized data.
    pub fn norm_data(&self) -> Result<Value> {
        if self.0.config.inherit_data() {
            return self.inherited_parent()?.norm_data();
        }
        self.ensure_default_data()?;
        Ok(self.0.data.borrow().norm.clone())
    }

    /// Returns the view data.
    pub fn view_data(&self) -> Result<Value> {
        if self.0.config.inherit_data() {
            return self.inherited_parent()?.view_data();
        }
        self.ensure_default_data()?;
        Ok(self.0.data.borrow().view.clone())
    }

    /// Sets the default data of a root block, if not set already.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Runtime`] if the block has a parent.
    pub fn initialize(&self) -> Result<&Self> {
        if !self.is_root() {
            return Err(BlockError::runtime("Only root blocks should be initialized"));
        }
        if !self.0.config.inherit_data() {
            self.ensure_default_data()?;
        }
        Ok(self)
    }

    /// Returns whether the data has been set.
    pub fn is_initialized(&self) -> bool {
        self.0.data.borrow().default_data_set
    }

    /// Adds an existing block as a child.
    ///
    /// # Errors
    ///
    /// - [`BlockError::Logic`] if this block is not compound or `child` has
    ///   an empty name
    /// - [`BlockError::Runtime`] if `child` is configured to initialize
    ///   itself
    pub fn add(&self, child: Block) -> Result<&Self> {
        self.ensure_compound()?;
        if child.config().auto_initialize() {
            return Err(BlockError::runtime(format!(
                "Automatic initialization is only supported on root blocks. You should set the \
                 \"auto_initialize\" option to false on the block \"{}\"",
                child.name()
            )));
        }
        self.attach(child)?;
        Ok(self)
    }

    /// Creates a child through the factory and adds it.
    ///
    /// Without a type, the child is a `text` block, or the guessed type for
    /// the property `name` when this block has a data class. Without a name,
    /// the child is named after its type.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Logic`] if this block is not compound or has no
    /// factory, and any error raised while creating the child.
    pub fn add_new(
        &self,
        name: Option<&str>,
        block_type: Option<TypeRef>,
        options: Options,
    ) -> Result<Block> {
        self.ensure_compound()?;
        let factory = self.0.config.factory().ok_or_else(|| {
            BlockError::logic(format!(
                "Block \"{}\" has no factory to create children with",
                self.name()
            ))
        })?;

        let mut builder = match (name, block_type, self.0.config.data_class()) {
            (None, block_type, _) => factory.create_builder(
                block_type.unwrap_or_else(|| TypeRef::from(TEXT_TYPE)),
                Value::Null,
                options,
            )?,
            (Some(name), Some(block_type), _) => {
                factory.create_named_builder(name, block_type, Value::Null, options)?
            }
            (Some(name), None, None) => {
                factory.create_named_builder(name, TEXT_TYPE, Value::Null, options)?
            }
            (Some(name), None, Some(data_class)) => {
                factory.create_builder_for_property(data_class, name, Value::Null, options)?
            }
        };
        builder.set_auto_initialize(false);
        let child = builder.get_block()?;

        self.attach(child.clone())?;
        Ok(child)
    }

    fn ensure_compound(&self) -> Result<()> {
        if self.0.config.compound() {
            Ok(())
        } else {
            Err(BlockError::logic(
                "You cannot add children to a simple block. Maybe you should set the option \
                 \"compound\" to true?",
            ))
        }
    }

    fn attach(&self, child: Block) -> Result<()> {
        let attached = self
            .0
            .children
            .borrow()
            .get(child.name())
            .map(|current| current.ptr_eq(&child));
        match attached {
            Some(true) => return Ok(()),
            Some(false) => {
                self.remove(child.name())?;
            }
            None => {}
        }
        if let Some(previous) = child.parent() {
            previous.remove(child.name())?;
        }

        child.set_parent(Some(self))?;
        self.0
            .children
            .borrow_mut()
            .insert(child.name().to_owned(), child.clone());

        if let Some(ty) = self.0.config.resolved_type() {
            ty.add_child(self, &child, self.0.config.options())?;
        }
        if let Some(ty) = child.config().resolved_type() {
            ty.add_parent(self, &child, child.config().options())?;
        }

        let should_map = self.0.data.borrow().default_data_set
            && !self.0.lock_set_data.get()
            && !self.0.config.inherit_data();
        if let Some(mapper) = self.0.config.data_mapper().filter(|_| should_map) {
            let norm = self.0.data.borrow().norm.clone();
            mapper.map_data_to_views(&norm, &mut InheritDataAwareIter::new(vec![child]))?;
        }
        Ok(())
    }

    /// Removes the child `name`, returning it.
    pub fn remove(&self, name: &str) -> Result<Option<Block>> {
        let removed = self.0.children.borrow_mut().shift_remove(name);
        if let Some(child) = &removed {
            child.set_parent(None)?;
            if let Some(ty) = self.0.config.resolved_type() {
                ty.remove_child(self, child, self.0.config.options())?;
            }
            if let Some(ty) = child.config().resolved_type() {
                ty.remove_parent(self, child, child.config().options())?;
            }
        }
        Ok(removed)
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.children.borrow().contains_key(name)
    }

    /// Returns the child `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::ChildNotFound`] if there is no such child.
    pub fn get(&self, name: &str) -> Result<Block> {
        self.0
            .children
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| BlockError::ChildNotFound(name.to_owned()))
    }

    /// Returns the children in insertion order.
    pub fn children(&self) -> Vec<Block> {
        self.0.children.borrow().values().cloned().collect()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.0.children.borrow().keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.0.children.borrow().len()
    }

    /// Returns whether the block holds no data.
    ///
    /// `Null` and the empty string are empty. A compound block is otherwise
    /// empty when all of its children are, which includes having none. A
    /// block inheriting its parent's data is judged by its children alone.
    /// Blocks whose data was not set yet receive their default data first.
    ///
    /// # Errors
    ///
    /// Returns an error if setting the default data fails.
    pub fn is_empty(&self) -> Result<bool> {
        if !self.0.config.inherit_data() {
            self.ensure_default_data()?;
            if self.0.data.borrow().model.is_empty() {
                return Ok(true);
            }
            if !self.0.config.compound() {
                return Ok(false);
            }
        }
        for child in self.children() {
            if !child.is_empty()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Builds the view tree of this block.
    ///
    /// The type pipeline builds this block's view first, then every child
    /// view is created below it, and finally the pipeline finishes this
    /// block's view.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Logic`] if the block has no type, and any error
    /// raised by a view hook.
    pub fn create_view(&self, parent: Option<&BlockView>) -> Result<BlockView> {
        let ty = self.0.config.resolved_type().ok_or_else(|| {
            BlockError::logic(format!(
                "Block \"{}\" has no type and cannot create a view",
                self.name()
            ))
        })?;
        let options = self.0.config.options();

        let view = ty.create_view(self, parent);
        ty.build_view(&view, self, options)?;
        for child in self.children() {
            let child_view = child.create_view(Some(&view))?;
            view.add_child(child.name(), child_view);
        }
        ty.finish_view(&view, self, options)?;

        debug!(block = self.name(), type_name = ty.name(); "Created block view");
        Ok(view)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("name", &self.name())
            .field("type", &self.0.config.resolved_type().map(|ty| ty.name()))
            .field("data", &*self.0.data.borrow())
            .field("children", &self.child_names())
            .finish()
    }
}
