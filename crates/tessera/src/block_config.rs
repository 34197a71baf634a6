//! Block configuration.
//!
//! A [`BlockConfigBuilder`] collects the settings of a block while its type
//! hierarchy builds it. [`BlockConfigBuilder::get_block_config`] takes an
//! immutable [`BlockConfig`] snapshot of those settings; a block is created
//! from such a snapshot and can never change its configuration afterwards.
//! The builder itself stays usable.
//!
//! # Example
//!
//! ```
//! use tessera::BlockConfigBuilder;
//! use tessera_core::options;
//!
//! let mut builder = BlockConfigBuilder::new("email", None, options! {}).unwrap();
//! builder.set_compound(false).set_attribute("icon", "mail");
//!
//! let config = builder.get_block_config();
//! assert_eq!(config.name(), "email");
//! assert!(!config.compound());
//!
//! assert!(BlockConfigBuilder::new("e mail", None, options! {}).is_err());
//! ```

use std::{fmt, ops::Deref, rc::Rc};

use tessera_core::{Map, Options, PropertyPath, Value, name};

use crate::{
    block::Block,
    error::{BlockError, Result},
    events::{BlockEvent, BlockEvents, EventDispatcher, EventSubscriber},
    factory::BlockFactory,
    mapper::DataMapper,
    resolved::ResolvedBlockType,
    transformer::{DataTransformer, TransformerChain},
};

/// The data a block falls back to when its data is set to `Null`.
#[derive(Clone)]
pub enum EmptyData {
    Value(Value),
    /// Computes the empty data from the block being filled.
    Factory(Rc<dyn Fn(&Block) -> Result<Value>>),
}

impl EmptyData {
    /// Creates an [`EmptyData::Factory`] from a closure.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Block) -> Result<Value> + 'static,
    {
        Self::Factory(Rc::new(factory))
    }

    /// Produces the empty data for `block`.
    pub fn resolve(&self, block: &Block) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Factory(factory) => factory(block),
        }
    }
}

impl Default for EmptyData {
    fn default() -> Self {
        Self::Value(Value::Null)
    }
}

impl From<Value> for EmptyData {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl PartialEq for EmptyData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(value), Self::Value(other)) => value == other,
            (Self::Factory(factory), Self::Factory(other)) => Rc::ptr_eq(factory, other),
            _ => false,
        }
    }
}

impl fmt::Debug for EmptyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// The immutable configuration of a block.
#[derive(Clone)]
pub struct BlockConfig {
    name: String,
    data_class: Option<String>,
    resolved_type: Option<Rc<ResolvedBlockType>>,
    factory: Option<BlockFactory>,
    options: Options,
    attributes: Map,
    property_path: Option<PropertyPath>,
    mapped: bool,
    inherit_data: bool,
    compound: bool,
    auto_initialize: bool,
    data: Value,
    data_locked: bool,
    empty_data: EmptyData,
    empty_message: Option<String>,
    view_transformers: TransformerChain,
    model_transformers: TransformerChain,
    data_mapper: Option<Rc<dyn DataMapper>>,
    dispatcher: EventDispatcher,
}

impl BlockConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_class(&self) -> Option<&str> {
        self.data_class.as_deref()
    }

    /// The resolved type that built this configuration, if any.
    pub fn resolved_type(&self) -> Option<&Rc<ResolvedBlockType>> {
        self.resolved_type.as_ref()
    }

    pub fn factory(&self) -> Option<&BlockFactory> {
        self.factory.as_ref()
    }

    /// The resolved options of the block.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn attributes(&self) -> &Map {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// The configured property path, if one was set explicitly.
    pub fn property_path(&self) -> Option<&PropertyPath> {
        self.property_path.as_ref()
    }

    pub fn mapped(&self) -> bool {
        self.mapped
    }

    pub fn inherit_data(&self) -> bool {
        self.inherit_data
    }

    pub fn compound(&self) -> bool {
        self.compound
    }

    pub fn auto_initialize(&self) -> bool {
        self.auto_initialize
    }

    /// The initial model data.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Whether the initial data overrides data mapped from the parent.
    pub fn data_locked(&self) -> bool {
        self.data_locked
    }

    pub fn empty_data(&self) -> &EmptyData {
        &self.empty_data
    }

    pub fn empty_message(&self) -> Option<&str> {
        self.empty_message.as_deref()
    }

    pub fn view_transformers(&self) -> &TransformerChain {
        &self.view_transformers
    }

    pub fn model_transformers(&self) -> &TransformerChain {
        &self.model_transformers
    }

    pub fn data_mapper(&self) -> Option<&Rc<dyn DataMapper>> {
        self.data_mapper.as_ref()
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }
}

fn same_rc<T: ?Sized>(left: Option<&Rc<T>>, right: Option<&Rc<T>>) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => Rc::ptr_eq(left, right),
        (None, None) => true,
        _ => false,
    }
}

/// Configurations are equal when they hold equal settings and share the
/// same type, factory, mapper, transformers and listeners.
impl PartialEq for BlockConfig {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_class == other.data_class
            && same_rc(self.resolved_type.as_ref(), other.resolved_type.as_ref())
            && self.factory == other.factory
            && self.options == other.options
            && self.attributes == other.attributes
            && self.property_path == other.property_path
            && self.mapped == other.mapped
            && self.inherit_data == other.inherit_data
            && self.compound == other.compound
            && self.auto_initialize == other.auto_initialize
            && self.data == other.data
            && self.data_locked == other.data_locked
            && self.empty_data == other.empty_data
            && self.empty_message == other.empty_message
            && self.view_transformers == other.view_transformers
            && self.model_transformers == other.model_transformers
            && same_rc(self.data_mapper.as_ref(), other.data_mapper.as_ref())
            && self.dispatcher == other.dispatcher
    }
}

impl fmt::Debug for BlockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockConfig")
            .field("name", &self.name)
            .field("type", &self.resolved_type.as_ref().map(|ty| ty.name()))
            .field("data_class", &self.data_class)
            .field("compound", &self.compound)
            .field("inherit_data", &self.inherit_data)
            .field("mapped", &self.mapped)
            .field("options", &self.options)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Mutable configuration of a block under construction.
///
/// Dereferences to the [`BlockConfig`] being assembled for read access.
#[derive(Clone, Debug)]
pub struct BlockConfigBuilder {
    config: BlockConfig,
}

impl BlockConfigBuilder {
    /// Creates a configuration builder.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidArgument`] if `name` is not a valid block
    /// name (see [`BlockConfigBuilder::is_valid_name`]).
    pub fn new(name: &str, data_class: Option<String>, options: Options) -> Result<Self> {
        if !Self::is_valid_name(name) {
            return Err(BlockError::InvalidArgument(format!(
                "The name \"{name}\" contains illegal characters. Names should start with a \
                 letter, digit or underscore and only contain letters, digits, underscores \
                 (\"_\"), hyphens (\"-\") and colons (\":\")"
            )));
        }

        Ok(Self {
            config: BlockConfig {
                name: name.to_owned(),
                data_class,
                resolved_type: None,
                factory: None,
                options,
                attributes: Map::new(),
                property_path: None,
                mapped: true,
                inherit_data: false,
                compound: false,
                auto_initialize: true,
                data: Value::Null,
                data_locked: false,
                empty_data: EmptyData::default(),
                empty_message: None,
                view_transformers: TransformerChain::new(),
                model_transformers: TransformerChain::new(),
                data_mapper: None,
                dispatcher: EventDispatcher::new(),
            },
        })
    }

    /// Returns whether `name` may be used as a block name.
    ///
    /// Valid names are empty or start with a letter, digit or underscore,
    /// followed by letters, digits, underscores, hyphens or colons.
    pub fn is_valid_name(name: &str) -> bool {
        name::is_valid_name(name)
    }

    /// Returns an immutable snapshot of the current configuration.
    pub fn get_block_config(&self) -> BlockConfig {
        self.config.clone()
    }

    pub fn set_type(&mut self, resolved_type: Rc<ResolvedBlockType>) -> &mut Self {
        self.config.resolved_type = Some(resolved_type);
        self
    }

    pub fn set_factory(&mut self, factory: BlockFactory) -> &mut Self {
        self.config.factory = Some(factory);
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.config.attributes.insert(name.to_owned(), value.into());
        self
    }

    pub fn set_attributes(&mut self, attributes: Map) -> &mut Self {
        self.config.attributes = attributes;
        self
    }

    pub fn set_property_path(&mut self, property_path: Option<PropertyPath>) -> &mut Self {
        self.config.property_path = property_path;
        self
    }

    pub fn set_mapped(&mut self, mapped: bool) -> &mut Self {
        self.config.mapped = mapped;
        self
    }

    pub fn set_inherit_data(&mut self, inherit_data: bool) -> &mut Self {
        self.config.inherit_data = inherit_data;
        self
    }

    pub fn set_compound(&mut self, compound: bool) -> &mut Self {
        self.config.compound = compound;
        self
    }

    pub fn set_auto_initialize(&mut self, auto_initialize: bool) -> &mut Self {
        self.config.auto_initialize = auto_initialize;
        self
    }

    pub fn set_data(&mut self, data: impl Into<Value>) -> &mut Self {
        self.config.data = data.into();
        self
    }

    pub fn set_data_locked(&mut self, data_locked: bool) -> &mut Self {
        self.config.data_locked = data_locked;
        self
    }

    pub fn set_empty_data(&mut self, empty_data: impl Into<EmptyData>) -> &mut Self {
        self.config.empty_data = empty_data.into();
        self
    }

    pub fn set_empty_message(&mut self, empty_message: Option<String>) -> &mut Self {
        self.config.empty_message = empty_message;
        self
    }

    /// Adds a transformer between normalized and view data.
    ///
    /// Appended by default, so the most recently added transformer runs
    /// closest to the view data. With `force_prepend` it runs first instead.
    pub fn add_view_transformer(
        &mut self,
        transformer: impl DataTransformer + 'static,
        force_prepend: bool,
    ) -> &mut Self {
        let transformer: Rc<dyn DataTransformer> = Rc::new(transformer);
        if force_prepend {
            self.config.view_transformers.prepend(transformer);
        } else {
            self.config.view_transformers.append(transformer);
        }
        self
    }

    pub fn reset_view_transformers(&mut self) -> &mut Self {
        self.config.view_transformers.clear();
        self
    }

    /// Adds a transformer between model and normalized data.
    ///
    /// Prepended by default, so the most recently added transformer runs
    /// closest to the model data. With `force_append` it runs last instead.
    pub fn add_model_transformer(
        &mut self,
        transformer: impl DataTransformer + 'static,
        force_append: bool,
    ) -> &mut Self {
        let transformer: Rc<dyn DataTransformer> = Rc::new(transformer);
        if force_append {
            self.config.model_transformers.append(transformer);
        } else {
            self.config.model_transformers.prepend(transformer);
        }
        self
    }

    pub fn reset_model_transformers(&mut self) -> &mut Self {
        self.config.model_transformers.clear();
        self
    }

    pub fn set_data_mapper(&mut self, data_mapper: Option<Rc<dyn DataMapper>>) -> &mut Self {
        self.config.data_mapper = data_mapper;
        self
    }

    pub fn add_event_listener<F>(&mut self, event: BlockEvents, priority: i32, listener: F) -> &mut Self
    where
        F: Fn(&mut BlockEvent<'_>) -> Result<()> + 'static,
    {
        self.config.dispatcher.add_listener(event, priority, listener);
        self
    }

    pub fn add_event_subscriber(&mut self, subscriber: &dyn EventSubscriber) -> &mut Self {
        self.config.dispatcher.add_subscriber(subscriber);
        self
    }
}

impl Deref for BlockConfigBuilder {
    type Target = BlockConfig;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::options;

    use super::*;
    use crate::transformer::CallbackTransformer;

    fn suffix(tag: &'static str) -> CallbackTransformer {
        CallbackTransformer::new(
            move |value| Ok(Value::from(format!("{value}{tag}"))),
            Ok,
        )
    }

    #[test]
    fn test_name_validation() {
        assert!(BlockConfigBuilder::is_valid_name(""));
        assert!(BlockConfigBuilder::is_valid_name("a1_b-c:d"));
        assert!(BlockConfigBuilder::is_valid_name("0day"));
        assert!(BlockConfigBuilder::is_valid_name("_hidden"));
        assert!(!BlockConfigBuilder::is_valid_name("1 a"));

        let err = BlockConfigBuilder::new("1 a", None, options! {}).unwrap_err();
        assert!(matches!(err, BlockError::InvalidArgument(_)));
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut builder = BlockConfigBuilder::new("name", Some("User".into()), options! { "a" => 1 }).unwrap();
        builder.set_compound(true).set_attribute("k", "v");

        let first = builder.get_block_config();
        builder.set_compound(false).set_attribute("k", "changed");
        let second = builder.get_block_config();

        assert!(first.compound());
        assert_eq!(first.attribute("k"), Some(&Value::from("v")));
        assert!(!second.compound());
        assert_eq!(second.attribute("k"), Some(&Value::from("changed")));
        assert_eq!(first.data_class(), Some("User"));
        assert_eq!(first.options(), second.options());
    }

    #[test]
    fn test_view_transformers_append_by_default() {
        let mut builder = BlockConfigBuilder::new("n", None, options! {}).unwrap();
        builder
            .add_view_transformer(suffix("1"), false)
            .add_view_transformer(suffix("2"), false)
            .add_view_transformer(suffix("0"), true);

        let out = builder.view_transformers().transform(Value::from("")).unwrap();
        assert_eq!(out, Value::from("012"));
    }

    #[test]
    fn test_model_transformers_prepend_by_default() {
        let mut builder = BlockConfigBuilder::new("n", None, options! {}).unwrap();
        builder
            .add_model_transformer(suffix("1"), false)
            .add_model_transformer(suffix("2"), false)
            .add_model_transformer(suffix("3"), true);

        let out = builder.model_transformers().transform(Value::from("")).unwrap();
        assert_eq!(out, Value::from("213"));

        builder.reset_model_transformers();
        assert!(builder.model_transformers().is_empty());
    }

    #[test]
    fn test_defaults() {
        let builder = BlockConfigBuilder::new("n", None, options! {}).unwrap();
        assert!(builder.mapped());
        assert!(builder.auto_initialize());
        assert!(!builder.compound());
        assert!(!builder.inherit_data());
        assert!(builder.data().is_null());
        assert!(builder.resolved_type().is_none());
    }
}
