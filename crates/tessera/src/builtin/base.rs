use std::rc::Rc;

use tessera_core::{Options, OptionsResolver, PropertyPath, Value, ValueKind, options};

use crate::{
    block::Block,
    block_config::EmptyData,
    block_type::BlockType,
    builder::BlockBuilder,
    error::Result,
    mapper::PropertyPathMapper,
    view::BlockView,
};

/// The root of every block type hierarchy.
///
/// Declares the options shared by all blocks and fills the view variables
/// the renderer relies on, notably `block_prefixes` and `cache_key`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseType;

fn flag(options: &Options, name: &str) -> bool {
    options.get(name).is_some_and(Value::is_truthy)
}

fn string(options: &Options, name: &str) -> Option<String> {
    options.get(name).and_then(Value::as_str).map(str::to_owned)
}

impl BlockType for BaseType {
    fn name(&self) -> &str {
        super::BLOCK_TYPE
    }

    fn configure_options(&self, resolver: &mut OptionsResolver) -> Result<()> {
        resolver
            .set_default("block_name", Value::Null)
            .set_default("id", Value::Null)
            .set_default("label", Value::Null)
            .set_default("attr", options! {})
            .set_default("label_attr", options! {})
            .set_defined(&["data"])
            .set_default("data_class", Value::Null)
            .set_lazy_default("empty_data", |opts, _| {
                Ok(if opts.get("compound")?.is_truthy() {
                    Value::from(options! {})
                } else {
                    Value::from("")
                })
            })
            .set_default("empty_message", Value::Null)
            .set_default("compound", true)
            .set_default("inherit_data", false)
            .set_default("mapped", true)
            .set_default("property_path", Value::Null)
            .set_default("auto_initialize", true)
            .set_default("translation_domain", Value::Null)
            .set_default("block_prefix", Value::Null);

        let nullable_string = [ValueKind::Null, ValueKind::String];
        for name in [
            "block_name",
            "id",
            "data_class",
            "empty_message",
            "property_path",
            "block_prefix",
        ] {
            resolver.set_allowed_types(name, &nullable_string)?;
        }
        for name in ["compound", "inherit_data", "mapped", "auto_initialize"] {
            resolver.set_allowed_types(name, &[ValueKind::Bool])?;
        }
        resolver
            .set_allowed_types("label", &[ValueKind::Null, ValueKind::String, ValueKind::Bool])?
            .set_allowed_types(
                "translation_domain",
                &[ValueKind::Null, ValueKind::String, ValueKind::Bool],
            )?
            .set_allowed_types("attr", &[ValueKind::Map])?
            .set_allowed_types("label_attr", &[ValueKind::Map])?;
        Ok(())
    }

    fn build_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<()> {
        let compound = flag(options, "compound");
        builder
            .set_compound(compound)
            .set_inherit_data(flag(options, "inherit_data"))
            .set_mapped(flag(options, "mapped"))
            .set_auto_initialize(flag(options, "auto_initialize"))
            .set_empty_data(EmptyData::from(
                options.get("empty_data").cloned().unwrap_or_default(),
            ))
            .set_empty_message(string(options, "empty_message"))
            .set_data_locked(options.contains_key("data"))
            .set_data(options.get("data").cloned().unwrap_or_default());

        if let Some(path) = string(options, "property_path") {
            builder.set_property_path(Some(path.parse::<PropertyPath>()?));
        }
        if compound {
            builder.set_data_mapper(Some(Rc::new(PropertyPathMapper)));
        }
        Ok(())
    }

    fn build_view(&self, view: &BlockView, block: &Block, options: &Options) -> Result<()> {
        let name = block.name();
        let block_name = string(options, "block_name")
            .filter(|block_name| !block_name.is_empty())
            .unwrap_or_else(|| name.to_owned());
        let mut translation_domain = options.get("translation_domain").cloned().unwrap_or_default();

        let parent_vars = view.parent().map(|parent| {
            let var = |key: &str| parent.var(key).unwrap_or_default();
            (var("id"), var("full_name"), var("unique_block_prefix"), var("translation_domain"))
        });

        let (id, full_name, unique_block_prefix) = match parent_vars {
            Some((parent_id, parent_full_name, parent_prefix, parent_domain)) => {
                if translation_domain.is_null() {
                    translation_domain = parent_domain;
                }
                match parent_full_name.as_str().filter(|full_name| !full_name.is_empty()) {
                    Some(parent_full_name) => (
                        format!("{parent_id}_{name}"),
                        format!("{parent_full_name}[{name}]"),
                        format!("{parent_prefix}_{block_name}"),
                    ),
                    None => (name.to_owned(), name.to_owned(), format!("_{block_name}")),
                }
            }
            None => (name.to_owned(), name.to_owned(), format!("_{block_name}")),
        };
        let id = string(options, "id").unwrap_or(id);

        let resolved_type = block.config().resolved_type();
        let mut block_prefixes: Vec<Value> = resolved_type
            .map(|ty| {
                ty.ancestry()
                    .map(|ancestor| Value::from(ancestor.block_prefix()))
                    .collect()
            })
            .unwrap_or_default();
        block_prefixes.reverse();
        if let Some(prefix) = string(options, "block_prefix") {
            block_prefixes.push(Value::from(prefix));
        }
        block_prefixes.push(Value::from(unique_block_prefix.as_str()));

        let type_prefix = resolved_type.map_or(super::BLOCK_TYPE, |ty| ty.block_prefix());
        let cache_key = format!("{unique_block_prefix}_{type_prefix}");

        let value = block.view_data()?;
        let data = block.norm_data()?;

        let mut vars = view.vars_mut();
        let mut set = |key: &str, value: Value| {
            vars.insert(key.to_owned(), value);
        };
        set("id", Value::from(id));
        set("name", Value::from(name));
        set("full_name", Value::from(full_name));
        set("label", options.get("label").cloned().unwrap_or_default());
        set("attr", options.get("attr").cloned().unwrap_or_else(|| Value::from(options! {})));
        set(
            "label_attr",
            options.get("label_attr").cloned().unwrap_or_else(|| Value::from(options! {})),
        );
        set("value", value);
        set("data", data);
        set("compound", Value::from(block.is_compound()));
        set("empty_message", Value::from(block.config().empty_message()));
        set("block_prefixes", Value::List(block_prefixes));
        set("unique_block_prefix", Value::from(unique_block_prefix));
        set("cache_key", Value::from(cache_key));
        set("translation_domain", translation_domain);
        Ok(())
    }
}
