use tessera_core::{Options, OptionsResolver, Value, ValueKind};

use super::BLOCK_TYPE;
use crate::{
    block_type::BlockType,
    builder::BlockBuilder,
    error::Result,
    transformer::{CallbackTransformer, expect_kind},
};

const SCALAR_KINDS: &[ValueKind] = &[
    ValueKind::Null,
    ValueKind::Bool,
    ValueKind::Int,
    ValueKind::Float,
    ValueKind::String,
];

/// A single-line text block.
///
/// Holds scalar data only; maps and lists fail the view transformation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextType;

impl BlockType for TextType {
    fn name(&self) -> &str {
        super::TEXT_TYPE
    }

    fn parent(&self) -> Option<&str> {
        Some(BLOCK_TYPE)
    }

    fn configure_options(&self, resolver: &mut OptionsResolver) -> Result<()> {
        resolver.set_default("compound", false);
        Ok(())
    }

    fn build_block(&self, builder: &mut BlockBuilder, _options: &Options) -> Result<()> {
        builder.add_view_transformer(
            CallbackTransformer::new(
                |value| {
                    expect_kind(&value, SCALAR_KINDS)?;
                    Ok(value)
                },
                |value| Ok(if value.is_null() { Value::from("") } else { value }),
            ),
            false,
        );
        Ok(())
    }
}
