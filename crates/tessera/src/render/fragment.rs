//! Renderable theme fragments.
//!
//! A [`Fragment`] is the unit a theme provides for one block name, such as
//! `text_widget` or `block_row`. Fragments receive a [`FragmentContext`]
//! holding the merged variables and a handle back to the renderer, so they
//! can render child views or the next fragment up the type hierarchy.

use std::fmt;

use tessera_core::{Map, Value};

use crate::{
    error::{BlockError, Result},
    render::renderer::BlockRenderer,
    view::BlockView,
};

/// Something that renders a block for a given context.
pub trait Fragment {
    fn render(&self, ctx: &FragmentContext<'_>) -> Result<String>;
}

impl<F> Fragment for F
where
    F: Fn(&FragmentContext<'_>) -> Result<String>,
{
    fn render(&self, ctx: &FragmentContext<'_>) -> Result<String> {
        self(ctx)
    }
}

/// The state a fragment renders with.
pub struct FragmentContext<'a> {
    renderer: &'a BlockRenderer,
    view: &'a BlockView,
    block_name: &'a str,
    variables: &'a Map,
    suffix: Option<&'a str>,
}

impl<'a> FragmentContext<'a> {
    pub(crate) fn new(
        renderer: &'a BlockRenderer,
        view: &'a BlockView,
        block_name: &'a str,
        variables: &'a Map,
        suffix: Option<&'a str>,
    ) -> Self {
        Self {
            renderer,
            view,
            block_name,
            variables,
            suffix,
        }
    }

    pub fn renderer(&self) -> &'a BlockRenderer {
        self.renderer
    }

    pub fn view(&self) -> &'a BlockView {
        self.view
    }

    /// Returns the block name the fragment was found under.
    pub fn block_name(&self) -> &'a str {
        self.block_name
    }

    /// Returns the merged variables of this render call.
    pub fn vars(&self) -> &'a Map {
        self.variables
    }

    /// Returns a variable, or `Null` when it is not set.
    pub fn var(&self, name: &str) -> &'a Value {
        const NULL: &Value = &Value::Null;
        self.variables.get(name).unwrap_or(NULL)
    }

    /// Renders `view` for `suffix`, searching its type hierarchy.
    pub fn search_and_render(&self, view: &BlockView, suffix: &str, variables: Map) -> Result<String> {
        self.renderer.search_and_render_block(view, suffix, variables)
    }

    /// Renders a fixed block name for `view`.
    pub fn render_block(&self, view: &BlockView, block_name: &str, variables: Map) -> Result<String> {
        self.renderer.render_block(view, block_name, variables)
    }

    /// Renders the fragment one level up the type hierarchy of this view.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Logic`](crate::BlockError::Logic) when the
    /// fragment was rendered by name rather than by hierarchy search, or when
    /// it already is the root of the hierarchy.
    pub fn render_parent(&self, variables: Map) -> Result<String> {
        match self.suffix {
            Some(suffix) => self.renderer.search_and_render_block(self.view, suffix, variables),
            None => Err(BlockError::logic(format!(
                "Block \"{}\" was not rendered through a hierarchy search and has no parent block",
                self.block_name
            ))),
        }
    }
}

impl fmt::Debug for FragmentContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentContext")
            .field("block_name", &self.block_name)
            .field("suffix", &self.suffix)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}
