//! Rendering of block views.
//!
//! [`BlockRenderer`] turns a [`BlockView`] into text through a
//! [`RendererEngine`]. [`search_and_render_block`](BlockRenderer::search_and_render_block)
//! walks the view's `block_prefixes` from the most specific prefix to the
//! root type and renders the first fragment a theme provides. A fragment
//! calling [`FragmentContext::render_parent`] resumes that walk one level
//! further up, which lets a theme wrap the markup of a parent type.

use std::{cell::RefCell, collections::HashMap, fmt};

use log::{debug, trace};
use tessera_core::{Map, Value, name};

use crate::{
    error::{BlockError, Result},
    render::{
        engine::{RendererEngine, Resource},
        fragment::FragmentContext,
    },
    view::BlockView,
};

/// View variable keying the renderer's per-view state.
pub const VIEW_KEY_VAR: &str = "unique_block_prefix";

#[derive(Debug, Default)]
struct RenderState {
    hierarchies: HashMap<String, Vec<String>>,
    levels: HashMap<String, usize>,
    variable_stack: HashMap<String, Vec<Map>>,
}

/// Renders block views with theme fragments.
pub struct BlockRenderer {
    engine: Box<dyn RendererEngine>,
    state: RefCell<RenderState>,
}

fn view_key(view: &BlockView) -> Result<String> {
    view.var(VIEW_KEY_VAR)
        .and_then(|key| key.as_str().map(str::to_owned))
        .ok_or_else(|| BlockError::logic(format!("The view has no \"{VIEW_KEY_VAR}\" variable")))
}

/// Replaces the `key` map of `variables` by the scope's map with the passed
/// entries layered on top.
fn merge_attributes(variables: &mut Map, scope: &Map, key: &str) {
    let Some(Value::Map(inherited)) = scope.get(key) else {
        return;
    };
    if let Some(Value::Map(passed)) = variables.get_mut(key) {
        let mut merged = inherited.clone();
        merged.extend(std::mem::take(passed));
        *passed = merged;
    }
}

fn quoted_reversed(hierarchy: &[String]) -> String {
    hierarchy
        .iter()
        .rev()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\", \"")
}

impl BlockRenderer {
    pub fn new(engine: impl RendererEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            state: RefCell::new(RenderState::default()),
        }
    }

    pub fn engine(&self) -> &dyn RendererEngine {
        self.engine.as_ref()
    }

    /// Sets the themes of `view`.
    ///
    /// # Arguments
    ///
    /// * `themes` - Theme names, later themes taking precedence.
    /// * `use_default_themes` - Whether the engine's default themes still
    ///   apply when `view` is a root view.
    pub fn set_theme(&self, view: &BlockView, themes: Vec<String>, use_default_themes: bool) -> Result<()> {
        self.engine.set_theme(view, themes, use_default_themes)
    }

    /// Pushes the variables of a render call on the stack of `view_key`.
    ///
    /// Returns whether this call opened the stack.
    fn push_variables(&self, view: &BlockView, view_key: &str, mut variables: Map) -> bool {
        let mut state = self.state.borrow_mut();
        let (scope, opened) = match state.variable_stack.get(view_key).and_then(|stack| stack.last()) {
            Some(scope) => (scope.clone(), false),
            None => (view.vars().clone(), true),
        };

        merge_attributes(&mut variables, &scope, "attr");
        merge_attributes(&mut variables, &scope, "label_attr");
        let mut merged = scope;
        merged.extend(variables);

        trace!(view = view_key, depth = state.variable_stack.get(view_key).map_or(0, Vec::len); "Pushing render variables");
        state
            .variable_stack
            .entry(view_key.to_owned())
            .or_default()
            .push(merged);
        opened
    }

    fn pop_variables(&self, view_key: &str, opened: bool) {
        let mut state = self.state.borrow_mut();
        if opened {
            state.variable_stack.remove(view_key);
        } else if let Some(stack) = state.variable_stack.get_mut(view_key) {
            stack.pop();
        }
    }

    fn current_variables(&self, view_key: &str) -> Map {
        self.state
            .borrow()
            .variable_stack
            .get(view_key)
            .and_then(|stack| stack.last())
            .cloned()
            .unwrap_or_default()
    }

    fn render_resource(
        &self,
        view: &BlockView,
        view_key: &str,
        resource: &Resource,
        block_name: &str,
        suffix: Option<&str>,
    ) -> Result<String> {
        let variables = self.current_variables(view_key);
        let ctx = FragmentContext::new(self, view, block_name, &variables, suffix);
        self.engine.render_block(&ctx, resource)
    }

    /// Renders the fragment named `block_name` for `view`.
    ///
    /// `variables` are layered over the current variable scope of the view;
    /// `attr` and `label_attr` are merged key by key.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Logic`] if no theme provides `block_name`.
    pub fn render_block(&self, view: &BlockView, block_name: &str, variables: Map) -> Result<String> {
        let resource = self
            .engine
            .get_resource_for_block_name(view, block_name)?
            .ok_or_else(|| BlockError::logic(format!("No block \"{block_name}\" found while rendering the block")))?;
        let view_key = view_key(view)?;

        let opened = self.push_variables(view, &view_key, variables);
        let rendered = self.render_resource(view, &view_key, &resource, block_name, None);
        self.pop_variables(&view_key, opened);
        rendered
    }

    /// Renders `view` with the most specific fragment for `suffix`.
    ///
    /// The searched block names are `{prefix}_{suffix}` for every entry of
    /// the view's `block_prefixes`. The `row` and `widget` suffixes render
    /// once per view and return an empty string afterwards. Calls made from
    /// a fragment to render its parent block do not count as renders.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Logic`] if no block name of the hierarchy exists
    /// in any theme, or if a fragment at the root of the hierarchy asks for
    /// its parent.
    pub fn search_and_render_block(&self, view: &BlockView, suffix: &str, variables: Map) -> Result<String> {
        let render_once = suffix == "row" || suffix == "widget";
        let view_key = view_key(view)?;
        let view_and_suffix_key = format!("{view_key}{suffix}");

        let resumed = {
            let state = self.state.borrow();
            state
                .hierarchies
                .get(&view_and_suffix_key)
                .cloned()
                .zip(state.levels.get(&view_and_suffix_key).copied())
        };
        // Calls resuming a hierarchy render the parent block of the outermost call.
        if resumed.is_none() && render_once && view.is_rendered() {
            return Ok(String::new());
        }
        let (hierarchy, start_level, initial) = match resumed {
            Some((hierarchy, level)) => {
                let parent_level = level.checked_sub(1).ok_or_else(|| {
                    BlockError::logic(format!(
                        "Block \"{}\" is the root of its hierarchy and has no parent block",
                        hierarchy.first().map_or("", String::as_str)
                    ))
                })?;
                (hierarchy, parent_level, false)
            }
            None => {
                let prefixes = match view.var("block_prefixes") {
                    Some(Value::List(prefixes)) => prefixes,
                    _ => Vec::new(),
                };
                let hierarchy: Vec<String> = prefixes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|prefix| format!("{prefix}_{suffix}"))
                    .collect();
                if hierarchy.is_empty() {
                    return Err(BlockError::logic(format!(
                        "Unable to render the block as it has no block prefixes for \"{suffix}\""
                    )));
                }
                let level = hierarchy.len() - 1;
                (hierarchy, level, true)
            }
        };

        let resource = self
            .engine
            .get_resource_for_block_name_hierarchy(view, &hierarchy, start_level)?;
        let level = self
            .engine
            .get_resource_hierarchy_level(view, &hierarchy, start_level)?;

        let (Some(resource), Some(level)) = (resource, level) else {
            let mut unique = hierarchy.clone();
            unique.sort();
            unique.dedup();
            let message = if unique.len() != hierarchy.len() {
                format!(
                    "Unable to render the block because the block names array contains duplicates: \"{}\".",
                    quoted_reversed(&hierarchy)
                )
            } else {
                format!(
                    "Unable to render the block as none of the following blocks exist: \"{}\".",
                    quoted_reversed(&hierarchy)
                )
            };
            return Err(BlockError::logic(message));
        };
        let block_name = hierarchy[level].clone();
        debug!(view = view_key.as_str(), block_name = block_name.as_str(), level; "Rendering block");

        {
            let mut state = self.state.borrow_mut();
            state
                .hierarchies
                .insert(view_and_suffix_key.clone(), hierarchy);
            state.levels.insert(view_and_suffix_key.clone(), level);
        }
        let opened = self.push_variables(view, &view_key, variables);

        let rendered = self.render_resource(view, &view_key, &resource, &block_name, Some(suffix));

        self.pop_variables(&view_key, opened);
        {
            let mut state = self.state.borrow_mut();
            if initial {
                state.hierarchies.remove(&view_and_suffix_key);
                state.levels.remove(&view_and_suffix_key);
            } else if let Some(resumed_level) = state.levels.get_mut(&view_and_suffix_key) {
                // Restore the level of the enclosing call.
                *resumed_level = start_level + 1;
            }
        }

        let html = rendered?;
        if initial && render_once {
            view.set_rendered();
        }
        Ok(html)
    }

    /// Turns a block name into a label.
    pub fn humanize(&self, text: &str) -> String {
        name::humanize(text)
    }
}

impl fmt::Debug for BlockRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRenderer")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
