//! Theme resolution for block views.
//!
//! A [`RendererEngine`] finds the [`Resource`] (theme fragment) that renders
//! a block name for a view. [`ThemeEngine`] is the standard implementation:
//!
//! - themes set on a view are searched newest first,
//! - then the themes of the parent view, recursively,
//! - and at the root view the default themes, unless disabled for it.
//!
//! The first time a view is queried, every block of every theme visible to it
//! is loaded into that view's cache, and the parent view's cache is merged in
//! underneath. Later lookups for the same view are plain map reads.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    config::RendererConfig,
    error::{BlockError, Result},
    render::fragment::{Fragment, FragmentContext},
    view::BlockView,
};

/// View variable keying the engine caches.
pub const CACHE_KEY_VAR: &str = "cache_key";

/// A fragment found in a theme.
#[derive(Clone)]
pub struct Resource {
    theme: String,
    block_name: String,
    fragment: Rc<dyn Fragment>,
}

impl Resource {
    pub fn new(theme: &str, block_name: &str, fragment: Rc<dyn Fragment>) -> Self {
        Self {
            theme: theme.to_owned(),
            block_name: block_name.to_owned(),
            fragment,
        }
    }

    /// Returns the theme this resource was loaded from.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    pub fn fragment(&self) -> &Rc<dyn Fragment> {
        &self.fragment
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("theme", &self.theme)
            .field("block_name", &self.block_name)
            .finish_non_exhaustive()
    }
}

/// Resolves and renders theme resources for views.
///
/// Methods take `&self` so that fragments may call back into the renderer
/// while a resource is rendering. Implementations must not hold internal
/// borrows across [`render_block`](Self::render_block).
pub trait RendererEngine {
    /// Sets the themes of `view` and its descendants.
    fn set_theme(&self, view: &BlockView, themes: Vec<String>, use_default_themes: bool) -> Result<()>;

    /// Returns the resource rendering exactly `block_name` for `view`.
    fn get_resource_for_block_name(&self, view: &BlockView, block_name: &str) -> Result<Option<Resource>>;

    /// Returns the resource for `hierarchy[level]`, falling back to the
    /// lower levels of the hierarchy when it does not exist.
    fn get_resource_for_block_name_hierarchy(
        &self,
        view: &BlockView,
        hierarchy: &[String],
        level: usize,
    ) -> Result<Option<Resource>>;

    /// Returns the hierarchy level at which the resource for
    /// `hierarchy[level]` was actually found.
    fn get_resource_hierarchy_level(
        &self,
        view: &BlockView,
        hierarchy: &[String],
        level: usize,
    ) -> Result<Option<usize>>;

    /// Renders a resource.
    fn render_block(&self, ctx: &FragmentContext<'_>, resource: &Resource) -> Result<String> {
        resource.fragment().render(ctx)
    }
}

/// Source of theme fragments.
pub trait ThemeLoader {
    /// Returns every fragment of `theme`, keyed by block name.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::InvalidArgument`] for unknown themes.
    fn load_theme(&self, theme: &str) -> Result<Vec<(String, Rc<dyn Fragment>)>>;
}

/// In-memory themes made of Rust closures.
///
/// ```
/// use tessera::{
///     Result,
///     render::{FragmentContext, FragmentThemes},
/// };
///
/// let themes = FragmentThemes::new().with_fragment(
///     "base",
///     "block_widget",
///     |ctx: &FragmentContext<'_>| -> Result<String> {
///         Ok(format!("<div>{}</div>", ctx.var("value")))
///     },
/// );
/// assert!(themes.has_theme("base"));
/// ```
#[derive(Default, Clone)]
pub struct FragmentThemes {
    themes: IndexMap<String, IndexMap<String, Rc<dyn Fragment>>>,
}

impl FragmentThemes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment for `block_name` to `theme`, creating the theme.
    pub fn with_fragment<F>(mut self, theme: &str, block_name: &str, fragment: F) -> Self
    where
        F: Fragment + 'static,
    {
        self.add_fragment(theme, block_name, fragment);
        self
    }

    pub fn add_fragment<F>(&mut self, theme: &str, block_name: &str, fragment: F) -> &mut Self
    where
        F: Fragment + 'static,
    {
        self.themes
            .entry(theme.to_owned())
            .or_default()
            .insert(block_name.to_owned(), Rc::new(fragment));
        self
    }

    /// Registers a theme with no fragments.
    pub fn add_theme(&mut self, theme: &str) -> &mut Self {
        self.themes.entry(theme.to_owned()).or_default();
        self
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.contains_key(theme)
    }
}

impl ThemeLoader for FragmentThemes {
    fn load_theme(&self, theme: &str) -> Result<Vec<(String, Rc<dyn Fragment>)>> {
        let fragments = self
            .themes
            .get(theme)
            .ok_or_else(|| BlockError::InvalidArgument(format!("Theme \"{theme}\" does not exist")))?;
        Ok(fragments
            .iter()
            .map(|(name, fragment)| (name.clone(), Rc::clone(fragment)))
            .collect())
    }
}

impl fmt::Debug for FragmentThemes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (theme, fragments) in &self.themes {
            map.entry(theme, &fragments.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

/// Per-view caches. `None` entries record lookups that found nothing.
#[derive(Debug, Default)]
struct EngineState {
    themes: HashMap<String, Vec<String>>,
    use_default_themes: HashMap<String, bool>,
    resources: HashMap<String, IndexMap<String, Option<Resource>>>,
    levels: HashMap<String, HashMap<String, Option<usize>>>,
}

impl EngineState {
    fn is_loaded(&self, cache_key: &str, block_name: &str) -> bool {
        self.resources
            .get(cache_key)
            .is_some_and(|resources| resources.contains_key(block_name))
    }

    fn resource(&self, cache_key: &str, block_name: &str) -> Option<Resource> {
        self.resources
            .get(cache_key)
            .and_then(|resources| resources.get(block_name))
            .cloned()
            .flatten()
    }

    fn set_resource(&mut self, cache_key: &str, block_name: &str, resource: Option<Resource>) {
        self.resources
            .entry(cache_key.to_owned())
            .or_default()
            .insert(block_name.to_owned(), resource);
    }

    fn level(&self, cache_key: &str, block_name: &str) -> Option<Option<usize>> {
        self.levels
            .get(cache_key)
            .and_then(|levels| levels.get(block_name))
            .copied()
    }

    fn set_level(&mut self, cache_key: &str, block_name: &str, level: Option<usize>) {
        self.levels
            .entry(cache_key.to_owned())
            .or_default()
            .insert(block_name.to_owned(), level);
    }
}

/// The standard [`RendererEngine`] over a [`ThemeLoader`].
pub struct ThemeEngine<L> {
    loader: L,
    default_themes: Vec<String>,
    state: RefCell<EngineState>,
}

fn cache_key(view: &BlockView) -> Result<String> {
    view.var(CACHE_KEY_VAR)
        .and_then(|key| key.as_str().map(str::to_owned))
        .ok_or_else(|| BlockError::logic(format!("The view has no \"{CACHE_KEY_VAR}\" variable")))
}

fn block_at(hierarchy: &[String], level: usize) -> Result<&str> {
    hierarchy.get(level).map(String::as_str).ok_or_else(|| {
        BlockError::InvalidArgument(format!(
            "Hierarchy level {level} is out of bounds for {} block names",
            hierarchy.len()
        ))
    })
}

impl<L: ThemeLoader> ThemeEngine<L> {
    pub fn new(loader: L) -> Self {
        Self::with_default_themes(loader, Vec::new())
    }

    /// Creates an engine searching `default_themes` at root views, later
    /// themes taking precedence.
    pub fn with_default_themes(loader: L, default_themes: Vec<String>) -> Self {
        Self {
            loader,
            default_themes,
            state: RefCell::new(EngineState::default()),
        }
    }

    pub fn from_config(loader: L, config: &RendererConfig) -> Self {
        Self::with_default_themes(loader, config.default_themes().to_vec())
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn default_themes(&self) -> &[String] {
        &self.default_themes
    }

    fn load_resources_from_theme(
        &self,
        resources: &mut IndexMap<String, Option<Resource>>,
        theme: &str,
    ) -> Result<()> {
        for (block_name, fragment) in self.loader.load_theme(theme)? {
            let resource = Resource::new(theme, &block_name, fragment);
            resources.entry(block_name).or_insert(Some(resource));
        }
        Ok(())
    }

    /// Loads every resource visible to `view` and reports whether
    /// `block_name` is among them.
    ///
    /// The caller guarantees that `block_name` is not cached yet for
    /// `cache_key`.
    fn load_resource_for_block_name(
        &self,
        state: &mut EngineState,
        cache_key: &str,
        view: &BlockView,
        block_name: &str,
    ) -> Result<bool> {
        // All themes of this view are already loaded, so the block does not exist.
        if let Some(resources) = state.resources.get_mut(cache_key) {
            resources.insert(block_name.to_owned(), None);
            return Ok(false);
        }

        let mut resources = IndexMap::new();
        if let Some(themes) = state.themes.get(cache_key) {
            for theme in themes.iter().rev() {
                self.load_resources_from_theme(&mut resources, theme)?;
            }
        }

        match view.parent() {
            None => {
                if state.use_default_themes.get(cache_key).copied().unwrap_or(true) {
                    for theme in self.default_themes.iter().rev() {
                        self.load_resources_from_theme(&mut resources, theme)?;
                    }
                }
            }
            Some(parent) => {
                let parent_key = self::cache_key(&parent)?;
                if !state.resources.contains_key(&parent_key) {
                    self.load_resource_for_block_name(state, &parent_key, &parent, block_name)?;
                }
                if let Some(parent_resources) = state.resources.get(&parent_key) {
                    for (nested, resource) in parent_resources {
                        resources
                            .entry(nested.clone())
                            .or_insert_with(|| resource.clone());
                    }
                }
            }
        }

        trace!(cache_key, resources_count = resources.len(); "Loaded view resources");
        let found = resources
            .entry(block_name.to_owned())
            .or_insert(None)
            .is_some();
        state.resources.insert(cache_key.to_owned(), resources);
        Ok(found)
    }

    /// Loads the resource for `hierarchy[level]`, descending the hierarchy
    /// until a level has one. Found resources are cached under every level
    /// that was visited.
    fn load_resource_for_block_name_hierarchy(
        &self,
        state: &mut EngineState,
        cache_key: &str,
        view: &BlockView,
        hierarchy: &[String],
        level: usize,
    ) -> Result<bool> {
        let block_name = block_at(hierarchy, level)?;

        let found_by_name = if state.is_loaded(cache_key, block_name) {
            state.resource(cache_key, block_name).is_some()
        } else {
            self.load_resource_for_block_name(state, cache_key, view, block_name)?
        };
        if found_by_name {
            state.set_level(cache_key, block_name, Some(level));
            return Ok(true);
        }

        if level > 0 {
            let parent_level = level - 1;
            let parent_name = block_at(hierarchy, parent_level)?;

            let found = state.resource(cache_key, parent_name).is_some()
                || self.load_resource_for_block_name_hierarchy(
                    state,
                    cache_key,
                    view,
                    hierarchy,
                    parent_level,
                )?;

            if found {
                // A resource loaded by name only has no level yet.
                if state.level(cache_key, parent_name).is_none() {
                    state.set_level(cache_key, parent_name, Some(parent_level));
                }
                let resource = state.resource(cache_key, parent_name);
                let found_level = state.level(cache_key, parent_name).flatten();
                state.set_resource(cache_key, block_name, resource);
                state.set_level(cache_key, block_name, found_level);
                return Ok(true);
            }
        }

        state.set_resource(cache_key, block_name, None);
        state.set_level(cache_key, block_name, None);
        Ok(false)
    }

    fn ensure_hierarchy_loaded(
        &self,
        state: &mut EngineState,
        view: &BlockView,
        hierarchy: &[String],
        level: usize,
    ) -> Result<String> {
        let cache_key = cache_key(view)?;
        let block_name = block_at(hierarchy, level)?;
        // A lookup by name caches the resource but not the level, so only a
        // cached level proves the hierarchy was walked.
        if state.level(&cache_key, block_name).is_none() {
            self.load_resource_for_block_name_hierarchy(state, &cache_key, view, hierarchy, level)?;
        }
        Ok(cache_key)
    }
}

impl<L: ThemeLoader> RendererEngine for ThemeEngine<L> {
    fn set_theme(&self, view: &BlockView, themes: Vec<String>, use_default_themes: bool) -> Result<()> {
        let cache_key = cache_key(view)?;
        debug!(cache_key = cache_key.as_str(), themes:?, use_default_themes; "Setting view themes");

        let mut state = self.state.borrow_mut();
        state.themes.insert(cache_key.clone(), themes);
        state
            .use_default_themes
            .insert(cache_key.clone(), use_default_themes);
        state.resources.remove(&cache_key);
        state.levels.remove(&cache_key);
        Ok(())
    }

    fn get_resource_for_block_name(&self, view: &BlockView, block_name: &str) -> Result<Option<Resource>> {
        let cache_key = cache_key(view)?;
        let mut state = self.state.borrow_mut();
        if !state.is_loaded(&cache_key, block_name) {
            self.load_resource_for_block_name(&mut state, &cache_key, view, block_name)?;
        }
        Ok(state.resource(&cache_key, block_name))
    }

    fn get_resource_for_block_name_hierarchy(
        &self,
        view: &BlockView,
        hierarchy: &[String],
        level: usize,
    ) -> Result<Option<Resource>> {
        let mut state = self.state.borrow_mut();
        let cache_key = self.ensure_hierarchy_loaded(&mut state, view, hierarchy, level)?;
        Ok(state.resource(&cache_key, block_at(hierarchy, level)?))
    }

    fn get_resource_hierarchy_level(
        &self,
        view: &BlockView,
        hierarchy: &[String],
        level: usize,
    ) -> Result<Option<usize>> {
        let mut state = self.state.borrow_mut();
        let cache_key = self.ensure_hierarchy_loaded(&mut state, view, hierarchy, level)?;
        Ok(state.level(&cache_key, block_at(hierarchy, level)?).flatten())
    }
}

impl<L: fmt::Debug> fmt::Debug for ThemeEngine<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("loader", &self.loader)
            .field("default_themes", &self.default_themes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn fragment(text: &'static str) -> impl Fragment {
        move |_: &FragmentContext<'_>| -> Result<String> { Ok(text.to_owned()) }
    }

    fn view(parent: Option<&BlockView>, cache_key: &str) -> BlockView {
        let view = BlockView::new(parent);
        view.set_var(CACHE_KEY_VAR, cache_key);
        view
    }

    fn hierarchy(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    struct CountingLoader {
        themes: FragmentThemes,
        loads: Cell<usize>,
    }

    impl ThemeLoader for CountingLoader {
        fn load_theme(&self, theme: &str) -> Result<Vec<(String, Rc<dyn Fragment>)>> {
            self.loads.set(self.loads.get() + 1);
            self.themes.load_theme(theme)
        }
    }

    fn themes() -> FragmentThemes {
        FragmentThemes::new()
            .with_fragment("base", "block_widget", fragment("base block"))
            .with_fragment("base", "text_widget", fragment("base text"))
            .with_fragment("custom", "text_widget", fragment("custom text"))
    }

    #[test]
    fn test_default_themes_at_root() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_form_block");

        let resource = engine
            .get_resource_for_block_name(&root, "text_widget")
            .unwrap()
            .unwrap();
        assert_eq!(resource.theme(), "base");
        assert!(engine.get_resource_for_block_name(&root, "missing").unwrap().is_none());
    }

    #[test]
    fn test_later_default_theme_wins() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into(), "custom".into()]);
        let root = view(None, "_form_block");

        let resource = engine
            .get_resource_for_block_name(&root, "text_widget")
            .unwrap()
            .unwrap();
        assert_eq!(resource.theme(), "custom");
    }

    #[test]
    fn test_view_theme_overrides_parent() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_form_block");
        let child = view(Some(&root), "_form_name_text");
        engine.set_theme(&child, vec!["custom".into()], true).unwrap();

        let own = engine
            .get_resource_for_block_name(&child, "text_widget")
            .unwrap()
            .unwrap();
        assert_eq!(own.theme(), "custom");

        let inherited = engine
            .get_resource_for_block_name(&child, "block_widget")
            .unwrap()
            .unwrap();
        assert_eq!(inherited.theme(), "base");

        let root_text = engine
            .get_resource_for_block_name(&root, "text_widget")
            .unwrap()
            .unwrap();
        assert_eq!(root_text.theme(), "base");
    }

    #[test]
    fn test_disabled_default_themes() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_form_block");
        engine.set_theme(&root, vec!["custom".into()], false).unwrap();

        assert!(engine.get_resource_for_block_name(&root, "block_widget").unwrap().is_none());
        assert!(engine.get_resource_for_block_name(&root, "text_widget").unwrap().is_some());
    }

    #[test]
    fn test_hierarchy_falls_back_to_lower_level() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_form_choice");
        let names = hierarchy(&["block_widget", "choice_widget", "_form_widget"]);

        let resource = engine
            .get_resource_for_block_name_hierarchy(&root, &names, 2)
            .unwrap()
            .unwrap();
        assert_eq!(resource.block_name(), "block_widget");
        assert_eq!(
            engine.get_resource_hierarchy_level(&root, &names, 2).unwrap(),
            Some(0)
        );
        assert_eq!(
            engine.get_resource_hierarchy_level(&root, &names, 1).unwrap(),
            Some(0)
        );
    }

    #[test]
    fn test_hierarchy_not_found() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_form_choice");
        let names = hierarchy(&["choice_row", "_form_row"]);

        assert!(engine
            .get_resource_for_block_name_hierarchy(&root, &names, 1)
            .unwrap()
            .is_none());
        assert_eq!(engine.get_resource_hierarchy_level(&root, &names, 1).unwrap(), None);
    }

    #[test]
    fn test_level_of_resource_loaded_by_name() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_form_text");
        let names = hierarchy(&["block_widget", "text_widget"]);

        engine.get_resource_for_block_name(&root, "text_widget").unwrap();
        assert_eq!(engine.get_resource_hierarchy_level(&root, &names, 1).unwrap(), Some(1));
    }

    #[test]
    fn test_hierarchy_walks_past_name_lookup_miss() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_x_text");
        let names = hierarchy(&["block_widget", "choice_widget", "_x_widget"]);

        assert!(engine.get_resource_for_block_name(&root, "_x_widget").unwrap().is_none());

        let resource = engine
            .get_resource_for_block_name_hierarchy(&root, &names, 2)
            .unwrap()
            .unwrap();
        assert_eq!(resource.block_name(), "block_widget");
        assert_eq!(engine.get_resource_hierarchy_level(&root, &names, 2).unwrap(), Some(0));
    }

    #[test]
    fn test_hierarchy_keeps_resource_found_by_name() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["base".into()]);
        let root = view(None, "_x_text");
        let names = hierarchy(&["block_widget", "text_widget"]);

        engine.get_resource_for_block_name(&root, "text_widget").unwrap();
        let resource = engine
            .get_resource_for_block_name_hierarchy(&root, &names, 1)
            .unwrap()
            .unwrap();
        assert_eq!(resource.block_name(), "text_widget");
        assert_eq!(engine.get_resource_hierarchy_level(&root, &names, 1).unwrap(), Some(1));
    }

    #[test]
    fn test_themes_load_once_per_view() {
        let loader = CountingLoader {
            themes: themes(),
            loads: Cell::new(0),
        };
        let engine = ThemeEngine::with_default_themes(loader, vec!["base".into()]);
        let root = view(None, "_form_block");

        engine.get_resource_for_block_name(&root, "text_widget").unwrap();
        engine.get_resource_for_block_name(&root, "block_widget").unwrap();
        engine.get_resource_for_block_name(&root, "missing").unwrap();
        assert_eq!(engine.loader().loads.get(), 1);
    }

    #[test]
    fn test_unknown_theme_is_an_error() {
        let engine = ThemeEngine::with_default_themes(themes(), vec!["nope".into()]);
        let root = view(None, "_form_block");
        let err = engine.get_resource_for_block_name(&root, "block_widget").unwrap_err();
        assert!(matches!(err, BlockError::InvalidArgument(_)));
    }

    #[test]
    fn test_view_without_cache_key() {
        let engine = ThemeEngine::new(themes());
        let root = BlockView::new(None);
        let err = engine.get_resource_for_block_name(&root, "block_widget").unwrap_err();
        assert!(matches!(err, BlockError::Logic(_)));
    }

    #[test]
    fn test_from_config() {
        let config = RendererConfig::new(vec!["base".into()]);
        let engine = ThemeEngine::from_config(themes(), &config);
        assert_eq!(engine.default_themes(), ["base"]);
    }
}
