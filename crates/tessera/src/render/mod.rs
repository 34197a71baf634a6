//! Themed rendering of block views.
//!
//! - [`BlockRenderer`] resolves block-name hierarchies and variable scopes.
//! - [`RendererEngine`] finds theme resources; [`ThemeEngine`] is the
//!   standard engine over any [`ThemeLoader`].
//! - [`FragmentThemes`] holds themes made of Rust closures.

mod engine;
mod fragment;
mod renderer;

pub use engine::{CACHE_KEY_VAR, FragmentThemes, RendererEngine, Resource, ThemeEngine, ThemeLoader};
pub use fragment::{Fragment, FragmentContext};
pub use renderer::{BlockRenderer, VIEW_KEY_VAR};
