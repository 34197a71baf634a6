//! Configuration types for Tessera rendering.
//!
//! All types implement [`serde::Deserialize`] and can be loaded from TOML
//! with [`AppConfig::from_toml_str`]. Every section is optional.
//!
//! # Example
//!
//! ```
//! # use tessera::config::AppConfig;
//! let config = AppConfig::from_toml_str(
//!     r#"
//!     [renderer]
//!     default_themes = ["base", "compact"]
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.renderer().default_themes(), ["base", "compact"]);
//! ```

use serde::Deserialize;

use crate::error::{BlockError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Renderer configuration section.
    #[serde(default)]
    renderer: RendererConfig,
}

impl AppConfig {
    pub fn new(renderer: RendererConfig) -> Self {
        Self { renderer }
    }

    /// Parses a configuration from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::Config`] if the source is not valid TOML or does
    /// not match the configuration schema.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|err| BlockError::Config(err.to_string()))
    }

    /// Returns the renderer configuration.
    pub fn renderer(&self) -> &RendererConfig {
        &self.renderer
    }
}

/// Theme settings of the renderer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RendererConfig {
    /// Themes searched at the root view, later entries taking precedence.
    #[serde(default)]
    default_themes: Vec<String>,
}

impl RendererConfig {
    pub fn new(default_themes: Vec<String>) -> Self {
        Self { default_themes }
    }

    /// Returns the default theme names.
    pub fn default_themes(&self) -> &[String] {
        &self.default_themes
    }
}
