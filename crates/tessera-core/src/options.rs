//! Option schemas.
//!
//! An [`OptionsResolver`] declares which options a block type accepts, their
//! defaults and their constraints, and turns the raw options passed by a
//! caller into a validated, fully defaulted [`Options`] map.
//!
//! # Resolution
//!
//! Each defined option is resolved at most once, on demand:
//!
//! 1. The value passed by the caller, if any, otherwise
//! 2. the plain default (or `Null`), fed through the chain of lazy defaults,
//!    each receiving the previous value and read access to other options.
//! 3. The value is checked against the allowed kinds and allowed values.
//! 4. Normalizers run in declaration order.
//!
//! Lazy defaults and normalizers read other options through
//! [`OptionsAccess::get`], which resolves them recursively. A lazy default
//! that ends up reading itself fails with [`OptionsError::Cycle`].
//!
//! # Example
//!
//! ```
//! use tessera_core::{OptionsResolver, Value, ValueKind, options};
//!
//! let mut resolver = OptionsResolver::new();
//! resolver
//!     .set_default("compound", true)
//!     .set_lazy_default("empty_data", |opts, _previous| {
//!         Ok(if opts.get("compound")?.is_truthy() {
//!             Value::from(options! {})
//!         } else {
//!             Value::from("")
//!         })
//!     });
//! resolver.set_allowed_types("compound", &[ValueKind::Bool]).unwrap();
//!
//! let resolved = resolver.resolve(options! { "compound" => false }).unwrap();
//! assert_eq!(resolved["empty_data"], Value::from(""));
//! ```

use std::{fmt, rc::Rc};

use indexmap::{IndexMap, IndexSet};
use log::trace;
use thiserror::Error;

use crate::value::{Map, Options, Value, ValueKind};

/// A lazily computed default, receiving the previous default.
pub type LazyDefault = Rc<dyn Fn(&mut OptionsAccess<'_>, Value) -> Result<Value, OptionsError>>;

/// A post-resolution transformation of an option value.
pub type Normalizer = Rc<dyn Fn(&mut OptionsAccess<'_>, Value) -> Result<Value, OptionsError>>;

/// A predicate accepting or rejecting an option value.
pub type ValuePredicate = Rc<dyn Fn(&Value) -> bool>;

/// Errors raised while declaring or resolving options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error(
        "the option(s) \"{}\" do(es) not exist; defined options are: \"{}\"{}",
        .names.join("\", \""),
        .defined.join("\", \""),
        suggestion_hint(.suggestion)
    )]
    Undefined {
        names: Vec<String>,
        defined: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("the required option(s) \"{}\" are missing", .names.join("\", \""))]
    Missing { names: Vec<String> },

    #[error("the option \"{name}\" is expected to be of type {expected}, but is of type \"{actual}\"")]
    InvalidType {
        name: String,
        expected: String,
        actual: ValueKind,
    },

    #[error("the option \"{name}\" with value \"{value}\" is invalid; accepted values are: {accepted}")]
    InvalidValue {
        name: String,
        value: String,
        accepted: String,
    },

    #[error("the option \"{name}\" has no value set")]
    NoValue { name: String },

    #[error("the option \"{name}\" is not defined")]
    NotDefined { name: String },

    #[error("the options \"{}\" have a cyclic dependency", .path.join("\" -> \""))]
    Cycle { path: Vec<String> },

    #[error("the option \"{name}\" could not be normalized: {message}")]
    Normalization { name: String, message: String },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|name| format!(" (did you mean \"{name}\"?)"))
        .unwrap_or_default()
}

impl OptionsError {
    /// Creates a [`OptionsError::Normalization`] error for `name`.
    pub fn normalization(name: &str, message: impl Into<String>) -> Self {
        Self::Normalization {
            name: name.to_owned(),
            message: message.into(),
        }
    }
}

#[derive(Clone)]
enum AllowedValue {
    Exact(Value),
    Predicate(ValuePredicate),
}

impl AllowedValue {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Exact(allowed) => allowed == value,
            Self::Predicate(predicate) => predicate(value),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Exact(allowed) => format!("\"{allowed}\""),
            Self::Predicate(_) => "<predicate>".to_owned(),
        }
    }
}

/// Declares and resolves an option schema.
///
/// Cloning a resolver yields an independent schema that can be extended
/// without affecting the original; this is how child block types build on
/// the schema of their parent type.
#[derive(Clone, Default)]
pub struct OptionsResolver {
    defined: IndexSet<String>,
    defaults: IndexMap<String, Value>,
    lazy: IndexMap<String, Vec<LazyDefault>>,
    required: IndexSet<String>,
    allowed_types: IndexMap<String, Vec<ValueKind>>,
    allowed_values: IndexMap<String, Vec<AllowedValue>>,
    normalizers: IndexMap<String, Vec<Normalizer>>,
}

impl fmt::Debug for OptionsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsResolver")
            .field("defined", &self.defined)
            .field("defaults", &self.defaults)
            .field("lazy", &self.lazy.keys().collect::<Vec<_>>())
            .field("required", &self.required)
            .field("allowed_types", &self.allowed_types)
            .field("normalizers", &self.normalizers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl OptionsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a plain default, discarding any lazy defaults of the option.
    pub fn set_default(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.defined.insert(name.to_owned());
        self.defaults.insert(name.to_owned(), value.into());
        self.lazy.shift_remove(name);
        self
    }

    /// Sets several plain defaults at once.
    pub fn set_defaults(&mut self, defaults: Options) -> &mut Self {
        for (name, value) in defaults {
            self.set_default(&name, value);
        }
        self
    }

    /// Appends a lazy default to the option.
    ///
    /// The closure receives the value computed so far (the plain default,
    /// the previous lazy default's result, or `Null`) and may read other
    /// options.
    pub fn set_lazy_default<F>(&mut self, name: &str, default: F) -> &mut Self
    where
        F: Fn(&mut OptionsAccess<'_>, Value) -> Result<Value, OptionsError> + 'static,
    {
        self.defined.insert(name.to_owned());
        self.lazy
            .entry(name.to_owned())
            .or_default()
            .push(Rc::new(default));
        self
    }

    /// Marks options as required.
    pub fn set_required(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.defined.insert((*name).to_owned());
            self.required.insert((*name).to_owned());
        }
        self
    }

    /// Declares options without giving them a default.
    pub fn set_defined(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.defined.insert((*name).to_owned());
        }
        self
    }

    /// Removes an option and everything declared about it.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.defined.shift_remove(name);
        self.defaults.shift_remove(name);
        self.lazy.shift_remove(name);
        self.required.shift_remove(name);
        self.allowed_types.shift_remove(name);
        self.allowed_values.shift_remove(name);
        self.normalizers.shift_remove(name);
        self
    }

    /// Replaces the allowed kinds of an option.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::NotDefined`] if the option is not defined.
    pub fn set_allowed_types(
        &mut self,
        name: &str,
        kinds: &[ValueKind],
    ) -> Result<&mut Self, OptionsError> {
        self.ensure_defined(name)?;
        self.allowed_types.insert(name.to_owned(), kinds.to_vec());
        Ok(self)
    }

    /// Adds allowed kinds to an option.
    pub fn add_allowed_types(
        &mut self,
        name: &str,
        kinds: &[ValueKind],
    ) -> Result<&mut Self, OptionsError> {
        self.ensure_defined(name)?;
        self.allowed_types
            .entry(name.to_owned())
            .or_default()
            .extend_from_slice(kinds);
        Ok(self)
    }

    /// Replaces the allowed values of an option.
    pub fn set_allowed_values(
        &mut self,
        name: &str,
        values: Vec<Value>,
    ) -> Result<&mut Self, OptionsError> {
        self.ensure_defined(name)?;
        self.allowed_values.insert(
            name.to_owned(),
            values.into_iter().map(AllowedValue::Exact).collect(),
        );
        Ok(self)
    }

    /// Adds allowed values to an option.
    pub fn add_allowed_values(
        &mut self,
        name: &str,
        values: Vec<Value>,
    ) -> Result<&mut Self, OptionsError> {
        self.ensure_defined(name)?;
        self.allowed_values
            .entry(name.to_owned())
            .or_default()
            .extend(values.into_iter().map(AllowedValue::Exact));
        Ok(self)
    }

    /// Adds a predicate the option value may satisfy instead of matching an
    /// exact allowed value.
    pub fn add_allowed_predicate<F>(&mut self, name: &str, predicate: F) -> Result<&mut Self, OptionsError>
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.ensure_defined(name)?;
        self.allowed_values
            .entry(name.to_owned())
            .or_default()
            .push(AllowedValue::Predicate(Rc::new(predicate)));
        Ok(self)
    }

    /// Replaces the normalizers of an option with `normalizer`.
    pub fn set_normalizer<F>(&mut self, name: &str, normalizer: F) -> Result<&mut Self, OptionsError>
    where
        F: Fn(&mut OptionsAccess<'_>, Value) -> Result<Value, OptionsError> + 'static,
    {
        self.ensure_defined(name)?;
        self.normalizers
            .insert(name.to_owned(), vec![Rc::new(normalizer)]);
        Ok(self)
    }

    /// Appends a normalizer to an option.
    pub fn add_normalizer<F>(&mut self, name: &str, normalizer: F) -> Result<&mut Self, OptionsError>
    where
        F: Fn(&mut OptionsAccess<'_>, Value) -> Result<Value, OptionsError> + 'static,
    {
        self.ensure_defined(name)?;
        self.normalizers
            .entry(name.to_owned())
            .or_default()
            .push(Rc::new(normalizer));
        Ok(self)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Returns whether the option has a plain or lazy default.
    pub fn has_default(&self, name: &str) -> bool {
        self.defaults.contains_key(name) || self.lazy.contains_key(name)
    }

    /// Iterates over the defined option names in declaration order.
    pub fn defined_options(&self) -> impl Iterator<Item = &str> {
        self.defined.iter().map(String::as_str)
    }

    /// Validates `options` against the schema and fills in defaults.
    ///
    /// The result lists every option that has a value, in declaration
    /// order. Options that are only defined and were not passed are absent.
    ///
    /// # Errors
    ///
    /// - [`OptionsError::Undefined`] if `options` contains unknown keys
    /// - [`OptionsError::Missing`] if a required option has no value
    /// - [`OptionsError::InvalidType`] / [`OptionsError::InvalidValue`] on
    ///   constraint violations
    /// - any error raised by a lazy default or normalizer
    pub fn resolve(&self, options: Options) -> Result<Options, OptionsError> {
        let undefined: Vec<String> = options
            .keys()
            .filter(|name| !self.defined.contains(*name))
            .cloned()
            .collect();
        if !undefined.is_empty() {
            return Err(self.undefined_error(undefined));
        }

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !options.contains_key(*name) && !self.has_default(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(OptionsError::Missing { names: missing });
        }

        let mut access = OptionsAccess {
            resolver: self,
            given: options,
            resolved: Map::new(),
            calling: IndexSet::new(),
        };
        for name in &self.defined {
            if access.has(name) {
                access.get(name)?;
            }
        }

        let mut resolved = Map::with_capacity(access.resolved.len());
        for name in &self.defined {
            if let Some(value) = access.resolved.shift_remove(name) {
                resolved.insert(name.clone(), value);
            }
        }

        trace!(options_count = resolved.len(); "Resolved options");
        Ok(resolved)
    }

    fn ensure_defined(&self, name: &str) -> Result<(), OptionsError> {
        if self.defined.contains(name) {
            Ok(())
        } else {
            Err(OptionsError::NotDefined {
                name: name.to_owned(),
            })
        }
    }

    fn undefined_error(&self, names: Vec<String>) -> OptionsError {
        let suggestion = names.first().and_then(|unknown| {
            self.defined
                .iter()
                .min_by_key(|known| strsim::levenshtein(unknown, known))
                .filter(|known| strsim::levenshtein(unknown, known) <= 3)
                .cloned()
        });
        let mut defined: Vec<String> = self.defined.iter().cloned().collect();
        defined.sort();

        OptionsError::Undefined {
            names,
            defined,
            suggestion,
        }
    }

    fn check_allowed_types(&self, name: &str, value: &Value) -> Result<(), OptionsError> {
        let Some(kinds) = self.allowed_types.get(name) else {
            return Ok(());
        };
        if kinds.is_empty() || kinds.contains(&value.kind()) {
            return Ok(());
        }

        let expected = kinds
            .iter()
            .map(|kind| format!("\"{kind}\""))
            .collect::<Vec<_>>()
            .join(" or ");
        Err(OptionsError::InvalidType {
            name: name.to_owned(),
            expected,
            actual: value.kind(),
        })
    }

    fn check_allowed_values(&self, name: &str, value: &Value) -> Result<(), OptionsError> {
        let Some(allowed) = self.allowed_values.get(name) else {
            return Ok(());
        };
        if allowed.is_empty() || allowed.iter().any(|candidate| candidate.accepts(value)) {
            return Ok(());
        }

        let accepted = allowed
            .iter()
            .map(AllowedValue::describe)
            .collect::<Vec<_>>()
            .join(", ");
        Err(OptionsError::InvalidValue {
            name: name.to_owned(),
            value: value.to_string(),
            accepted,
        })
    }
}

/// Read access to options during resolution.
///
/// Handed to lazy defaults and normalizers so that one option can be
/// computed from others.
pub struct OptionsAccess<'r> {
    resolver: &'r OptionsResolver,
    given: Options,
    resolved: Map,
    calling: IndexSet<String>,
}

impl<'r> OptionsAccess<'r> {
    /// Returns whether `name` will have a value once resolved.
    pub fn has(&self, name: &str) -> bool {
        self.given.contains_key(name) || self.resolver.has_default(name)
    }

    /// Resolves and returns the value of `name`.
    ///
    /// # Errors
    ///
    /// - [`OptionsError::NotDefined`] if the option is unknown
    /// - [`OptionsError::NoValue`] if the option is defined but has no value
    /// - [`OptionsError::Cycle`] if resolving it requires itself
    pub fn get(&mut self, name: &str) -> Result<Value, OptionsError> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }

        let resolver = self.resolver;
        resolver.ensure_defined(name)?;
        if !self.has(name) {
            return Err(OptionsError::NoValue {
                name: name.to_owned(),
            });
        }
        if self.calling.contains(name) {
            let mut path: Vec<String> = self.calling.iter().cloned().collect();
            path.push(name.to_owned());
            return Err(OptionsError::Cycle { path });
        }

        self.calling.insert(name.to_owned());
        let result = self.compute(resolver, name);
        self.calling.shift_remove(name);

        let value = result?;
        self.resolved.insert(name.to_owned(), value.clone());
        Ok(value)
    }

    fn compute(&mut self, resolver: &'r OptionsResolver, name: &str) -> Result<Value, OptionsError> {
        let mut value = match self.given.get(name) {
            Some(given) => given.clone(),
            None => {
                let mut value = resolver.defaults.get(name).cloned().unwrap_or_default();
                if let Some(chain) = resolver.lazy.get(name) {
                    for lazy in chain {
                        value = lazy(self, value)?;
                    }
                }
                value
            }
        };

        resolver.check_allowed_types(name, &value)?;
        resolver.check_allowed_values(name, &value)?;

        if let Some(normalizers) = resolver.normalizers.get(name) {
            for normalizer in normalizers {
                value = normalizer(self, value)?;
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options;

    fn block_resolver() -> OptionsResolver {
        let mut resolver = OptionsResolver::new();
        resolver
            .set_default("compound", true)
            .set_default("label", Value::Null)
            .set_default("attr", options! {})
            .set_defined(&["property_path"]);
        resolver
    }

    #[test]
    fn test_defaults_are_filled_in_declaration_order() {
        let resolved = block_resolver()
            .resolve(options! { "label" => "Name" })
            .unwrap();
        let keys: Vec<_> = resolved.keys().map(String::as_str).collect();
        assert_eq!(keys, ["compound", "label", "attr"]);
        assert_eq!(resolved["label"], Value::from("Name"));
        assert_eq!(resolved["compound"], Value::from(true));
    }

    #[test]
    fn test_defined_option_without_value_is_absent() {
        let resolved = block_resolver().resolve(options! {}).unwrap();
        assert!(!resolved.contains_key("property_path"));

        let resolved = block_resolver()
            .resolve(options! { "property_path" => "[a]" })
            .unwrap();
        assert_eq!(resolved["property_path"], Value::from("[a]"));
    }

    #[test]
    fn test_undefined_option_with_suggestion() {
        let err = block_resolver()
            .resolve(options! { "lable" => "Name" })
            .unwrap_err();
        match &err {
            OptionsError::Undefined {
                names, suggestion, ..
            } => {
                assert_eq!(names, &["lable".to_owned()]);
                assert_eq!(suggestion.as_deref(), Some("label"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("did you mean \"label\""));
    }

    #[test]
    fn test_missing_required_option() {
        let mut resolver = block_resolver();
        resolver.set_required(&["type"]);
        let err = resolver.resolve(options! {}).unwrap_err();
        assert_eq!(
            err,
            OptionsError::Missing {
                names: vec!["type".to_owned()]
            }
        );
        assert!(resolver.resolve(options! { "type" => "text" }).is_ok());
    }

    #[test]
    fn test_required_option_with_default_is_not_missing() {
        let mut resolver = block_resolver();
        resolver.set_required(&["compound"]);
        assert!(resolver.resolve(options! {}).is_ok());
    }

    #[test]
    fn test_lazy_default_reads_other_options() {
        let mut resolver = block_resolver();
        resolver.set_lazy_default("empty_data", |opts, _| {
            Ok(if opts.get("compound")?.is_truthy() {
                Value::from(options! {})
            } else {
                Value::from("")
            })
        });

        let resolved = resolver.resolve(options! { "compound" => false }).unwrap();
        assert_eq!(resolved["empty_data"], Value::from(""));

        let resolved = resolver.resolve(options! {}).unwrap();
        assert_eq!(resolved["empty_data"], Value::from(options! {}));
    }

    #[test]
    fn test_lazy_default_chain_receives_previous_value() {
        let mut resolver = OptionsResolver::new();
        resolver
            .set_default("prefix", "a")
            .set_lazy_default("prefix", |_, previous| Ok(Value::from(format!("{previous}b"))))
            .set_lazy_default("prefix", |_, previous| Ok(Value::from(format!("{previous}c"))));

        let resolved = resolver.resolve(options! {}).unwrap();
        assert_eq!(resolved["prefix"], Value::from("abc"));
    }

    #[test]
    fn test_plain_default_discards_lazy_chain() {
        let mut resolver = OptionsResolver::new();
        resolver
            .set_lazy_default("label", |_, _| Ok(Value::from("lazy")))
            .set_default("label", "plain");
        let resolved = resolver.resolve(options! {}).unwrap();
        assert_eq!(resolved["label"], Value::from("plain"));
    }

    #[test]
    fn test_given_value_skips_lazy_default() {
        let mut resolver = OptionsResolver::new();
        resolver.set_lazy_default("label", |_, _| {
            Err(OptionsError::normalization("label", "should not run"))
        });
        let resolved = resolver.resolve(options! { "label" => "given" }).unwrap();
        assert_eq!(resolved["label"], Value::from("given"));
    }

    #[test]
    fn test_cycle_detection() {
        let mut resolver = OptionsResolver::new();
        resolver
            .set_lazy_default("a", |opts, _| opts.get("b"))
            .set_lazy_default("b", |opts, _| opts.get("a"));

        let err = resolver.resolve(options! {}).unwrap_err();
        assert_eq!(
            err,
            OptionsError::Cycle {
                path: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_reading_option_without_value() {
        let mut resolver = block_resolver();
        resolver.set_lazy_default("full_path", |opts, _| opts.get("property_path"));
        let err = resolver.resolve(options! {}).unwrap_err();
        assert_eq!(
            err,
            OptionsError::NoValue {
                name: "property_path".into()
            }
        );
    }

    #[test]
    fn test_allowed_types() {
        let mut resolver = block_resolver();
        resolver
            .set_allowed_types("label", &[ValueKind::Null, ValueKind::String])
            .unwrap();

        assert!(resolver.resolve(options! { "label" => "ok" }).is_ok());
        let err = resolver.resolve(options! { "label" => 3 }).unwrap_err();
        assert_eq!(
            err,
            OptionsError::InvalidType {
                name: "label".into(),
                expected: "\"null\" or \"string\"".into(),
                actual: ValueKind::Int,
            }
        );
    }

    #[test]
    fn test_allowed_values_and_predicates() {
        let mut resolver = OptionsResolver::new();
        resolver.set_default("size", "md");
        resolver
            .set_allowed_values("size", vec!["sm".into(), "md".into()])
            .unwrap()
            .add_allowed_predicate("size", |value| {
                value.as_str().is_some_and(|s| s.ends_with("px"))
            })
            .unwrap();

        assert!(resolver.resolve(options! { "size" => "sm" }).is_ok());
        assert!(resolver.resolve(options! { "size" => "12px" }).is_ok());
        let err = resolver.resolve(options! { "size" => "xl" }).unwrap_err();
        assert!(matches!(err, OptionsError::InvalidValue { ref name, .. } if name == "size"));
    }

    #[test]
    fn test_constraints_require_defined_option() {
        let mut resolver = OptionsResolver::new();
        assert_eq!(
            resolver
                .set_allowed_types("nope", &[ValueKind::Bool])
                .unwrap_err(),
            OptionsError::NotDefined {
                name: "nope".into()
            }
        );
    }

    #[test]
    fn test_normalizer_consults_other_options() {
        let mut resolver = block_resolver();
        resolver
            .set_normalizer("label", |opts, value| {
                if value.is_null() && !opts.get("compound")?.is_truthy() {
                    Ok(Value::from("Field"))
                } else {
                    Ok(value)
                }
            })
            .unwrap();

        let resolved = resolver.resolve(options! { "compound" => false }).unwrap();
        assert_eq!(resolved["label"], Value::from("Field"));
        let resolved = resolver.resolve(options! {}).unwrap();
        assert_eq!(resolved["label"], Value::Null);
    }

    #[test]
    fn test_normalizers_run_in_order() {
        let mut resolver = OptionsResolver::new();
        resolver.set_default("name", "x");
        resolver
            .add_normalizer("name", |_, v| Ok(Value::from(format!("{v}1"))))
            .unwrap()
            .add_normalizer("name", |_, v| Ok(Value::from(format!("{v}2"))))
            .unwrap();
        let resolved = resolver.resolve(options! {}).unwrap();
        assert_eq!(resolved["name"], Value::from("x12"));
    }

    #[test]
    fn test_clone_extends_independently() {
        let parent = block_resolver();
        let mut child = parent.clone();
        child.set_default("compound", false).set_default("max", 3);

        let parent_resolved = parent.resolve(options! {}).unwrap();
        let child_resolved = child.resolve(options! {}).unwrap();
        assert_eq!(parent_resolved["compound"], Value::from(true));
        assert!(!parent_resolved.contains_key("max"));
        assert_eq!(child_resolved["compound"], Value::from(false));
        assert_eq!(child_resolved["max"], Value::from(3));
    }

    #[test]
    fn test_remove() {
        let mut resolver = block_resolver();
        resolver.remove("label");
        assert!(!resolver.is_defined("label"));
        assert!(resolver.resolve(options! { "label" => "x" }).is_err());
    }
}
