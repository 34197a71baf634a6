//! Data transformers.
//!
//! A block holds its data in three layers:
//!
//! ```text
//! model data --(model transformers)--> normalized data --(view transformers)--> view data
//! ```
//!
//! Each layer transition runs an ordered [`TransformerChain`]. Transformers
//! reject input of the wrong shape with [`BlockError::TransformationFailed`].

use std::{fmt, rc::Rc};

use tessera_core::Value;

use crate::error::{BlockError, Result};

/// Converts values between two data layers.
pub trait DataTransformer {
    /// Transforms a value towards the view.
    fn transform(&self, value: Value) -> Result<Value>;

    /// Transforms a value back towards the model.
    fn reverse_transform(&self, value: Value) -> Result<Value>;
}

type TransformFn = Box<dyn Fn(Value) -> Result<Value>>;

/// A transformer built from two closures.
///
/// # Example
///
/// ```
/// use tessera::{CallbackTransformer, DataTransformer};
/// use tessera_core::Value;
///
/// let upper = CallbackTransformer::new(
///     |value| Ok(Value::from(value.to_string().to_uppercase())),
///     |value| Ok(Value::from(value.to_string().to_lowercase())),
/// );
/// assert_eq!(upper.transform(Value::from("ab")).unwrap(), Value::from("AB"));
/// ```
pub struct CallbackTransformer {
    transform: TransformFn,
    reverse: TransformFn,
}

impl CallbackTransformer {
    pub fn new<T, R>(transform: T, reverse: R) -> Self
    where
        T: Fn(Value) -> Result<Value> + 'static,
        R: Fn(Value) -> Result<Value> + 'static,
    {
        Self {
            transform: Box::new(transform),
            reverse: Box::new(reverse),
        }
    }
}

impl DataTransformer for CallbackTransformer {
    fn transform(&self, value: Value) -> Result<Value> {
        (self.transform)(value)
    }

    fn reverse_transform(&self, value: Value) -> Result<Value> {
        (self.reverse)(value)
    }
}

impl fmt::Debug for CallbackTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackTransformer")
    }
}

/// Rejects values whose kind is not one of `expected`.
pub fn expect_kind(value: &Value, expected: &[tessera_core::ValueKind]) -> Result<()> {
    if expected.contains(&value.kind()) {
        Ok(())
    } else {
        Err(BlockError::transformation_failed(format!(
            "expected a value of kind {}, got \"{}\"",
            expected
                .iter()
                .map(|kind| format!("\"{kind}\""))
                .collect::<Vec<_>>()
                .join(" or "),
            value.kind()
        )))
    }
}

/// An ordered list of transformers applied one after another.
#[derive(Clone, Default)]
pub struct TransformerChain {
    transformers: Vec<Rc<dyn DataTransformer>>,
}

impl TransformerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, transformer: Rc<dyn DataTransformer>) {
        self.transformers.push(transformer);
    }

    pub fn prepend(&mut self, transformer: Rc<dyn DataTransformer>) {
        self.transformers.insert(0, transformer);
    }

    pub fn clear(&mut self) {
        self.transformers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn transformers(&self) -> &[Rc<dyn DataTransformer>] {
        &self.transformers
    }

    /// Runs every transformer in order.
    pub fn transform(&self, value: Value) -> Result<Value> {
        self.transformers
            .iter()
            .try_fold(value, |value, transformer| transformer.transform(value))
    }

    /// Runs every reverse transformation, last transformer first.
    pub fn reverse_transform(&self, value: Value) -> Result<Value> {
        self.transformers
            .iter()
            .rev()
            .try_fold(value, |value, transformer| transformer.reverse_transform(value))
    }
}

impl fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerChain")
            .field("len", &self.transformers.len())
            .finish()
    }
}

/// Chains are equal when they hold the same transformers in the same order.
impl PartialEq for TransformerChain {
    fn eq(&self, other: &Self) -> bool {
        self.transformers.len() == other.transformers.len()
            && self
                .transformers
                .iter()
                .zip(&other.transformers)
                .all(|(left, right)| Rc::ptr_eq(left, right))
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::ValueKind;

    use super::*;

    fn wrap(label: &'static str) -> Rc<dyn DataTransformer> {
        Rc::new(CallbackTransformer::new(
            move |value| Ok(Value::from(format!("{label}[{value}]"))),
            move |value| {
                let text = value.to_string();
                text.strip_prefix(&format!("{label}["))
                    .and_then(|rest| rest.strip_suffix(']'))
                    .map(Value::from)
                    .ok_or_else(|| BlockError::transformation_failed(format!("not wrapped in {label}")))
            },
        ))
    }

    #[test]
    fn test_chain_order() {
        let mut chain = TransformerChain::new();
        chain.append(wrap("a"));
        chain.append(wrap("b"));
        chain.prepend(wrap("first"));

        let forward = chain.transform(Value::from("x")).unwrap();
        assert_eq!(forward, Value::from("b[a[first[x]]]"));
        assert_eq!(chain.reverse_transform(forward).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_failure_propagates() {
        let mut chain = TransformerChain::new();
        chain.append(wrap("a"));
        let err = chain.reverse_transform(Value::from("x")).unwrap_err();
        assert!(matches!(err, BlockError::TransformationFailed(_)));
    }

    #[test]
    fn test_expect_kind() {
        assert!(expect_kind(&Value::from("x"), &[ValueKind::String]).is_ok());
        let err = expect_kind(&Value::from(1), &[ValueKind::String, ValueKind::Null]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to transform value: expected a value of kind \"string\" or \"null\", got \"int\""
        );
    }
}
