//! Type guessing.
//!
//! A [`BlockTypeGuesser`] suggests a block type for a property of a data
//! class, for instance from ORM metadata or validation constraints. Several
//! guessers are combined with a [`BlockTypeGuesserChain`], which keeps the
//! most confident suggestion.

use std::{fmt, rc::Rc};

use tessera_core::Options;

/// How sure a guesser is about its suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    Low,
    Medium,
    High,
    /// Reserved for guesses that are certainly right.
    VeryHigh,
}

/// A suggested block type with options.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeGuess {
    type_name: String,
    options: Options,
    confidence: Confidence,
}

impl TypeGuess {
    pub fn new(type_name: impl Into<String>, options: Options, confidence: Confidence) -> Self {
        Self {
            type_name: type_name.into(),
            options,
            confidence,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Returns the most confident guess.
    ///
    /// Among guesses of equal confidence the first one wins.
    pub fn best_guess(guesses: impl IntoIterator<Item = TypeGuess>) -> Option<TypeGuess> {
        guesses.into_iter().fold(None, |best, guess| match best {
            Some(best) if best.confidence >= guess.confidence => Some(best),
            _ => Some(guess),
        })
    }
}

/// Suggests block types for data class properties.
pub trait BlockTypeGuesser {
    /// Guesses the type of `property` on `class`, or `None` without an
    /// opinion.
    fn guess_type(&self, class: &str, property: &str) -> Option<TypeGuess>;

    /// Returns this guesser as a chain, so nested chains can be flattened.
    fn as_chain(&self) -> Option<&BlockTypeGuesserChain> {
        None
    }
}

/// Combines guessers, returning the most confident guess among them.
#[derive(Clone, Default)]
pub struct BlockTypeGuesserChain {
    guessers: Vec<Rc<dyn BlockTypeGuesser>>,
}

impl BlockTypeGuesserChain {
    /// Creates a chain, inlining the members of nested chains.
    pub fn new(guessers: impl IntoIterator<Item = Rc<dyn BlockTypeGuesser>>) -> Self {
        let mut flattened = Vec::new();
        for guesser in guessers {
            match guesser.as_chain() {
                Some(chain) => flattened.extend(chain.guessers.iter().cloned()),
                None => flattened.push(guesser),
            }
        }
        Self {
            guessers: flattened,
        }
    }

    pub fn len(&self) -> usize {
        self.guessers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guessers.is_empty()
    }
}

impl BlockTypeGuesser for BlockTypeGuesserChain {
    fn guess_type(&self, class: &str, property: &str) -> Option<TypeGuess> {
        TypeGuess::best_guess(
            self.guessers
                .iter()
                .filter_map(|guesser| guesser.guess_type(class, property)),
        )
    }

    fn as_chain(&self) -> Option<&BlockTypeGuesserChain> {
        Some(self)
    }
}

impl fmt::Debug for BlockTypeGuesserChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockTypeGuesserChain")
            .field("guessers", &self.guessers.len())
            .finish()
    }
}
