//! Block names.
//!
//! A block name is either empty or starts with a letter, digit or underscore
//! and continues with letters, digits, underscores, hyphens or colons.

use std::sync::atomic::{AtomicU64, Ordering};

use winnow::{
    Parser as _,
    error::ModalResult,
    token::{one_of, take_while},
};

static UNIQUE_NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

fn is_leading_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_trailing_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':')
}

fn block_name(input: &mut &str) -> ModalResult<()> {
    (one_of(is_leading_char), take_while(0.., is_trailing_char))
        .void()
        .parse_next(input)
}

/// Returns whether `name` is a valid block name.
///
/// # Examples
///
/// ```
/// use tessera_core::name::is_valid_name;
///
/// assert!(is_valid_name(""));
/// assert!(is_valid_name("a1_b-c:d"));
/// assert!(is_valid_name("_private"));
/// assert!(!is_valid_name("1 a"));
/// assert!(!is_valid_name("-dash"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    name.is_empty() || block_name.parse(name).is_ok()
}

/// Generates a process-wide unique block name.
///
/// Generated names are valid block names and never collide with each other.
pub fn create_unique_name() -> String {
    let idx = UNIQUE_NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("block{idx:x}")
}

/// Turns a property or block name into a human readable label.
///
/// Camel case humps and underscores become word breaks, the result is
/// lowercased and its first letter capitalized.
///
/// ```
/// use tessera_core::name::humanize;
///
/// assert_eq!(humanize("firstName"), "First name");
/// assert_eq!(humanize("billing_address__line"), "Billing address line");
/// ```
pub fn humanize(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() + 4);
    let mut in_break = false;
    for c in text.chars() {
        let is_break = c == '_' || c.is_whitespace() || c.is_uppercase();
        if is_break && !in_break {
            spaced.push(' ');
        }
        in_break = is_break && !c.is_uppercase();
        if !(c == '_' || c.is_whitespace()) {
            spaced.push(c);
        }
    }

    let lowered = spaced.trim().to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name(""));
        assert!(is_valid_name("a1_b-c:d"));
        assert!(is_valid_name("1abc"));
        assert!(is_valid_name("_abc"));
        assert!(is_valid_name("a:b::c"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_name("1 a"));
        assert!(!is_valid_name(" a"));
        assert!(!is_valid_name("-a"));
        assert!(!is_valid_name(":a"));
        assert!(!is_valid_name("a.b"));
        assert!(!is_valid_name("a[b]"));
    }

    #[test]
    fn test_unique_names_are_valid_and_distinct() {
        let first = create_unique_name();
        let second = create_unique_name();
        assert_ne!(first, second);
        assert!(is_valid_name(&first));
        assert!(first.starts_with("block"));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("name"), "Name");
        assert_eq!(humanize("firstName"), "First name");
        assert_eq!(humanize("first_name"), "First name");
        assert_eq!(humanize("  padded  value "), "Padded value");
        assert_eq!(humanize(""), "");
    }

    proptest! {
        #[test]
        fn prop_pattern_names_are_valid(name in "[A-Za-z0-9_][A-Za-z0-9_:-]{0,16}") {
            prop_assert!(is_valid_name(&name));
        }

        #[test]
        fn prop_names_with_spaces_are_invalid(head in "[a-z]{1,6}", tail in "[a-z]{0,6}") {
            let name = format!("{head} {tail}");
            prop_assert!(!is_valid_name(&name));
        }
    }
}
