//! The four built-in `output.transform` names.
//! Locale-aware transforms are out of scope; these are fixed and
//! locale-independent.

use browserlet_protocol::TransformName;

use crate::error::{Error, Result};

/// Apply `transform` to `input`, producing the value written to the
/// extracted-variables map.
pub fn apply(transform: TransformName, input: &str) -> Result<String> {
    match transform {
        TransformName::Trim => Ok(input.trim().to_string()),
        TransformName::Uppercase => Ok(input.to_uppercase()),
        TransformName::Lowercase => Ok(input.to_lowercase()),
        TransformName::Number => extract_leading_number(input).ok_or_else(|| Error::TransformFailed {
            transform: "number",
            input: input.to_string(),
            message: "no leading numeric substring".to_string(),
        }),
    }
}

/// Scan `input` for the first numeric substring (optional leading `-`,
/// digits, optional fractional part) and render it as a canonical decimal
/// string, e.g. `"$42.50 USD"` -> `"42.50"`.
fn extract_leading_number(input: &str) -> Option<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() && !(chars[i].is_ascii_digit() || (chars[i] == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit))) {
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }
    let start = i;
    if chars[i] == '-' {
        i += 1;
    }
    let mut saw_digit = false;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
        saw_digit = true;
    }
    if i < chars.len() && chars[i] == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit) {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if !saw_digit {
        return None;
    }
    Some(chars[start..i].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        assert_eq!(apply(TransformName::Trim, "  hi  ").unwrap(), "hi");
    }

    #[test]
    fn extracts_leading_number_from_currency_text() {
        assert_eq!(apply(TransformName::Number, "$42.50 USD").unwrap(), "42.50");
    }

    #[test]
    fn extracts_negative_number() {
        assert_eq!(apply(TransformName::Number, "balance: -3.25").unwrap(), "-3.25");
    }

    #[test]
    fn number_transform_fails_without_digits() {
        assert!(apply(TransformName::Number, "no digits here").is_err());
    }

    #[test]
    fn uppercase_and_lowercase() {
        assert_eq!(apply(TransformName::Uppercase, "Sign In").unwrap(), "SIGN IN");
        assert_eq!(apply(TransformName::Lowercase, "Sign In").unwrap(), "sign in");
    }
}
