use std::fmt;

use crate::error::{Error, ValidationError};

/// A validated MySQL identifier (table, column, index, or constraint name).
///
/// Validation happens once, at construction, so every later consumer
/// (ordering, plan rendering, the executor) can assume the value is safe to
/// interpolate into backtick-quoted DDL without re-checking it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn new(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        if !is_valid_identifier(&value) {
            return Err(ValidationError::InvalidIdentifier { value }.into());
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the identifier backtick-quoted, doubling any literal backtick.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0.replace('`', "``"))
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[must_use]
pub fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_leading_underscore_and_digits() {
        assert!(is_valid_identifier("_users2"));
        assert!(Ident::new("_users2").is_ok());
    }

    #[test]
    fn rejects_leading_digit_and_empty() {
        assert!(!is_valid_identifier("2users"));
        assert!(!is_valid_identifier(""));
        assert!(Ident::new("2users").is_err());
    }

    #[test]
    fn quotes_with_doubled_backtick() {
        let ident = Ident::new("weird_name").unwrap();
        assert_eq!(ident.quoted(), "`weird_name`");
    }
}
