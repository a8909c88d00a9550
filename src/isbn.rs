// ISBN clean-up shared by every operation that takes an ISBN from the user.

use crate::error::{ClientError, Result};

/// Shortest accepted identifier once separators are gone (ISBN-10).
pub const MIN_ISBN_LEN: usize = 10;

fn is_separator(c: char) -> bool {
    c == '-' || c == '.' || c == '_' || c.is_whitespace()
}

/// Strip hyphens, dots, underscores and whitespace, and upper-case the rest
/// so an `x` check digit matches the catalog's stored form.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !is_separator(*c))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Normalize and reject anything shorter than [`MIN_ISBN_LEN`].
pub fn parse(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(ClientError::validation("Please enter an ISBN."));
    }
    let isbn = normalize(raw);
    if isbn.chars().count() < MIN_ISBN_LEN {
        return Err(ClientError::validation(format!(
            "Invalid ISBN format: an ISBN must have at least {} characters.",
            MIN_ISBN_LEN
        )));
    }
    Ok(isbn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("978-0-14-032872-1", "9780140328721")]
    #[case("978.0.14.032872.1", "9780140328721")]
    #[case("978_0_14_032872_1", "9780140328721")]
    #[case(" 978 0140\t328721 ", "9780140328721")]
    #[case("0-306-40615-x", "030640615X")]
    fn strips_separators(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize(raw), expected);
        assert_eq!(parse(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("123-456-789")]
    #[case("1.2.3.4.5.6.7.8.9")]
    #[case("--__..  ")]
    fn rejects_short_input(#[case] raw: &str) {
        assert!(matches!(parse(raw), Err(ClientError::Validation(_))));
    }

    #[test]
    fn ten_characters_is_enough() {
        assert_eq!(parse("0-306-40615-2").unwrap(), "0306406152");
    }
}
