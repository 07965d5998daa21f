//! Query normalization for the `/parse` command argument string.
//!
//! Users send a role and a city separated by a semicolon, e.g.
//! `/parse кассир; Москва`. Normalization is total: missing or blank
//! segments become empty fields, which signal "need more input" to the
//! dialogue rather than raising an error.

use serde::{Deserialize, Serialize};

/// A job-search query accumulated from the command line or the dialogue
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub role: String,
    pub location: String,
}

impl Query {
    /// A query is complete once both fields are non-empty after trimming
    pub fn is_complete(&self) -> bool {
        !self.role.trim().is_empty() && !self.location.trim().is_empty()
    }
}

/// Parse a raw `/parse` argument string into a [`Query`].
///
/// Splits on the first semicolon and trims each side. An absent second
/// segment yields an empty location; blank input yields an all-empty query.
/// Case and script (Cyrillic/Latin) are preserved verbatim.
pub fn normalize(raw: &str) -> Query {
    match raw.split_once(';') {
        Some((role, location)) => Query {
            role: role.trim().to_string(),
            location: location.trim().to_string(),
        },
        None => Query {
            role: raw.trim().to_string(),
            location: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_role_and_location() {
        let q = normalize("кассир; Москва");
        assert_eq!(q.role, "кассир");
        assert_eq!(q.location, "Москва");
        assert!(q.is_complete());
    }

    #[test]
    fn test_normalize_role_only() {
        let q = normalize("  бариста  ");
        assert_eq!(q.role, "бариста");
        assert_eq!(q.location, "");
        assert!(!q.is_complete());
    }

    #[test]
    fn test_normalize_blank_input() {
        assert_eq!(normalize(""), Query::default());
        assert_eq!(normalize("   "), Query::default());
        assert_eq!(normalize(" ; "), Query::default());
    }

    #[test]
    fn test_normalize_missing_role() {
        let q = normalize("; Санкт-Петербург");
        assert_eq!(q.role, "");
        assert_eq!(q.location, "Санкт-Петербург");
        assert!(!q.is_complete());
    }

    #[test]
    fn test_normalize_preserves_case_and_script() {
        let q = normalize("Java Developer; Moscow");
        assert_eq!(q.role, "Java Developer");
        assert_eq!(q.location, "Moscow");
    }

    #[test]
    fn test_normalize_splits_on_first_separator_only() {
        let q = normalize("оператор; Москва; pages=2");
        assert_eq!(q.role, "оператор");
        assert_eq!(q.location, "Москва; pages=2");
    }
}
