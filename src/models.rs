//! Entities and response shapes of the remote library API.
//!
//! The API owns these records; the front-end only keeps transient copies for
//! the duration of a request.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of a library, member or book.
///
/// The API hands out numbers while users type strings, so both JSON forms are
/// accepted and the value is always carried as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build an identifier from user input, rejecting blank values.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(number) => Self(number.to_string()),
            Raw::Text(text) => Self(text),
        })
    }
}

/// Library metadata. The stored credential is never read back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub library_id: Option<Identifier>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub member_id: Identifier,
    pub name: String,
}

/// Lending state of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    #[serde(alias = "borrowed")]
    Lent,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookStatus::Available => f.write_str("available"),
            BookStatus::Lent => f.write_str("lent"),
            BookStatus::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Book {
    pub book_id: Identifier,
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(default)]
    pub status: BookStatus,
    /// Member currently holding the book
    #[serde(default)]
    pub lent_to: Option<Identifier>,
    #[serde(default)]
    pub lent_date: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub ebook: bool,
}

/// Any present, non-false value marks the book as an ebook.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(!matches!(
        value,
        None | Some(serde_json::Value::Null | serde_json::Value::Bool(false))
    ))
}

/// Reply to a library registration
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryCreated {
    pub library_id: Identifier,
}

/// Reply to a login attempt
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub library_id: Option<Identifier>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberCreated {
    pub member_id: Identifier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookCreated {
    pub book_id: Identifier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_accepts_numbers_and_strings() {
        let numeric: Identifier = serde_json::from_value(json!(42)).unwrap();
        let text: Identifier = serde_json::from_value(json!("lib-42")).unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "lib-42");
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!("42"));
    }

    #[test]
    fn test_identifier_parse_rejects_blank() {
        assert_eq!(Identifier::parse("   "), None);
        assert_eq!(Identifier::parse(" 7 "), Some(Identifier::from("7")));
    }

    #[test]
    fn test_library_ignores_password() {
        let library: Library = serde_json::from_value(json!({
            "library_id": 3,
            "name": "Oakview",
            "password": "p1"
        }))
        .unwrap();
        assert_eq!(library.name, "Oakview");
        assert_eq!(library.library_id, Some(Identifier::from("3")));
    }

    #[test]
    fn test_book_from_api_row() {
        let book: Book = serde_json::from_value(json!({
            "book_id": 11,
            "title": "Dune",
            "author": "Frank Herbert",
            "isbn": "9780441013593",
            "status": "borrowed",
            "lent_to": 4,
            "lent_date": "Tue, 01 Oct 2024 10:00:00 GMT"
        }))
        .unwrap();

        assert_eq!(book.status, BookStatus::Lent);
        assert_eq!(book.lent_to, Some(Identifier::from("4")));
        assert!(!book.ebook);
    }

    #[test]
    fn test_book_defaults_and_ebook_flag() {
        let book: Book = serde_json::from_value(json!({
            "book_id": "b1",
            "title": "Emma",
            "author": "Jane Austen",
            "isbn": "1",
            "status": "archived",
            "lent_to": null,
            "lent_date": null,
            "ebook": {"file_format": "epub"}
        }))
        .unwrap();

        assert_eq!(book.status, BookStatus::Unknown);
        assert_eq!(book.lent_to, None);
        assert!(book.ebook);
    }

    #[test]
    fn test_login_outcome_camel_case() {
        let outcome: LoginOutcome =
            serde_json::from_value(json!({"success": true, "libraryId": 9})).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.library_id, Some(Identifier::from("9")));

        let rejected: LoginOutcome = serde_json::from_value(
            json!({"success": false, "message": "Invalid Library ID or password"}),
        )
        .unwrap();
        assert!(!rejected.success);
        assert!(rejected.library_id.is_none());
    }
}
