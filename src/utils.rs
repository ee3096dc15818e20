use crate::api::ApiResult;
use crate::models::{Identifier, Library};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use url::form_urlencoded;

/// Heading shown when the page URL carries no `libraryId`
pub const NO_LIBRARY_ID: &str = "No Library ID provided";
/// Heading shown when the API does not know the library
pub const LIBRARY_NOT_FOUND: &str = "Library not found";
/// Heading shown when the library lookup never reached the API
pub const LIBRARY_FETCH_ERROR: &str = "Error fetching library data";

/// Whether a form field counts as missing
#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Link to one of the front-end pages, carrying the library identifier and
/// any extra query parameters.
///
/// # Examples
///
/// ```
/// use library_sphere::models::Identifier;
/// use library_sphere::utils::page_href;
///
/// let id = Identifier::from("7");
/// assert_eq!(
///     page_href("/Library", Some(&id), &[("modal", "add-book")]),
///     "/Library?libraryId=7&modal=add-book"
/// );
/// assert_eq!(page_href("/ViewBooks", None, &[]), "/ViewBooks");
/// ```
#[must_use]
pub fn page_href(path: &str, library_id: Option<&Identifier>, extra: &[(&str, &str)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(id) = library_id {
        query.append_pair("libraryId", id.as_str());
    }
    for (key, value) in extra {
        query.append_pair(key, value);
    }
    let query = query.finish();

    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// Page heading for a library lookup, degrading to a placeholder on failure.
///
/// Only a rejection that explains itself reads as "not found"; a bare error
/// status counts as a failed fetch.
#[must_use]
pub fn library_heading(lookup: &ApiResult<Library>) -> String {
    match lookup {
        Ok(library) => library.name.clone(),
        Err(e) if e.server_message().is_some() => LIBRARY_NOT_FOUND.to_string(),
        Err(_) => LIBRARY_FETCH_ERROR.to_string(),
    }
}

/// Render a lend date as `YYYY-MM-DD`.
///
/// The API emits HTTP dates (`Tue, 01 Oct 2024 10:00:00 GMT`); RFC 3339 and
/// plain ISO timestamps are accepted too. Anything else is shown verbatim.
#[must_use]
pub fn format_lend_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}
