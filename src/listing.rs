//! Members and books list views.
//!
//! Both views load the whole collection of one library together with the
//! library's name, then filter it locally by a case-insensitive substring of
//! the member name or book title.

use crate::api::{ApiClient, ApiResult};
use crate::models::{Book, Identifier, Library, Member};
use crate::notice::{Notice, Notifier, Toasts};
use crate::server::{page_response, AppState};
use crate::utils::{
    format_lend_date, library_heading, page_href, LIBRARY_FETCH_ERROR, NO_LIBRARY_ID,
};
use askama_axum::Template;
use axum::{
    extract::{Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::debug;

pub const MEMBERS_FETCH_FAILED: &str = "An error occurred while fetching members";
pub const BOOKS_FETCH_FAILED: &str = "An error occurred while fetching books";

/// A record that can be listed and searched by its label
pub trait Listed {
    fn key(&self) -> &Identifier;
    /// Text matched by the search box
    fn label(&self) -> &str;
}

impl Listed for Member {
    fn key(&self) -> &Identifier {
        &self.member_id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

impl Listed for Book {
    fn key(&self) -> &Identifier {
        &self.book_id
    }

    fn label(&self) -> &str {
        &self.title
    }
}

/// Items whose label contains `query`, ignoring case. An empty query keeps all.
///
/// The query is matched as typed, whitespace included.
#[must_use]
pub fn filter<'a, T: Listed>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.label().to_lowercase().contains(&needle))
        .collect()
}

/// Loaded collection plus the current search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView<T> {
    pub library_id: Option<Identifier>,
    pub library_name: String,
    pub items: Vec<T>,
    pub query: String,
}

impl<T: Listed> ListView<T> {
    #[must_use]
    pub fn visible(&self) -> Vec<&T> {
        filter(&self.items, &self.query)
    }

    /// Distinct labels of the matching items; empty until something is typed
    #[must_use]
    pub fn suggestions(&self) -> Vec<&str> {
        if self.query.is_empty() {
            return Vec::new();
        }
        let mut labels: Vec<&str> = Vec::new();
        for item in self.visible() {
            if !labels.contains(&item.label()) {
                labels.push(item.label());
            }
        }
        labels
    }
}

/// Load the members of a library
pub async fn load_members(
    api: &ApiClient,
    library_id: Option<Identifier>,
    query: String,
    notifier: &mut dyn Notifier,
) -> ListView<Member> {
    let Some(id) = library_id else {
        return missing_library(query, notifier);
    };
    let (members, library) = tokio::join!(api.list_members(&id), api.fetch_library(&id));
    assemble(id, query, members, &library, MEMBERS_FETCH_FAILED, notifier)
}

/// Load the books of a library
pub async fn load_books(
    api: &ApiClient,
    library_id: Option<Identifier>,
    query: String,
    notifier: &mut dyn Notifier,
) -> ListView<Book> {
    let Some(id) = library_id else {
        return missing_library(query, notifier);
    };
    let (books, library) = tokio::join!(api.list_books(&id), api.fetch_library(&id));
    assemble(id, query, books, &library, BOOKS_FETCH_FAILED, notifier)
}

fn missing_library<T>(query: String, notifier: &mut dyn Notifier) -> ListView<T> {
    notifier.error(NO_LIBRARY_ID);
    ListView {
        library_id: None,
        library_name: NO_LIBRARY_ID.to_string(),
        items: Vec::new(),
        query,
    }
}

/// View shown when no API client could be built from the configuration
fn unavailable<T>(library_id: Option<Identifier>, query: String) -> ListView<T> {
    ListView {
        library_name: if library_id.is_some() {
            LIBRARY_FETCH_ERROR.to_string()
        } else {
            NO_LIBRARY_ID.to_string()
        },
        library_id,
        items: Vec::new(),
        query,
    }
}

fn assemble<T>(
    library_id: Identifier,
    query: String,
    items: ApiResult<Vec<T>>,
    library: &ApiResult<Library>,
    fallback: &str,
    notifier: &mut dyn Notifier,
) -> ListView<T> {
    let items = items.unwrap_or_else(|e| {
        notifier.error(&e.user_message(fallback));
        Vec::new()
    });
    debug!("Loaded {} records for library {library_id}", items.len());

    ListView {
        library_name: library_heading(library),
        library_id: Some(library_id),
        items,
        query,
    }
}

/// Query string of the list pages
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "libraryId")]
    pub library_id: Option<String>,
    #[serde(default)]
    pub q: String,
}

impl ListQuery {
    #[must_use]
    pub fn library_id(&self) -> Option<Identifier> {
        self.library_id.as_deref().and_then(Identifier::parse)
    }
}

/// Suggestion link that copies its label into the search box
pub struct SuggestionView {
    label: String,
    href: String,
}

fn suggestion_views<T: Listed>(view: &ListView<T>, path: &str) -> Vec<SuggestionView> {
    view.suggestions()
        .into_iter()
        .map(|label| SuggestionView {
            label: label.to_string(),
            href: page_href(path, view.library_id.as_ref(), &[("q", label)]),
        })
        .collect()
}

pub struct MemberRow {
    id: String,
    name: String,
}

#[derive(Template)]
#[template(path = "members.html")]
pub struct MembersTemplate {
    site_name: String,
    notices: Vec<Notice>,
    library_name: String,
    library_id: String,
    query: String,
    suggestions: Vec<SuggestionView>,
    rows: Vec<MemberRow>,
    home_href: String,
}

pub struct BookRow {
    id: String,
    title: String,
    author: String,
    isbn: String,
    status: String,
    lent_to: String,
    lent_date: String,
    ebook: &'static str,
}

impl From<&Book> for BookRow {
    fn from(book: &Book) -> Self {
        Self {
            id: book.key().to_string(),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            status: book.status.to_string(),
            lent_to: book.lent_to.as_ref().map(ToString::to_string).unwrap_or_default(),
            lent_date: book.lent_date.as_deref().map(format_lend_date).unwrap_or_default(),
            ebook: if book.ebook { "Yes" } else { "No" },
        }
    }
}

#[derive(Template)]
#[template(path = "books.html")]
pub struct BooksTemplate {
    site_name: String,
    notices: Vec<Notice>,
    library_name: String,
    library_id: String,
    query: String,
    suggestions: Vec<SuggestionView>,
    rows: Vec<BookRow>,
    home_href: String,
}

/// Members of the library named in the query, filtered by `q`
pub async fn members_page(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    jar: CookieJar,
) -> Response {
    tracing::debug!("Generating members template");
    let (jar, mut toasts) = Toasts::take_flash(jar);
    let library_id = query.library_id();

    let view = match state.api() {
        Ok(api) => load_members(&api, library_id, query.q, &mut toasts).await,
        Err(e) => {
            tracing::error!("Cannot build API client: {e}");
            toasts.error(MEMBERS_FETCH_FAILED);
            unavailable(library_id, query.q)
        }
    };

    let template = MembersTemplate {
        site_name: state.site_name(),
        library_name: view.library_name.clone(),
        library_id: view.library_id.as_ref().map(ToString::to_string).unwrap_or_default(),
        query: view.query.clone(),
        suggestions: suggestion_views(&view, "/ViewMembers"),
        rows: view
            .visible()
            .into_iter()
            .map(|member| MemberRow {
                id: member.key().to_string(),
                name: member.name.clone(),
            })
            .collect(),
        home_href: page_href("/Library", view.library_id.as_ref(), &[]),
        notices: toasts.into_notices(),
    };
    page_response(&template, jar)
}

/// Books of the library named in the query, filtered by `q`
pub async fn books_page(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    jar: CookieJar,
) -> Response {
    tracing::debug!("Generating books template");
    let (jar, mut toasts) = Toasts::take_flash(jar);
    let library_id = query.library_id();

    let view = match state.api() {
        Ok(api) => load_books(&api, library_id, query.q, &mut toasts).await,
        Err(e) => {
            tracing::error!("Cannot build API client: {e}");
            toasts.error(BOOKS_FETCH_FAILED);
            unavailable(library_id, query.q)
        }
    };

    let template = BooksTemplate {
        site_name: state.site_name(),
        library_name: view.library_name.clone(),
        library_id: view.library_id.as_ref().map(ToString::to_string).unwrap_or_default(),
        query: view.query.clone(),
        suggestions: suggestion_views(&view, "/ViewBooks"),
        rows: view.visible().into_iter().map(BookRow::from).collect(),
        home_href: page_href("/Library", view.library_id.as_ref(), &[]),
        notices: toasts.into_notices(),
    };
    page_response(&template, jar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookStatus;

    fn book(id: &str, title: &str) -> Book {
        Book {
            book_id: Identifier::from(id),
            title: title.to_string(),
            author: "Anon".to_string(),
            isbn: "0".to_string(),
            status: BookStatus::Available,
            lent_to: None,
            lent_date: None,
            ebook: false,
        }
    }

    fn shelf(query: &str) -> ListView<Book> {
        ListView {
            library_id: Some(Identifier::from("7")),
            library_name: "Oakview".to_string(),
            items: vec![book("1", "Alpha"), book("2", "Beta"), book("3", "Gamma")],
            query: query.to_string(),
        }
    }

    fn titles(view: &ListView<Book>) -> Vec<&str> {
        view.visible().into_iter().map(Listed::label).collect()
    }

    #[test]
    fn test_single_letter_matches_anywhere_ignoring_case() {
        assert_eq!(titles(&shelf("a")), ["Alpha", "Beta", "Gamma"]);
        assert_eq!(titles(&shelf("A")), ["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_longer_query_narrows() {
        assert_eq!(titles(&shelf("al")), ["Alpha"]);
        assert_eq!(titles(&shelf("MM")), ["Gamma"]);
        assert!(titles(&shelf("z")).is_empty());
    }

    #[test]
    fn test_empty_query_keeps_everything_without_suggestions() {
        let view = shelf("");
        assert_eq!(view.visible().len(), 3);
        assert!(view.suggestions().is_empty());
    }

    #[test]
    fn test_suggestion_link_copies_label_into_search() {
        let view = shelf("et");
        assert_eq!(view.suggestions(), ["Beta"]);

        let links = suggestion_views(&view, "/ViewBooks");
        assert_eq!(links[0].label, "Beta");
        assert_eq!(links[0].href, "/ViewBooks?libraryId=7&q=Beta");
    }

    #[test]
    fn test_suggestions_are_distinct() {
        let mut view = shelf("dune");
        view.items = vec![book("1", "Dune"), book("2", "Dune"), book("3", "Dune Messiah")];
        assert_eq!(view.suggestions(), ["Dune", "Dune Messiah"]);
    }

    #[test]
    fn test_members_filter_by_name() {
        let members = vec![
            Member {
                member_id: Identifier::from("1"),
                name: "Ada Lovelace".to_string(),
            },
            Member {
                member_id: Identifier::from("2"),
                name: "Alan Turing".to_string(),
            },
        ];
        let matched: Vec<&str> = filter(&members, "LOVE").into_iter().map(Listed::label).collect();
        assert_eq!(matched, ["Ada Lovelace"]);
        assert_eq!(filter(&members, "").len(), 2);
    }

    #[test]
    fn test_whitespace_query_is_matched_as_typed() {
        let members = vec![
            Member {
                member_id: Identifier::from("1"),
                name: "Ada".to_string(),
            },
            Member {
                member_id: Identifier::from("2"),
                name: "Grace Hopper".to_string(),
            },
        ];
        let matched: Vec<&str> = filter(&members, " ").into_iter().map(Listed::label).collect();
        assert_eq!(matched, ["Grace Hopper"]);

        let mut view = shelf(" ");
        assert!(view.visible().is_empty());
        view.items.push(book("4", "Delta Blues"));
        assert_eq!(view.suggestions(), ["Delta Blues"]);
    }

    #[test]
    fn test_suggestion_links_keep_library() {
        let views = suggestion_views(&shelf("gam"), "/ViewBooks");
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].href, "/ViewBooks?libraryId=7&q=Gamma");
    }

    #[test]
    fn test_book_row_formats_loan() {
        let mut lent = book("9", "Dune");
        lent.status = BookStatus::Lent;
        lent.lent_to = Some(Identifier::from("4"));
        lent.lent_date = Some("Tue, 01 Oct 2024 10:00:00 GMT".to_string());
        lent.ebook = true;

        let row = BookRow::from(&lent);
        assert_eq!(row.status, "lent");
        assert_eq!(row.lent_to, "4");
        assert_eq!(row.lent_date, "2024-10-01");
        assert_eq!(row.ebook, "Yes");
    }
}
