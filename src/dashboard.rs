//! Library dashboard.
//!
//! The dashboard is a hub of six mutating operations, each behind a modal
//! form. [`Modal`] is the single source of truth for which modal is open and
//! owns that modal's input buffer, so two modals can never be open at once.
//! Opening a modal through the `modal` query parameter renders it empty;
//! posting it runs the operation and either redirects back to the closed
//! dashboard or re-renders the modal with its inputs intact.

use crate::api::{ApiClient, NewBook};
use crate::error::SphereError;
use crate::models::Identifier;
use crate::notice::{Notice, Notifier, Toasts};
use crate::server::{page_response, redirect_with_flash, AppState};
use crate::utils::{
    is_blank, library_heading, page_href, LIBRARY_FETCH_ERROR, NO_LIBRARY_ID,
};
use askama_axum::Template;
use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const MEMBER_NAME_REQUIRED: &str = "Member name and library ID are required.";
pub const MEMBER_ID_REQUIRED: &str = "Member ID and library ID are required.";
pub const BOOK_FIELDS_REQUIRED: &str = "All fields are required to add a book.";
pub const BOOK_ID_REQUIRED: &str = "Book ID and library ID are required.";
pub const LOAN_FIELDS_REQUIRED: &str = "Both Member ID and Book ID are required.";
pub const LIBRARY_ID_UNAVAILABLE: &str = "Library ID is not available.";
pub const BOOK_NOT_FOUND: &str = "Book not found.";
pub const UNKNOWN_ACTION: &str = "That dashboard action is not available.";

/// The six dashboard operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    AddMember,
    RemoveMember,
    AddBook,
    RemoveBook,
    LendBook,
    ReturnBook,
}

impl ModalKind {
    pub const ALL: [ModalKind; 6] = [
        ModalKind::AddMember,
        ModalKind::RemoveMember,
        ModalKind::AddBook,
        ModalKind::RemoveBook,
        ModalKind::LendBook,
        ModalKind::ReturnBook,
    ];

    /// Value used in the `modal` query parameter and form field
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            ModalKind::AddMember => "add-member",
            ModalKind::RemoveMember => "remove-member",
            ModalKind::AddBook => "add-book",
            ModalKind::RemoveBook => "remove-book",
            ModalKind::LendBook => "lend-book",
            ModalKind::ReturnBook => "return-book",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            ModalKind::AddMember => "Add Member",
            ModalKind::RemoveMember => "Remove Member",
            ModalKind::AddBook => "Add Book",
            ModalKind::RemoveBook => "Remove Book",
            ModalKind::LendBook => "Lend Book",
            ModalKind::ReturnBook => "Return Book",
        }
    }

    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(self, ModalKind::RemoveMember | ModalKind::RemoveBook)
    }
}

impl FromStr for ModalKind {
    type Err = SphereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModalKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| SphereError::from(format!("Unknown modal: {s}")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddMemberForm {
    pub member_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoveMemberForm {
    pub member_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddBookForm {
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Ebook file format; blank for printed books
    pub file_format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoveBookForm {
    pub book_id: String,
}

/// Buffer shared by the lend and return modals
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoanForm {
    pub member_id: String,
    pub book_id: String,
}

/// The open modal together with its input buffer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "modal", rename_all = "kebab-case")]
pub enum Modal {
    #[default]
    None,
    AddMember(AddMemberForm),
    RemoveMember(RemoveMemberForm),
    AddBook(AddBookForm),
    RemoveBook(RemoveBookForm),
    LendBook(LoanForm),
    ReturnBook(LoanForm),
}

impl Modal {
    /// A freshly opened modal with an empty buffer
    #[must_use]
    pub fn open(kind: ModalKind) -> Self {
        match kind {
            ModalKind::AddMember => Modal::AddMember(AddMemberForm::default()),
            ModalKind::RemoveMember => Modal::RemoveMember(RemoveMemberForm::default()),
            ModalKind::AddBook => Modal::AddBook(AddBookForm::default()),
            ModalKind::RemoveBook => Modal::RemoveBook(RemoveBookForm::default()),
            ModalKind::LendBook => Modal::LendBook(LoanForm::default()),
            ModalKind::ReturnBook => Modal::ReturnBook(LoanForm::default()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<ModalKind> {
        match self {
            Modal::None => None,
            Modal::AddMember(_) => Some(ModalKind::AddMember),
            Modal::RemoveMember(_) => Some(ModalKind::RemoveMember),
            Modal::AddBook(_) => Some(ModalKind::AddBook),
            Modal::RemoveBook(_) => Some(ModalKind::RemoveBook),
            Modal::LendBook(_) => Some(ModalKind::LendBook),
            Modal::ReturnBook(_) => Some(ModalKind::ReturnBook),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.kind().is_some()
    }

    /// Markup model of the open modal
    #[must_use]
    pub fn view(&self) -> Option<ModalView> {
        let kind = self.kind()?;
        let fields = match self {
            Modal::None => return None,
            Modal::AddMember(form) => vec![FieldView::required(
                "member_name",
                "Member Name",
                &form.member_name,
            )],
            Modal::RemoveMember(form) => {
                vec![FieldView::required("member_id", "Member ID", &form.member_id)]
            }
            Modal::AddBook(form) => vec![
                FieldView::required("title", "Title", &form.title),
                FieldView::required("author", "Author", &form.author),
                FieldView::required("isbn", "ISBN", &form.isbn),
                FieldView::optional("file_format", "eBook format (optional)", &form.file_format),
            ],
            Modal::RemoveBook(form) => {
                vec![FieldView::required("book_id", "Book ID", &form.book_id)]
            }
            Modal::LendBook(form) | Modal::ReturnBook(form) => vec![
                FieldView::required("member_id", "Member ID", &form.member_id),
                FieldView::required("book_id", "Book ID", &form.book_id),
            ],
        };

        Some(ModalView {
            slug: kind.slug(),
            title: kind.title(),
            destructive: kind.is_destructive(),
            fields,
        })
    }
}

/// One input of a modal form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub required: bool,
}

impl FieldView {
    fn required(name: &'static str, label: &'static str, value: &str) -> Self {
        Self {
            name,
            label,
            value: value.to_string(),
            required: true,
        }
    }

    fn optional(name: &'static str, label: &'static str, value: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, label, value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalView {
    pub slug: &'static str,
    pub title: &'static str,
    pub destructive: bool,
    pub fields: Vec<FieldView>,
}

/// Result of running one modal operation
enum Submission {
    /// Rejected before any request was made
    Invalid(&'static str),
    /// The API call failed
    Failed(String),
    /// The API accepted the operation
    Done(String),
}

/// State of one dashboard instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    library_id: Option<Identifier>,
    modal: Modal,
}

impl Dashboard {
    #[must_use]
    pub fn new(library_id: Option<Identifier>) -> Self {
        Self {
            library_id,
            modal: Modal::None,
        }
    }

    /// Dashboard with a modal whose buffer was already filled in
    #[must_use]
    pub fn with_modal(mut self, modal: Modal) -> Self {
        self.modal = modal;
        self
    }

    #[must_use]
    pub fn library_id(&self) -> Option<&Identifier> {
        self.library_id.as_ref()
    }

    #[must_use]
    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// Open `kind`, replacing whichever modal was open
    pub fn open(&mut self, kind: ModalKind) {
        self.modal = Modal::open(kind);
    }

    pub fn close(&mut self) {
        self.modal = Modal::None;
    }

    /// Run the open modal's operation.
    ///
    /// Returns `true` when the API accepted it; the modal is then closed and
    /// its buffer dropped. On any failure the modal stays open with its input.
    pub async fn submit(&mut self, api: &ApiClient, notifier: &mut dyn Notifier) -> bool {
        let library_id = self.library_id.as_ref();
        let submission = match &self.modal {
            Modal::None => return false,
            Modal::AddMember(form) => add_member(api, library_id, form).await,
            Modal::RemoveMember(form) => remove_member(api, library_id, form).await,
            Modal::AddBook(form) => add_book(api, library_id, form).await,
            Modal::RemoveBook(form) => remove_book(api, library_id, form).await,
            Modal::LendBook(form) => lend_book(api, library_id, form).await,
            Modal::ReturnBook(form) => return_book(api, library_id, form).await,
        };

        match submission {
            Submission::Done(message) => {
                info!("{message}");
                notifier.success(&message);
                self.close();
                true
            }
            Submission::Invalid(message) => {
                notifier.error(message);
                false
            }
            Submission::Failed(message) => {
                notifier.error(&message);
                false
            }
        }
    }
}

async fn add_member(
    api: &ApiClient,
    library_id: Option<&Identifier>,
    form: &AddMemberForm,
) -> Submission {
    let Some(library_id) = library_id else {
        return Submission::Invalid(MEMBER_NAME_REQUIRED);
    };
    if is_blank(&form.member_name) {
        return Submission::Invalid(MEMBER_NAME_REQUIRED);
    }

    match api.add_member(library_id, &form.member_name).await {
        Ok(created) => Submission::Done(format!(
            "Member added successfully! The member ID is {}. Please keep for future reference.",
            created.member_id
        )),
        Err(e) => Submission::Failed(
            e.user_message("An error occurred while adding the member. Please try again."),
        ),
    }
}

async fn remove_member(
    api: &ApiClient,
    library_id: Option<&Identifier>,
    form: &RemoveMemberForm,
) -> Submission {
    let (Some(library_id), Some(member_id)) = (library_id, Identifier::parse(&form.member_id))
    else {
        return Submission::Invalid(MEMBER_ID_REQUIRED);
    };

    match api.remove_member(library_id, &member_id).await {
        Ok(()) => Submission::Done("Member removed successfully!".to_string()),
        Err(e) => Submission::Failed(e.rejection_message(
            "Failed to remove member",
            "An error occurred while removing the member.",
        )),
    }
}

async fn add_book(
    api: &ApiClient,
    library_id: Option<&Identifier>,
    form: &AddBookForm,
) -> Submission {
    if is_blank(&form.title) || is_blank(&form.author) || is_blank(&form.isbn) {
        return Submission::Invalid(BOOK_FIELDS_REQUIRED);
    }
    let Some(library_id) = library_id else {
        return Submission::Invalid(LIBRARY_ID_UNAVAILABLE);
    };

    let book = NewBook {
        title: &form.title,
        author: &form.author,
        isbn: &form.isbn,
        file_format: Some(form.file_format.trim()).filter(|format| !format.is_empty()),
    };
    match api.add_book(library_id, &book).await {
        Ok(created) => Submission::Done(format!(
            "Book added successfully! Book ID: {}.",
            created.book_id
        )),
        Err(e) => Submission::Failed(
            e.user_message("An error occurred while adding the book. Please try again."),
        ),
    }
}

async fn remove_book(
    api: &ApiClient,
    library_id: Option<&Identifier>,
    form: &RemoveBookForm,
) -> Submission {
    let (Some(library_id), Some(book_id)) = (library_id, Identifier::parse(&form.book_id)) else {
        return Submission::Invalid(BOOK_ID_REQUIRED);
    };

    match api.remove_book(library_id, &book_id).await {
        Ok(()) => Submission::Done("Book removed successfully!".to_string()),
        Err(e) if e.is_not_found() => Submission::Failed(BOOK_NOT_FOUND.to_string()),
        Err(e) => Submission::Failed(e.rejection_message(
            "Failed to remove book",
            "An error occurred while removing the book.",
        )),
    }
}

async fn lend_book(
    api: &ApiClient,
    library_id: Option<&Identifier>,
    form: &LoanForm,
) -> Submission {
    let Some((member_id, book_id)) = loan_ids(form) else {
        return Submission::Invalid(LOAN_FIELDS_REQUIRED);
    };
    let Some(library_id) = library_id else {
        return Submission::Invalid(LIBRARY_ID_UNAVAILABLE);
    };

    match api.lend_book(library_id, &book_id, &member_id).await {
        Ok(()) => Submission::Done("Book lent successfully.".to_string()),
        Err(e) => Submission::Failed(e.user_message("An error occurred while lending the book.")),
    }
}

async fn return_book(
    api: &ApiClient,
    library_id: Option<&Identifier>,
    form: &LoanForm,
) -> Submission {
    let Some((member_id, book_id)) = loan_ids(form) else {
        return Submission::Invalid(LOAN_FIELDS_REQUIRED);
    };
    let Some(library_id) = library_id else {
        return Submission::Invalid(LIBRARY_ID_UNAVAILABLE);
    };

    match api.return_book(library_id, &book_id, &member_id).await {
        Ok(()) => Submission::Done("Book returned successfully.".to_string()),
        Err(e) => Submission::Failed(e.user_message("An error occurred while returning the book.")),
    }
}

/// Member and book identifiers of a loan form, member first
fn loan_ids(form: &LoanForm) -> Option<(Identifier, Identifier)> {
    Some((Identifier::parse(&form.member_id)?, Identifier::parse(&form.book_id)?))
}

/// Query string of the dashboard URL
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(rename = "libraryId")]
    pub library_id: Option<String>,
    pub modal: Option<String>,
}

impl DashboardQuery {
    #[must_use]
    pub fn library_id(&self) -> Option<Identifier> {
        self.library_id.as_deref().and_then(Identifier::parse)
    }
}

/// Dashboard button
pub struct Tile {
    label: &'static str,
    href: String,
    enabled: bool,
}

fn tiles(library_id: Option<&Identifier>) -> Vec<Tile> {
    let modal_tile = |kind: ModalKind| Tile {
        label: kind.title(),
        href: page_href("/Library", library_id, &[("modal", kind.slug())]),
        enabled: true,
    };
    let view_tile = |label: &'static str, path: &str| Tile {
        label,
        href: page_href(path, library_id, &[]),
        enabled: library_id.is_some(),
    };

    vec![
        modal_tile(ModalKind::AddMember),
        modal_tile(ModalKind::RemoveMember),
        view_tile("View Members", "/ViewMembers"),
        modal_tile(ModalKind::AddBook),
        modal_tile(ModalKind::RemoveBook),
        view_tile("View Books", "/ViewBooks"),
        modal_tile(ModalKind::LendBook),
        modal_tile(ModalKind::ReturnBook),
    ]
}

#[derive(Template)]
#[template(path = "library.html")]
pub struct DashboardTemplate {
    site_name: String,
    notices: Vec<Notice>,
    library_name: String,
    tiles: Vec<Tile>,
    modal: Option<ModalView>,
    form_action: String,
    close_href: String,
}

async fn render_dashboard(
    state: &AppState,
    dashboard: &Dashboard,
    notices: Vec<Notice>,
    jar: CookieJar,
) -> Response {
    let library_name = match dashboard.library_id() {
        None => NO_LIBRARY_ID.to_string(),
        Some(library_id) => match state.api() {
            Ok(api) => library_heading(&api.fetch_library(library_id).await),
            Err(e) => {
                tracing::error!("Cannot build API client: {e}");
                LIBRARY_FETCH_ERROR.to_string()
            }
        },
    };

    let home = page_href("/Library", dashboard.library_id(), &[]);
    let template = DashboardTemplate {
        site_name: state.site_name(),
        notices,
        library_name,
        tiles: tiles(dashboard.library_id()),
        modal: dashboard.modal().view(),
        form_action: home.clone(),
        close_href: home,
    };
    page_response(&template, jar)
}

/// Shows the dashboard, with the modal named in the query opened
pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
    jar: CookieJar,
) -> Response {
    let mut dashboard = Dashboard::new(query.library_id());
    match query.modal.as_deref().map(str::parse::<ModalKind>) {
        Some(Ok(kind)) => dashboard.open(kind),
        Some(Err(e)) => debug!("Ignoring modal parameter: {e}"),
        None => {}
    }

    let (jar, flash) = Toasts::take_flash(jar);
    render_dashboard(&state, &dashboard, flash.into_notices(), jar).await
}

/// Handles a modal form post
///
/// A post that names no known modal leaves the dashboard closed and shows
/// [`UNKNOWN_ACTION`].
pub async fn submit_modal(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
    jar: CookieJar,
    form: Result<Form<Modal>, FormRejection>,
) -> Response {
    let mut dashboard = Dashboard::new(query.library_id());
    let mut toasts = Toasts::new();

    let Form(modal) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!("Rejected dashboard form: {rejection}");
            toasts.error(UNKNOWN_ACTION);
            return render_dashboard(&state, &dashboard, toasts.into_notices(), jar).await;
        }
    };
    dashboard = dashboard.with_modal(modal);

    let submitted = match state.api() {
        Ok(api) => dashboard.submit(&api, &mut toasts).await,
        Err(e) => {
            tracing::error!("Cannot build API client: {e}");
            toasts.error(&format!("An unexpected error occurred: {e}"));
            false
        }
    };

    if submitted {
        let location = page_href("/Library", dashboard.library_id(), &[]);
        return redirect_with_flash(&location, jar, &toasts);
    }
    render_dashboard(&state, &dashboard, toasts.into_notices(), jar).await
}
