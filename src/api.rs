//! Client for the remote library API.
//!
//! Every screen talks to the backend through [`ApiClient`] and gets back an
//! [`ApiResult`]. Transport failures, rejected requests and unreadable bodies
//! all arrive as [`ApiError`], so screens only decide which message to show.

use crate::config::Config;
use crate::models::{
    Book, BookCreated, Identifier, Library, LibraryCreated, LoginOutcome, Member, MemberCreated,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Failure of a call to the library API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, ...)
    #[error("request to library API failed: {0}")]
    Transport(String),

    /// The API answered with a non-success status or an `error` body
    #[error(
        "library API rejected the request with status {status}: {}",
        .message.as_deref().unwrap_or("no error message")
    )]
    Rejected { status: u16, message: Option<String> },

    /// The response body did not have the expected shape
    #[error("library API response could not be decoded: {0}")]
    Decode(String),
}

impl ApiError {
    /// Error text supplied by the server, if any
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of a rejected request
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Message for the user: the server's text when present, else `fallback`
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.rejection_message(fallback, fallback)
    }

    /// Like [`ApiError::user_message`] but with a separate fallback for
    /// rejections that carry no text and for failures that never reached the
    /// server.
    #[must_use]
    pub fn rejection_message(&self, rejected: &str, unreachable: &str) -> String {
        match self {
            ApiError::Rejected { message, .. } => message
                .clone()
                .unwrap_or_else(|| rejected.to_string()),
            ApiError::Transport(_) | ApiError::Decode(_) => unreachable.to_string(),
        }
    }
}

/// Outcome of a call to the library API
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct NewLibrary<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    library_id: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct NewMember<'a> {
    name: &'a str,
}

/// Fields of a book to be catalogued
#[derive(Debug, Clone, Serialize)]
pub struct NewBook<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub isbn: &'a str,
    /// Present only for ebooks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_format: Option<&'a str>,
}

#[derive(Serialize)]
struct Loan<'a> {
    book_id: &'a str,
    member_id: &'a str,
}

/// HTTP client bound to one library API base address
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// Build a client for the API named in the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base address is not a usable URL
    pub fn from_config(http: reqwest::Client, config: &Config) -> crate::error::Result<Self> {
        Ok(Self::new(http, config.api_url()?))
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Register a new library; `POST /library`
    pub async fn register_library(&self, name: &str, password: &str) -> ApiResult<LibraryCreated> {
        let url = self.endpoint(&["library"])?;
        let body = NewLibrary { name, password };
        let response = self
            .execute(self.request(Method::POST, url).json(&body))
            .await?;
        decode(response).await
    }

    /// Library metadata; `GET /library/{id}`
    pub async fn fetch_library(&self, library_id: &Identifier) -> ApiResult<Library> {
        let url = self.endpoint(&["library", library_id.as_str()])?;
        let response = self.execute(self.request(Method::GET, url)).await?;
        decode(response).await
    }

    /// Check credentials; `POST /login`
    pub async fn login(&self, library_id: &str, password: &str) -> ApiResult<LoginOutcome> {
        let url = self.endpoint(&["login"])?;
        let body = Credentials {
            library_id,
            password,
        };
        let response = self
            .execute(self.request(Method::POST, url).json(&body))
            .await?;
        decode(response).await
    }

    /// `POST /library/{id}/members`
    pub async fn add_member(
        &self,
        library_id: &Identifier,
        name: &str,
    ) -> ApiResult<MemberCreated> {
        let url = self.endpoint(&["library", library_id.as_str(), "members"])?;
        let response = self
            .execute(self.request(Method::POST, url).json(&NewMember { name }))
            .await?;
        decode(response).await
    }

    /// `DELETE /library/{id}/members/{member_id}`
    pub async fn remove_member(
        &self,
        library_id: &Identifier,
        member_id: &Identifier,
    ) -> ApiResult<()> {
        let url =
            self.endpoint(&["library", library_id.as_str(), "members", member_id.as_str()])?;
        self.execute(self.request(Method::DELETE, url).header(CONTENT_TYPE, "application/json"))
            .await?;
        Ok(())
    }

    /// `GET /library/{id}/members`
    pub async fn list_members(&self, library_id: &Identifier) -> ApiResult<Vec<Member>> {
        let url = self.endpoint(&["library", library_id.as_str(), "members"])?;
        let response = self.execute(self.request(Method::GET, url)).await?;
        decode(response).await
    }

    /// `POST /library/{id}/books`
    pub async fn add_book(
        &self,
        library_id: &Identifier,
        book: &NewBook<'_>,
    ) -> ApiResult<BookCreated> {
        let url = self.endpoint(&["library", library_id.as_str(), "books"])?;
        let response = self
            .execute(self.request(Method::POST, url).json(book))
            .await?;
        decode(response).await
    }

    /// `DELETE /library/{id}/books/{book_id}`
    pub async fn remove_book(
        &self,
        library_id: &Identifier,
        book_id: &Identifier,
    ) -> ApiResult<()> {
        let url = self.endpoint(&["library", library_id.as_str(), "books", book_id.as_str()])?;
        self.execute(self.request(Method::DELETE, url).header(CONTENT_TYPE, "application/json"))
            .await?;
        Ok(())
    }

    /// `GET /library/{id}/books`
    pub async fn list_books(&self, library_id: &Identifier) -> ApiResult<Vec<Book>> {
        let url = self.endpoint(&["library", library_id.as_str(), "books"])?;
        let response = self.execute(self.request(Method::GET, url)).await?;
        decode(response).await
    }

    /// Mark a book as lent to a member; `POST /library/{id}/lend`
    pub async fn lend_book(
        &self,
        library_id: &Identifier,
        book_id: &Identifier,
        member_id: &Identifier,
    ) -> ApiResult<()> {
        self.post_loan("lend", library_id, book_id, member_id).await
    }

    /// Mark a lent book as returned; `POST /library/{id}/return`
    pub async fn return_book(
        &self,
        library_id: &Identifier,
        book_id: &Identifier,
        member_id: &Identifier,
    ) -> ApiResult<()> {
        self.post_loan("return", library_id, book_id, member_id).await
    }

    async fn post_loan(
        &self,
        action: &str,
        library_id: &Identifier,
        book_id: &Identifier,
        member_id: &Identifier,
    ) -> ApiResult<()> {
        let url = self.endpoint(&["library", library_id.as_str(), action])?;
        let body = Loan {
            book_id: book_id.as_str(),
            member_id: member_id.as_str(),
        };
        let response = self
            .execute(self.request(Method::POST, url).json(&body))
            .await?;
        let _: Value = decode(response).await?;
        Ok(())
    }

    /// Append percent-encoded path segments to the base address.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::Transport(format!("API base {} cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{method} {url}");
        self.http.request(method, url)
    }

    /// Send a request, turning transport failures and non-success statuses
    /// into [`ApiError`].
    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            error!("Library API request failed: {e}");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_text(&body);
        error!(
            status = status.as_u16(),
            "Library API rejected request: {}",
            message.as_deref().unwrap_or("no error message")
        );
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Decode a success body, honouring an `error` key the API may still embed.
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(|e| {
        error!("Failed to read library API response: {e}");
        ApiError::Transport(e.to_string())
    })?;

    let value: Value = if bytes.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(&bytes).map_err(|e| {
            error!("Library API returned invalid JSON: {e}");
            ApiError::Decode(e.to_string())
        })?
    };

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        error!(status, "Library API reported an error: {message}");
        return Err(ApiError::Rejected {
            status,
            message: Some(message.to_string()),
        });
    }

    serde_json::from_value(value).map_err(|e| {
        error!("Unexpected library API response shape: {e}");
        ApiError::Decode(e.to_string())
    })
}

/// Human-readable error text from a rejection body
fn error_text(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(ToString::to_string)
}
