//! User-facing notifications.
//!
//! Screens never render messages themselves: they receive a [`Notifier`] and
//! raise success or error notices on it. The page renderer turns the collected
//! [`Toasts`] into toast markup. Notices raised right before a redirect
//! travel to the next page in a short-lived flash cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::{debug, info, warn};

/// Name of the cookie carrying notices across a redirect
pub const FLASH_COOKIE: &str = "sphere_flash";

/// Seconds a flash cookie stays valid if the next page never consumes it
const FLASH_MAX_AGE_SECS: i64 = 60;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    /// CSS modifier used by the toast markup
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self {
            Level::Success => "toast-success",
            Level::Error => "toast-error",
        }
    }
}

/// A single message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: &str) -> Self {
        Self {
            level: Level::Success,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn error(message: &str) -> Self {
        Self {
            level: Level::Error,
            message: message.to_string(),
        }
    }
}

/// Capability handed to every screen for raising user-facing messages
///
/// Screens hold it across API calls inside request handlers, hence `Send`.
pub trait Notifier: Send {
    /// Record a notice for the user
    fn notify(&mut self, notice: Notice);

    fn success(&mut self, message: &str) {
        self.notify(Notice::success(message));
    }

    fn error(&mut self, message: &str) {
        self.notify(Notice::error(message));
    }
}

/// Notices collected while handling one request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Toasts {
    notices: Vec<Notice>,
}

impl Notifier for Toasts {
    fn notify(&mut self, notice: Notice) {
        match notice.level {
            Level::Success => info!("Notice: {}", notice.message),
            Level::Error => warn!("Error notice: {}", notice.message),
        }
        self.notices.push(notice);
    }
}

impl Toasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    #[must_use]
    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Message of the most recent error notice, if any
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.notices
            .iter()
            .rev()
            .find(|notice| notice.level == Level::Error)
            .map(|notice| notice.message.as_str())
    }

    /// Read and expire the flash cookie left by the previous response.
    ///
    /// The cookie is removed whenever it is present, even when its payload
    /// cannot be read.
    #[must_use]
    pub fn take_flash(jar: CookieJar) -> (CookieJar, Self) {
        let Some(cookie) = jar.get(FLASH_COOKIE) else {
            return (jar, Self::new());
        };
        let notices = decode_flash(cookie.value()).unwrap_or_default();
        let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
        (jar, Self { notices })
    }

    /// Cookie carrying these notices to the next page.
    ///
    /// Returns `None` when there is nothing to carry.
    #[must_use]
    pub fn flash_cookie(&self) -> Option<Cookie<'static>> {
        if self.notices.is_empty() {
            return None;
        }
        let json = serde_json::to_string(&self.notices).ok()?;
        Some(
            Cookie::build((FLASH_COOKIE, json))
                .path("/")
                .max_age(Duration::seconds(FLASH_MAX_AGE_SECS))
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
        )
    }
}

fn decode_flash(raw: &str) -> Option<Vec<Notice>> {
    match serde_json::from_str(raw) {
        Ok(notices) => Some(notices),
        Err(e) => {
            debug!("Discarding unreadable flash cookie: {e}");
            None
        }
    }
}
