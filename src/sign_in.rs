use crate::api::ApiClient;
use crate::models::Identifier;
use crate::notice::{Notice, Notifier, Toasts};
use crate::server::{page_response, redirect_with_flash, AppState};
use crate::utils::{is_blank, page_href};
use askama_axum::Template;
use axum::{
    extract::{Form, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

pub const CREDENTIALS_REQUIRED: &str = "Please enter both Library ID and Password";
pub const INCORRECT_CREDENTIALS: &str = "Password or Library ID is incorrect. Please try again.";

/// Input of the sign-in form
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub library_id: String,
    #[serde(default)]
    pub password: String,
}

impl SignInForm {
    /// # Errors
    ///
    /// Returns the message to show when either field is missing
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(&self.library_id) || is_blank(&self.password) {
            return Err(CREDENTIALS_REQUIRED);
        }
        Ok(())
    }

    /// Check the credentials and return the library the server confirmed.
    ///
    /// A failed login never says whether the identifier or the password was
    /// wrong.
    pub async fn submit(&self, api: &ApiClient, notifier: &mut dyn Notifier) -> Option<Identifier> {
        if let Err(message) = self.validate() {
            notifier.error(message);
            return None;
        }

        match api.login(self.library_id.trim(), &self.password).await {
            Ok(outcome) if outcome.success => {
                if let Some(library_id) = outcome.library_id {
                    info!("Library {library_id} signed in");
                    return Some(library_id);
                }
                warn!("Login succeeded without a library id in the reply");
            }
            Ok(outcome) => {
                warn!(
                    "Login rejected: {}",
                    outcome.message.as_deref().unwrap_or("no reason given")
                );
            }
            Err(e) => warn!("Login failed: {e}"),
        }

        notifier.error(INCORRECT_CREDENTIALS);
        None
    }
}

#[derive(Template)]
#[template(path = "sign_in.html")]
pub struct SignInTemplate {
    site_name: String,
    notices: Vec<Notice>,
    library_id: String,
}

/// Landing page with the sign-in form
pub async fn sign_in_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    tracing::debug!("Generating sign-in template");
    let (jar, flash) = Toasts::take_flash(jar);

    let template = SignInTemplate {
        site_name: state.site_name(),
        notices: flash.into_notices(),
        library_id: String::new(),
    };
    page_response(&template, jar)
}

/// Handles the sign-in form post
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Response {
    let mut toasts = Toasts::new();

    let signed_in = match state.api() {
        Ok(api) => form.submit(&api, &mut toasts).await,
        Err(e) => {
            tracing::error!("Cannot build API client: {e}");
            toasts.error(INCORRECT_CREDENTIALS);
            None
        }
    };

    if let Some(library_id) = signed_in {
        let location = page_href("/Library", Some(&library_id), &[]);
        return redirect_with_flash(&location, jar, &toasts);
    }

    let template = SignInTemplate {
        site_name: state.site_name(),
        notices: toasts.into_notices(),
        library_id: form.library_id,
    };
    page_response(&template, jar)
}
