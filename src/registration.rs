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
use tracing::info;

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required";
pub const PASSWORD_MISMATCH: &str = "The passwords entered do not match";

/// Input of the library registration form
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub library_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Checks the form before anything is sent to the API
    ///
    /// # Errors
    ///
    /// Returns the message to show when a field is missing or the passwords differ
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(&self.library_name)
            || is_blank(&self.password)
            || is_blank(&self.confirm_password)
        {
            return Err(ALL_FIELDS_REQUIRED);
        }
        if self.password != self.confirm_password {
            return Err(PASSWORD_MISMATCH);
        }
        Ok(())
    }

    /// Register the library and return its new identifier.
    ///
    /// Every outcome is reported through `notifier`; `None` means the
    /// registration did not happen.
    pub async fn submit(&self, api: &ApiClient, notifier: &mut dyn Notifier) -> Option<Identifier> {
        if let Err(message) = self.validate() {
            notifier.error(message);
            return None;
        }

        match api.register_library(&self.library_name, &self.password).await {
            Ok(created) => {
                info!("Registered library {}", created.library_id);
                notifier.success(&format!(
                    "Library registered successfully! Your Library Id is: {}. \
                     Make sure to save the id on your records because you need it to log in.",
                    created.library_id
                ));
                Some(created.library_id)
            }
            Err(e) => {
                let message = match e.server_message() {
                    Some(server) => format!("Error: {server}"),
                    None => format!("An unexpected error occurred: {e}"),
                };
                notifier.error(&message);
                None
            }
        }
    }
}

#[derive(Template)]
#[template(path = "registration.html")]
pub struct RegistrationTemplate {
    site_name: String,
    notices: Vec<Notice>,
    library_name: String,
}

/// Shows the empty registration form
pub async fn registration_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    tracing::debug!("Generating registration template");
    let (jar, flash) = Toasts::take_flash(jar);

    let template = RegistrationTemplate {
        site_name: state.site_name(),
        notices: flash.into_notices(),
        library_name: String::new(),
    };
    page_response(&template, jar)
}

/// Handles the registration form post
///
/// On success the browser is sent to the new library's dashboard; otherwise
/// the form is shown again with the library name kept.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let mut toasts = Toasts::new();

    let registered = match state.api() {
        Ok(api) => form.submit(&api, &mut toasts).await,
        Err(e) => {
            tracing::error!("Cannot build API client: {e}");
            toasts.error(&format!("An unexpected error occurred: {e}"));
            None
        }
    };

    if let Some(library_id) = registered {
        let location = page_href("/Library", Some(&library_id), &[]);
        return redirect_with_flash(&location, jar, &toasts);
    }

    let template = RegistrationTemplate {
        site_name: state.site_name(),
        notices: toasts.into_notices(),
        library_name: form.library_name,
    };
    page_response(&template, jar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            library_name: name.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_validate_requires_every_field() {
        assert_eq!(form("", "p1", "p1").validate(), Err(ALL_FIELDS_REQUIRED));
        assert_eq!(form("Oakview", "", "p1").validate(), Err(ALL_FIELDS_REQUIRED));
        assert_eq!(form("Oakview", "p1", "").validate(), Err(ALL_FIELDS_REQUIRED));
    }

    #[test]
    fn test_validate_requires_matching_passwords() {
        assert_eq!(form("Oakview", "p1", "p2").validate(), Err(PASSWORD_MISMATCH));
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        assert_eq!(form("Oakview", "p1", "p1").validate(), Ok(()));
    }
}
