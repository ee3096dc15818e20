use crate::api::ApiClient;
use crate::config::{self, Config, SharedConfig, CONFIG_FILE, DEFAULT_SITE_NAME};
use crate::error::{Result, SphereError};
use crate::notice::Toasts;
use crate::{dashboard, listing, registration, sign_in};
use askama_axum::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    /// One connection pool to the library API for the whole process
    pub http: reqwest::Client,
}

impl AppState {
    #[must_use]
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Client for the API currently named in the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration lock is poisoned or the base
    /// address is not a usable URL
    pub fn api(&self) -> Result<ApiClient> {
        let config = self
            .config
            .read()
            .map_err(|_| SphereError::from("Configuration read lock error"))?;
        ApiClient::from_config(self.http.clone(), &config)
    }

    /// Site name for page titles, falling back to the product name
    #[must_use]
    pub fn site_name(&self) -> String {
        self.config.read().map_or_else(
            |_| {
                tracing::error!("Configuration read lock error");
                DEFAULT_SITE_NAME.to_string()
            },
            |config| config.site_name.clone(),
        )
    }
}

/// Render a template into an HTML response
pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template rendering error: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template rendering error").into_response()
        }
    }
}

/// Render a page along with any cookie changes made while handling it
pub fn page_response<T: Template>(template: &T, jar: CookieJar) -> Response {
    (jar, render(template)).into_response()
}

/// Redirect with `303 See Other`, carrying any notices to the next page
#[must_use]
pub fn redirect_with_flash(location: &str, jar: CookieJar, toasts: &Toasts) -> Response {
    tracing::debug!("Redirecting to {location}");
    let jar = match toasts.flash_cookie() {
        Some(cookie) => jar.add(cookie),
        None => jar,
    };
    (jar, Redirect::to(location)).into_response()
}

/// Build the application router with all page routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(sign_in::sign_in_page).post(sign_in::sign_in))
        .route(
            "/CreateAnAccount",
            get(registration::registration_page).post(registration::register),
        )
        .route(
            "/Library",
            get(dashboard::dashboard_page).post(dashboard::submit_modal),
        )
        .route("/ViewMembers", get(listing::members_page))
        .route("/ViewBooks", get(listing::books_page))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web server on the specified port.
///
/// # Arguments
///
/// * `port` - The port number to bind the server to
/// * `config_file_path` - Configuration file; `config.json5` when `None`
/// * `cancel_token` - Cancelling it shuts the server down gracefully
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file exists but is invalid
/// - The address string cannot be parsed into a valid `SocketAddr`
/// - The server fails to bind to the specified address
pub async fn run(
    port: u16,
    config_file_path: Option<PathBuf>,
    cancel_token: CancellationToken,
) -> Result<()> {
    tracing::info!("Initializing server");

    let config_path = config_file_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = Config::load(&config_path)?;
    tracing::info!("Using library API at {}", config.api_base_url);
    let shared: SharedConfig = Arc::new(RwLock::new(config));

    if config_path.exists() {
        if let Err(e) = config::watch(config_path.clone(), shared.clone(), cancel_token.clone()) {
            tracing::warn!("Configuration changes will not be picked up: {e}");
        }
    }

    let app = router(AppState::new(shared));
    tracing::debug!("Routes configured");

    let addr = format!("0.0.0.0:{port}");
    let address: SocketAddr = addr.parse()?;
    tracing::info!("Binding server to address: {address}");

    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("Site launched on: http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    tokio::select! {
        () = cancel_token.cancelled() => {
            tracing::info!("Shutdown requested");
        }
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                tracing::info!("Received Ctrl-C, shutting down");
                cancel_token.cancel();
            }
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {e}");
                cancel_token.cancelled().await;
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;

    #[test]
    fn test_api_client_follows_config() {
        let shared: SharedConfig = Arc::new(RwLock::new(Config::default()));
        let state = AppState::new(shared.clone());
        assert_eq!(state.api().unwrap().base_url().as_str(), "http://127.0.0.1:5000/");

        shared.write().unwrap().api_base_url = "http://10.1.2.3:8080/api/".to_string();
        assert_eq!(state.api().unwrap().base_url().as_str(), "http://10.1.2.3:8080/api/");
        assert_eq!(state.site_name(), DEFAULT_SITE_NAME);
    }

    #[test]
    fn test_redirect_carries_flash() {
        use crate::notice::Notifier;

        let mut toasts = Toasts::new();
        toasts.success("Book lent successfully.");
        let response = redirect_with_flash("/Library?libraryId=7", CookieJar::new(), &toasts);

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/Library?libraryId=7"
        );
        assert!(response.headers().get(SET_COOKIE).is_some());
    }

    #[test]
    fn test_redirect_without_notices_sets_no_cookie() {
        let response = redirect_with_flash("/", CookieJar::new(), &Toasts::new());
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
