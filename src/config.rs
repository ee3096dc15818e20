use crate::error::{Result, SphereError};
use notify::{RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "config.json5";
/// Address of the library API when the configuration does not name one
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
/// Product name shown in page titles
pub const DEFAULT_SITE_NAME: &str = "LibrarySphere";

/// Application configuration structure
///
/// Every field has a default, so an empty `{}` file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Name displayed in the page title and header
    pub site_name: String,
    /// Base address of the remote library API
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Configuration shared between request handlers and the file watcher
pub type SharedConfig = Arc<RwLock<Config>>;

impl Config {
    /// Load the application configuration from a JSON5 file.
    ///
    /// A missing file is not an error: the defaults are used and a warning is
    /// logged, so the front-end can start against a local API out of the box.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or validated
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading application configuration from {}", path.display());

        if !path.exists() {
            warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)?;
        let config = Self::parse(&config_str)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from JSON5 source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON5 or fails validation
    pub fn parse(source: &str) -> Result<Self> {
        let config: Config = json5::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the site name is blank or the API base is not an absolute URL
    pub fn validate(&self) -> Result<()> {
        if self.site_name.trim().is_empty() {
            return Err(SphereError::from("Site name cannot be empty"));
        }
        self.api_url()?;
        Ok(())
    }

    /// The API base address as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_base_url` does not parse or cannot carry a path
    pub fn api_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api_base_url)?;
        if url.cannot_be_a_base() {
            return Err(SphereError::from(format!(
                "API base URL cannot carry a path: {}",
                self.api_base_url
            )));
        }
        Ok(url)
    }
}

/// Re-read the configuration file into the shared configuration.
///
/// # Errors
///
/// Returns an error if the file is invalid or the lock is poisoned; the shared
/// configuration is left untouched in that case.
pub fn reload(path: &Path, shared: &SharedConfig) -> Result<()> {
    let config = Config::load(path)?;
    let mut guard = shared
        .write()
        .map_err(|_| SphereError::from("Failed to acquire config write lock"))?;
    *guard = config;
    info!("Configuration reloaded from {}", path.display());
    Ok(())
}

/// Watch the configuration file and reload it whenever it changes.
///
/// The parent directory is watched instead of the file itself so that editors
/// which save by renaming a temporary file are picked up too. The watcher
/// lives until `cancel_token` is cancelled.
///
/// # Errors
///
/// Returns an error if the platform watcher cannot be created or attached
pub fn watch(path: PathBuf, shared: SharedConfig, cancel_token: CancellationToken) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = tx.send(res);
    })?;

    let watch_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
    info!("Watching {} for configuration changes", path.display());

    let file_name = path.file_name().map(ToOwned::to_owned);

    tokio::spawn(async move {
        // Dropping the watcher stops the notifications.
        let _watcher = watcher;
        loop {
            tokio::select! {
                () = cancel_token.cancelled() => break,
                event = rx.recv() => match event {
                    None => break,
                    Some(Err(e)) => error!("Configuration watcher error: {e}"),
                    Some(Ok(event)) => {
                        if !(event.kind.is_modify() || event.kind.is_create()) {
                            continue;
                        }
                        if !event
                            .paths
                            .iter()
                            .any(|changed| changed.file_name() == file_name.as_deref())
                        {
                            continue;
                        }
                        if let Err(e) = reload(&path, &shared) {
                            warn!("Ignoring invalid configuration change: {e}");
                        }
                    }
                },
            }
        }
        debug!("Configuration watcher stopped");
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_parse_json5_with_comments() {
        let source = "{
  // remote API
  api_base_url: 'http://library.internal:8080/v1/',
  site_name: 'Oakview Admin',
}";
        let config = Config::parse(source).unwrap();
        assert_eq!(config.site_name, "Oakview Admin");
        assert_eq!(
            config.api_url().unwrap().as_str(),
            "http://library.internal:8080/v1/"
        );
    }

    #[test]
    fn test_relative_api_url_rejected() {
        let err = Config::parse("{ api_base_url: 'library/api' }").unwrap_err();
        assert!(matches!(err, SphereError::InvalidApiUrl(_)));
    }

    #[test]
    fn test_non_base_api_url_rejected() {
        let err = Config::parse("{ api_base_url: 'mailto:librarian@example.com' }").unwrap_err();
        assert!(err.to_string().contains("cannot carry a path"));
    }

    #[test]
    fn test_blank_site_name_rejected() {
        let err = Config::parse("{ site_name: '  ' }").unwrap_err();
        assert_eq!(err.to_string(), "Error: Site name cannot be empty");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json5")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_reload_replaces_shared_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ api_base_url: 'http://10.0.0.5:5000' }").unwrap();

        let shared: SharedConfig = Arc::new(RwLock::new(Config::default()));
        reload(&path, &shared).unwrap();

        assert_eq!(shared.read().unwrap().api_base_url, "http://10.0.0.5:5000");
    }

    #[test]
    fn test_reload_keeps_previous_config_on_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ api_base_url: ").unwrap();

        let shared: SharedConfig = Arc::new(RwLock::new(Config::default()));
        assert!(reload(&path, &shared).is_err());

        assert_eq!(*shared.read().unwrap(), Config::default());
    }
}
