use library_sphere::config::{self, Config, SharedConfig};
use library_sphere::server::run;
use reqwest::StatusCode;
use std::{
    fs,
    io::{self, Write},
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, RwLock},
    time::Duration,
};
use tempfile::{tempdir, NamedTempFile};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const SIGN_IN_CONFIG: &str = r"{
  // local test instance
  site_name: 'Test Library',
  api_base_url: 'http://127.0.0.1:5000',
}
";

// Helper function to find an available port
async fn find_available_port() -> Option<u16> {
    use tokio::net::TcpListener;
    for port in 8000..9000 {
        match TcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), port)).await {
            Ok(listener) => {
                return Some(
                    listener
                        .local_addr()
                        .expect("Failed to get local address of listener")
                        .port(),
                )
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                eprintln!(
                    "Skipping server integration test because binding to {port} failed: {err}"
                );
                return None;
            }
            Err(_) => {}
        }
    }
    panic!("No available port found");
}

#[tokio::test]
async fn test_server_starts_and_serves_sign_in() {
    let mut config_file = NamedTempFile::new().expect("Failed to create temp config file");
    config_file
        .write_all(SIGN_IN_CONFIG.as_bytes())
        .expect("Failed to write to temp config file");
    let config_path = config_file.path().to_path_buf();

    let Some(port) = find_available_port().await else {
        return;
    };
    let server_address = format!("http://127.0.0.1:{port}");
    let cancel_token = CancellationToken::new();

    let server_handle = tokio::spawn({
        let cancel_token = cancel_token.clone();
        async move {
            run(port, Some(config_path), cancel_token)
                .await
                .expect("Server failed to start");
        }
    });

    // Give the server a moment to start up
    sleep(Duration::from_secs(1)).await;

    let client = reqwest::Client::new();
    let response = client
        .get(&server_address)
        .send()
        .await
        .expect("Failed to send request to server");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("Failed to read sign-in page");
    assert!(body.contains("Test Library"));

    let stylesheet = client
        .get(format!("{server_address}/static/styles.css"))
        .send()
        .await
        .expect("Failed to request stylesheet");
    assert_eq!(stylesheet.status(), StatusCode::OK);

    cancel_token.cancel();
    server_handle.await.expect("Server task failed");
}

#[tokio::test]
async fn test_server_rejects_invalid_config() {
    let mut config_file = NamedTempFile::new().expect("Failed to create temp config file");
    config_file
        .write_all(b"{ api_base_url: 'not a url' }")
        .expect("Failed to write to temp config file");

    let result = run(0, Some(config_file.path().to_path_buf()), CancellationToken::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_config_edits_are_picked_up() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json5");
    fs::write(&path, "{ api_base_url: 'http://127.0.0.1:5000' }").expect("Failed to write config");

    let initial = Config::load(&path).expect("Failed to load config");
    let shared: SharedConfig = Arc::new(RwLock::new(initial));
    let cancel_token = CancellationToken::new();
    config::watch(path.clone(), shared.clone(), cancel_token.clone())
        .expect("Failed to watch config");

    fs::write(&path, "{ api_base_url: 'http://10.0.0.5:8080' }").expect("Failed to rewrite config");

    let mut reloaded = false;
    for _ in 0..50 {
        if shared.read().unwrap().api_base_url == "http://10.0.0.5:8080" {
            reloaded = true;
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    cancel_token.cancel();

    assert!(reloaded, "configuration was not reloaded");
}
