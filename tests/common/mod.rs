#![allow(dead_code)]

use live_export::controller::LiveExportController;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Temporary served directory with a small site in it
pub struct TestSite {
    pub temp_dir: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("index.html"),
            "<html><body>viewer</body></html>",
        )
        .unwrap();
        std::fs::create_dir_all(temp_dir.path().join("assets")).unwrap();
        std::fs::write(temp_dir.path().join("assets").join("app.js"), "console.log(1);").unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Address the controller is listening on, panicking when inactive
pub async fn served_addr(controller: &LiveExportController) -> SocketAddr {
    controller
        .status()
        .await
        .address
        .expect("controller should be serving")
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://127.0.0.1:{}{}", addr.port(), path)
}

/// Wait until `path` exists or the deadline passes
pub async fn wait_for_file(path: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    path.exists()
}

/// Send `request_path` verbatim, bypassing client-side path normalization.
/// Returns the status line of the response.
pub async fn raw_get_status(addr: SocketAddr, request_path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {request_path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();

    String::from_utf8_lossy(&response)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}
