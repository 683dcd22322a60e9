use cassandra_connector::PolicyConfigBuilder;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

/// Listener accepting TCP connections through its backlog, without ever responding.
#[allow(dead_code)]
pub async fn listener() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

#[allow(dead_code)]
pub async fn closed_port() -> u16 {
    listener().await.local_addr().unwrap().port()
}

#[allow(dead_code)]
pub fn local_config(port: u16) -> PolicyConfigBuilder {
    PolicyConfigBuilder::new()
        .with_host("127.0.0.1")
        .with_port(port)
        .with_local_connections_per_executor(1)
        .with_connect_timeout_millis(1000)
        .with_timeout_before_close_millis(1000)
}

#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
