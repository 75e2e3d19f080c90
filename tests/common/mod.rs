use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Config pointing at a port nothing listens on, with no response delay
#[allow(dead_code)]
pub const UNREACHABLE_CONFIG: &str =
    "service:\n  endpoint: http://127.0.0.1:9\n  request_timeout_seconds: 2\ndispatch:\n  response_delay_ms: 0\n";

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("lexi.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config for a mock answering service at `uri`, with no response delay
#[allow(dead_code)]
pub fn config_for_endpoint(uri: &str) -> String {
    format!(
        "service:\n  endpoint: {}\n  request_timeout_seconds: 5\ndispatch:\n  response_delay_ms: 0\n",
        uri
    )
}
