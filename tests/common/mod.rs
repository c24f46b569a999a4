//! Common test utilities and fixtures

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// Binary command isolated from the developer's own configuration:
/// no config file discovery outside `workdir`, no REDDIT_PERSONA_* overrides.
pub fn persona_cmd(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reddit-persona").unwrap();
    cmd.current_dir(workdir)
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join(".config"))
        .env_remove("RUST_LOG");

    for (key, _) in std::env::vars() {
        if key.starts_with("REDDIT_PERSONA_") {
            cmd.env_remove(key);
        }
    }
    cmd
}
