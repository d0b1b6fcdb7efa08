//! Environment configuration
//!
//! Credentials and collaborator endpoints are read from process environment
//! variables, optionally seeded from a `.env` file in the working directory.
//! Explicit constructor arguments always take precedence over these.

use std::env;
use std::sync::Once;

/// Access key for the remote object store.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Secret key for the remote object store.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Session token when using temporary credentials.
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
/// Signing region, defaults to [`DEFAULT_REGION`].
pub const AWS_REGION: &str = "AWS_REGION";
/// Custom endpoint for S3-compatible stores.
pub const AWS_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";

/// Base URL of the super-resolution inference bridge.
pub const SUPERRES_URL: &str = "PROJECT_UTIL_SUPERRES_URL";
/// Request timeout for the bridge in milliseconds.
pub const SUPERRES_TIMEOUT_MS: &str = "PROJECT_UTIL_SUPERRES_TIMEOUT_MS";
/// Directory holding the `EDSR_x{factor}.pb` model files.
pub const MODEL_DIR: &str = "PROJECT_UTIL_MODEL_DIR";
/// Path or name of the ffmpeg executable.
pub const FFMPEG_BINARY: &str = "PROJECT_UTIL_FFMPEG";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SUPERRES_URL: &str = "http://localhost:8002";
pub const DEFAULT_SUPERRES_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_MODEL_DIR: &str = "ml-models";
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

static DOTENV: Once = Once::new();

/// Load `.env` from the working directory once per process.
///
/// Variables already present in the environment are not overwritten.
pub fn load_dotenv() {
    DOTENV.call_once(|| match dotenvy::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Ignoring unreadable .env file: {}", e),
    });
}

/// Read a non-empty environment variable, after loading `.env`.
pub fn var(name: &str) -> Option<String> {
    load_dotenv();
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Read an environment variable, falling back to `default`.
pub fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_var_uses_default() {
        let value = var_or("PROJECT_UTIL_TEST_UNSET_VARIABLE", "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_empty_var_is_treated_as_missing() {
        env::set_var("PROJECT_UTIL_TEST_EMPTY_VARIABLE", "");
        assert!(var("PROJECT_UTIL_TEST_EMPTY_VARIABLE").is_none());
    }
}
