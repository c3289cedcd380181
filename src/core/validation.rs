//! URL and path validation utilities
//!
//! Provides security-focused validation for user inputs:
//! - YouTube URL validation (whitelist-based), applied before any job starts
//! - Served filename validation (prevent directory traversal)

use std::path::{Component, Path};
use thiserror::Error;
use url::Url;

use crate::core::config;

/// Hosts accepted by `validate_youtube_url`.
const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "youtu.be"];

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, malformed, or non-YouTube URL
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    /// Path validation failed (traversal attempt, absolute path, etc.)
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Empty name
    #[error("Path '{0}' is empty")]
    EmptyPath(String),
}

/// Validates that a URL is a YouTube URL.
///
/// # Security
/// Uses whitelist approach:
/// - Only HTTP/HTTPS schemes allowed
/// - Only `youtube.com`, `www.youtube.com` and `youtu.be` hosts
/// - Length capped at `config::validation::MAX_URL_LENGTH`
///
/// # Examples
/// ```
/// use tubeloader::core::validation::validate_youtube_url;
///
/// assert!(validate_youtube_url("https://www.youtube.com/watch?v=abc").is_ok());
/// assert!(validate_youtube_url("http://youtu.be/abc").is_ok());
///
/// assert!(validate_youtube_url("https://vimeo.com/123").is_err());
/// assert!(validate_youtube_url("ftp://youtube.com/video").is_err());
/// assert!(validate_youtube_url("not a url").is_err());
/// ```
pub fn validate_youtube_url(url: &str) -> Result<(), ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::InvalidUrl("url is required".to_string()));
    }

    if url.len() > config::validation::MAX_URL_LENGTH {
        return Err(ValidationError::InvalidUrl(format!(
            "url longer than {} characters",
            config::validation::MAX_URL_LENGTH
        )));
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;

    // Only HTTP and HTTPS are allowed
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(format!(
            "{} (invalid scheme: {})",
            url,
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ValidationError::InvalidUrl(format!("{} (no host)", url)))?
        .to_lowercase();

    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return Err(ValidationError::InvalidUrl(format!(
            "{} (not a YouTube domain: {})",
            url, host
        )));
    }

    Ok(())
}

/// Validates a filename requested from the download directory.
///
/// # Security
/// The name must be a single normal path component: no separators,
/// no `..`, no root or drive prefix. Anything else is rejected rather
/// than rewritten, so a request can never reach outside the directory.
///
/// # Examples
/// ```
/// use tubeloader::core::validation::validate_served_filename;
///
/// assert!(validate_served_filename("Test Video AB.mp4").is_ok());
/// assert!(validate_served_filename("../etc/passwd").is_err());
/// assert!(validate_served_filename("/etc/passwd").is_err());
/// ```
pub fn validate_served_filename(name: &str) -> Result<&str, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyPath(name.to_string()));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::InvalidPath {
            path: name.to_string(),
            reason: "path separators not allowed".to_string(),
        });
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(ValidationError::InvalidPath {
            path: name.to_string(),
            reason: "must be a plain file name".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== validate_youtube_url Tests ====================

    #[test]
    fn test_validate_youtube_url_valid() {
        let valid_urls = vec![
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=abc",
            "http://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://WWW.YouTube.com/watch?v=dQw4w9WgXcQ",
        ];

        for url in valid_urls {
            assert!(validate_youtube_url(url).is_ok(), "URL should be valid: {}", url);
        }
    }

    #[test]
    fn test_validate_youtube_url_invalid() {
        let invalid_urls = vec![
            "",
            "   ",
            "https://vimeo.com/123",
            "https://evil.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com.evil.com/watch?v=x",
            "ftp://youtube.com/video",
            "youtube.com/watch?v=abc",
            "not a url",
        ];

        for url in invalid_urls {
            assert!(validate_youtube_url(url).is_err(), "URL should be invalid: {}", url);
        }
    }

    #[test]
    fn test_validate_youtube_url_too_long() {
        let url = format!("https://youtube.com/watch?v={}", "a".repeat(config::validation::MAX_URL_LENGTH));
        assert!(validate_youtube_url(&url).is_err());
    }

    // ==================== validate_served_filename Tests ====================

    #[test]
    fn test_validate_served_filename_plain_names() {
        assert_eq!(validate_served_filename("video.mp4").unwrap(), "video.mp4");
        assert_eq!(validate_served_filename("Song (Live).webm").unwrap(), "Song (Live).webm");
    }

    #[test]
    fn test_validate_served_filename_rejects_traversal() {
        for name in ["..", ".", "../secret.mp4", "a/b.mp4", "a\\b.mp4", "/etc/passwd", ""] {
            assert!(validate_served_filename(name).is_err(), "name should be rejected: {:?}", name);
        }
    }
}
