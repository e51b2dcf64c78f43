//! Custom error types for pubquery.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, PubqueryError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for pubquery operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum PubqueryError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Rate limited by the ADS API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code from API
        code: i32,
        /// Error message from API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Spreadsheet rendering error
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Mail assembly error
    #[error("Mail error: {0}")]
    Mail(#[from] lettre::error::Error),

    /// Malformed email address
    #[error("Address error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Malformed attachment content type
    #[error("Content type error: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    /// SMTP submission error
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Result type alias using `PubqueryError`
pub type Result<T> = std::result::Result<T, PubqueryError>;
