//! # pubquery
//!
//! ADS Publications Query - monthly literature report mailer
//!
//! ## Modules
//!
//! - [`ads`] - NASA ADS search API client
//! - [`config`] - environment and flat-file configuration
//! - [`report`] - merge, dedupe and flattening of query results
//! - [`spreadsheet`] - xlsx rendering
//! - [`history`] - previously reported bibcodes log
//! - [`mail`] - report delivery over SMTP
//! - [`error`] - custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use pubquery::ads::AdsClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let from = NaiveDate::from_ymd_opt(2017, 6, 1).expect("valid date");
//!     let to = NaiveDate::from_ymd_opt(2017, 6, 30).expect("valid date");
//!     let client = AdsClient::new("token".to_string(), from, to)?;
//!     let hits = client.by_keywords(&["SAAO".to_string()]).await?;
//!     println!("Found {} publications", hits.len());
//!     Ok(())
//! }
//! ```

pub mod ads;
pub mod config;
pub mod error;
pub mod history;
pub mod mail;
pub mod report;
pub mod spreadsheet;

pub use error::{PubqueryError, Result};
