//! Runtime configuration for pubquery.
//!
//! Credentials, the mail relay and the recipient list come from environment
//! variables (a local `.env` file is honoured via `dotenvy`). The search
//! terms come from flat text files: one keyword per line in the keywords
//! file, `Name: affiliation` per line in the authors file.

use crate::error::{PubqueryError, Result};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default keywords file, one keyword per line.
const DEFAULT_KEYWORDS_FILE: &str = "keys.txt";

/// Default authors file, `Name: affiliation` per line.
const DEFAULT_AUTHORS_FILE: &str = "authors.txt";

/// Default location of the previously reported bibcodes log.
const DEFAULT_PREVIOUS_BIBCODES_FILE: &str = "previous_bibcodes.txt";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// ADS API token
    pub ads_api_key: String,
    /// Sender address for the report mail
    pub from_email: String,
    /// Recipient addresses for the report mail
    pub librarian_emails: Vec<String>,
    /// Mail relay host
    pub smtp_host: String,
    /// Mail relay port
    pub smtp_port: u16,
    /// Path of the previously reported bibcodes log
    pub previous_bibcodes_file: PathBuf,
    /// Keywords to search the full text for
    pub keywords: Vec<String>,
    /// Authors to search for, name to affiliation
    pub authors: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from the environment and the flat search-term files.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let keywords_file =
            env::var("KEYWORDS_FILE").unwrap_or_else(|_| DEFAULT_KEYWORDS_FILE.to_string());
        let authors_file =
            env::var("AUTHORS_FILE").unwrap_or_else(|_| DEFAULT_AUTHORS_FILE.to_string());

        let keywords = load_keywords(Path::new(&keywords_file))?;
        let authors = load_authors(Path::new(&authors_file))?;
        info!(
            keywords = keywords.len(),
            authors = authors.len(),
            "Loaded search terms"
        );

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "25".to_string())
            .parse()
            .map_err(|e| PubqueryError::Config(format!("Invalid SMTP_PORT: {}", e)))?;

        Ok(Self {
            ads_api_key: required("ADS_API_KEY")?,
            from_email: required("FROM_EMAIL")?,
            librarian_emails: split_addresses(&required("LIBRARIANS_EMAIL")?),
            smtp_host: required("SMTP_HOST")?,
            smtp_port,
            previous_bibcodes_file: env::var("PREVIOUS_BIBCODES_FILE")
                .unwrap_or_else(|_| DEFAULT_PREVIOUS_BIBCODES_FILE.to_string())
                .into(),
            keywords,
            authors,
        })
    }
}

/// Read a required environment variable.
fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| PubqueryError::Config(format!("{} must be set", name)))
}

/// Split an `&`-separated address list into individual addresses.
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split('&')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Load the keywords file: one keyword per line, blank lines ignored.
pub fn load_keywords(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PubqueryError::Config(format!("Cannot read keywords file {:?}: {}", path, e))
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Load the authors file: `Name: affiliation` per line, blank lines ignored.
pub fn load_authors(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PubqueryError::Config(format!("Cannot read authors file {:?}: {}", path, e))
    })?;

    let mut authors = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, affiliation) = line.split_once(':').ok_or_else(|| {
            PubqueryError::Config(format!("Malformed author line (expected 'Name: affiliation'): {}", line))
        })?;
        authors.insert(name.trim().to_string(), affiliation.trim().to_string());
    }

    Ok(authors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_split_addresses() {
        let addresses = split_addresses("librarian@saao.ac.za & archive@saao.ac.za");
        assert_eq!(
            addresses,
            vec!["librarian@saao.ac.za", "archive@saao.ac.za"]
        );

        assert!(split_addresses("").is_empty());
        assert_eq!(split_addresses("one@example.com"), vec!["one@example.com"]);
    }

    #[test]
    fn test_load_keywords() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "SAAO")?;
        writeln!(file, "KELT")?;
        writeln!(file)?;
        writeln!(file, "Infrared Survey")?;

        let keywords = load_keywords(file.path())?;
        assert_eq!(keywords, vec!["SAAO", "KELT", "Infrared Survey"]);
        Ok(())
    }

    #[test]
    fn test_load_keywords_missing_file() {
        let result = load_keywords(Path::new("/nonexistent/keys.txt"));
        assert!(matches!(result, Err(PubqueryError::Config(_))));
    }

    #[test]
    fn test_load_authors() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Potter, S.: SAAO")?;
        writeln!(file, "Buckley, D.: SALT")?;

        let authors = load_authors(file.path())?;
        assert_eq!(authors.len(), 2);
        assert_eq!(authors["Potter, S."], "SAAO");
        assert_eq!(authors["Buckley, D."], "SALT");
        Ok(())
    }

    #[test]
    fn test_load_authors_malformed_line() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "no separator here")?;

        let result = load_authors(file.path());
        assert!(matches!(result, Err(PubqueryError::Config(_))));
        Ok(())
    }
}
