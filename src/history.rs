//! Previously reported bibcodes log.
//!
//! Bibcodes that have already been mailed out are stored one per line in a
//! flat text file so that subsequent runs only report new publications.

use crate::error::{PubqueryError, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Flat-file log of bibcodes reported by previous runs.
pub struct BibcodeLog {
    path: PathBuf,
}

impl BibcodeLog {
    /// Create a log handle for the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log file if it doesn't exist yet.
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.path.is_file() {
            std::fs::File::create(&self.path).map_err(|e| {
                PubqueryError::Config(format!(
                    "The file for storing previously found bibcodes could not be created: {:?}: {}",
                    self.path, e
                ))
            })?;
        }
        Ok(())
    }

    /// Load the bibcodes recorded by previous runs.
    ///
    /// The log file is created first if it doesn't exist.
    pub fn load(&self) -> Result<HashSet<String>> {
        self.ensure_exists()?;

        let content = std::fs::read_to_string(&self.path)?;
        let bibcodes: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        debug!(count = bibcodes.len(), path = ?self.path, "Loaded previously reported bibcodes");
        Ok(bibcodes)
    }

    /// Append newly reported bibcodes to the log.
    pub fn record<'a>(&self, bibcodes: impl IntoIterator<Item = &'a str>) -> Result<()> {
        self.ensure_exists()?;

        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
        let mut count = 0;
        for bibcode in bibcodes {
            writeln!(file, "{}", bibcode)?;
            count += 1;
        }

        info!(count, path = ?self.path, "Recorded reported bibcodes");
        Ok(())
    }

    /// Clear the log
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!(path = ?self.path, "Cleared bibcode log");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let log = BibcodeLog::new(dir.path().join("previous_bibcodes.txt"));

        let bibcodes = log.load()?;
        assert!(bibcodes.is_empty());
        assert!(log.path().is_file());
        Ok(())
    }

    #[test]
    fn test_record_and_load() -> Result<()> {
        let dir = tempdir()?;
        let log = BibcodeLog::new(dir.path().join("previous_bibcodes.txt"));

        log.record(["2017A", "2017B"])?;
        log.record(["2017C"])?;

        let bibcodes = log.load()?;
        assert_eq!(bibcodes.len(), 3);
        assert!(bibcodes.contains("2017B"));
        Ok(())
    }

    #[test]
    fn test_load_skips_blank_lines() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("previous_bibcodes.txt");
        std::fs::write(&path, "2017A\n\n  \n2017B\n")?;

        let log = BibcodeLog::new(path);
        assert_eq!(log.load()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_clear() -> Result<()> {
        let dir = tempdir()?;
        let log = BibcodeLog::new(dir.path().join("previous_bibcodes.txt"));

        log.record(["2017A"])?;
        log.clear()?;
        assert!(!log.path().exists());

        // clearing an absent log is fine
        log.clear()?;
        Ok(())
    }

    #[test]
    fn test_ensure_exists_unwritable_path() {
        let log = BibcodeLog::new(PathBuf::from("/nonexistent/dir/previous_bibcodes.txt"));
        assert!(matches!(
            log.ensure_exists(),
            Err(PubqueryError::Config(_))
        ));
    }
}
