//! Publication report assembly.
//!
//! Merges the keyword and author result sets by bibcode, drops temporary
//! and previously reported bibcodes, and flattens the survivors into
//! sorted spreadsheet rows. This is where the "later write wins except
//! for the keyword annotations" merge rule lives.

use crate::ads::Publication;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Base URL for ADS abstract pages
const ADS_ABSTRACT_URL: &str = "https://ui.adsabs.harvard.edu/#abs";

/// Spreadsheet columns in render order: record field key and the
/// human-friendly name used in the email legend.
///
/// Record Type, Doc/Publication Number and Telescopes have no ADS source
/// field and stay blank; the librarians fill them in by hand.
pub const COLUMNS: &[(&str, &str)] = &[
    ("record_type", "Record Type"),
    ("publication_number", "Doc/Publication Number"),
    ("author", "Responsibility"),
    ("title", "Title"),
    ("pub", "Journal"),
    ("volume", "Volume"),
    ("issue", "Issue"),
    ("page", "Page"),
    ("refereed", "Refereed"),
    ("bibcode", "Bibcode"),
    ("doi", "DOI"),
    ("ads_url", "ADS URL"),
    ("abstract", "Abstract"),
    ("telescopes", "Telescopes"),
    ("keywords", "Keywords"),
];

/// One flattened report row. Field order matches [`COLUMNS`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublicationRow {
    pub record_type: String,
    pub publication_number: String,
    pub author: String,
    pub title: String,
    #[serde(rename = "pub")]
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub page: String,
    pub refereed: bool,
    pub bibcode: String,
    pub doi: String,
    pub ads_url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub telescopes: String,
    pub keywords: String,
}

/// Union the two result maps by bibcode.
///
/// Author-side fields win on collision, but keyword annotations are always
/// retained from the keyword side.
pub fn merge_results(
    by_keywords: HashMap<String, Publication>,
    by_authors: HashMap<String, Publication>,
) -> HashMap<String, Publication> {
    let mut all = by_keywords;

    for (bibcode, mut publication) in by_authors {
        if let Some(existing) = all.get(&bibcode) {
            publication.keywords = existing.keywords.clone();
        }
        all.insert(bibcode, publication);
    }

    all
}

/// Temporary bibcodes are placeholders ADS reassigns later; reporting them
/// would leave dead identifiers in the spreadsheet.
pub fn is_temporary(bibcode: &str) -> bool {
    bibcode.contains("tmp")
}

/// Flatten the merged map into enriched rows, sorted by bibcode.
///
/// Temporary bibcodes and bibcodes in `seen` are dropped.
pub fn compile_rows(
    merged: HashMap<String, Publication>,
    seen: &HashSet<String>,
) -> Vec<PublicationRow> {
    let mut rows: Vec<PublicationRow> = merged
        .into_values()
        .filter(|p| !is_temporary(&p.bibcode))
        .filter(|p| !seen.contains(&p.bibcode))
        .map(flatten)
        .collect();

    rows.sort_by(|a, b| a.bibcode.cmp(&b.bibcode));
    rows
}

/// Flatten one publication: derive the ADS URL and refereed flag, and
/// comma-join the list-valued fields for display.
fn flatten(publication: Publication) -> PublicationRow {
    PublicationRow {
        record_type: String::new(),
        publication_number: String::new(),
        author: publication.author.join(", "),
        title: publication.title.join(", "),
        journal: publication.journal,
        volume: publication.volume,
        issue: publication.issue,
        page: publication.page.join(", "),
        refereed: publication.property.iter().any(|p| p == "REFEREED"),
        ads_url: format!("{}/{}/abstract", ADS_ABSTRACT_URL, publication.bibcode),
        bibcode: publication.bibcode,
        doi: publication.doi.join(", "),
        abstract_text: publication.abstract_text,
        telescopes: String::new(),
        keywords: publication.keywords.join(", "),
    }
}

/// Column-letter legend for the email body, one `"A - Record Type"` style
/// line per column.
pub fn column_legend() -> Vec<String> {
    COLUMNS
        .iter()
        .enumerate()
        .map(|(i, (_, name))| format!("{} - {}", char::from(b'A' + i as u8), name))
        .collect()
}
