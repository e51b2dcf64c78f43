//! Spreadsheet rendering.
//!
//! Writes the compiled publication rows into an in-memory xlsx workbook.
//! There is no header row: the email body carries a column-letter legend
//! instead, so the cell at A1 is the first publication. Cell order must
//! match [`crate::report::COLUMNS`].

use crate::error::Result;
use crate::report::PublicationRow;
use rust_xlsxwriter::Workbook;
use tracing::debug;

/// Render the rows into an xlsx buffer ready for mailing.
pub fn render(rows: &[PublicationRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        let r = r as u32;
        worksheet.write_string(r, 0, &row.record_type)?;
        worksheet.write_string(r, 1, &row.publication_number)?;
        worksheet.write_string(r, 2, &row.author)?;
        worksheet.write_string(r, 3, &row.title)?;
        worksheet.write_string(r, 4, &row.journal)?;
        worksheet.write_string(r, 5, &row.volume)?;
        worksheet.write_string(r, 6, &row.issue)?;
        worksheet.write_string(r, 7, &row.page)?;
        worksheet.write_boolean(r, 8, row.refereed)?;
        worksheet.write_string(r, 9, &row.bibcode)?;
        worksheet.write_string(r, 10, &row.doi)?;
        worksheet.write_string(r, 11, &row.ads_url)?;
        worksheet.write_string(r, 12, &row.abstract_text)?;
        worksheet.write_string(r, 13, &row.telescopes)?;
        worksheet.write_string(r, 14, &row.keywords)?;
    }

    let buffer = workbook.save_to_buffer()?;
    debug!(rows = rows.len(), bytes = buffer.len(), "Rendered spreadsheet");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_xlsx() -> Result<()> {
        let rows = vec![
            PublicationRow {
                bibcode: "2017A".to_string(),
                title: "First".to_string(),
                refereed: true,
                ..Default::default()
            },
            PublicationRow {
                bibcode: "2017B".to_string(),
                title: "Second".to_string(),
                ..Default::default()
            },
        ];

        let buffer = render(&rows)?;
        // xlsx is a zip container
        assert_eq!(&buffer[..2], b"PK");
        Ok(())
    }

    #[test]
    fn test_render_empty() -> Result<()> {
        let buffer = render(&[])?;
        assert_eq!(&buffer[..2], b"PK");
        Ok(())
    }
}
