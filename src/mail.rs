//! Report delivery over SMTP.
//!
//! Assembles the multipart report message (plain text and HTML body
//! alternatives plus the spreadsheet attachment) and submits it to the
//! configured mail relay.

use crate::config::Config;
use crate::error::Result;
use crate::report;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;
use tracing::info;

/// Subject line for the report mail
const SUBJECT: &str = "Publications Query Results";

/// Attachment file name
const ATTACHMENT_NAME: &str = "all.xlsx";

/// Attachment MIME type
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// HTML body with the column-letter legend for the attached spreadsheet.
pub fn html_body() -> String {
    let legend = report::column_legend()
        .iter()
        .map(|line| format!("{}<br>", line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<p>Dear Librarian,</p>\n\n\
         <p>Please find attached the results for the publications query.</p>\n\n\
         <p>{}</p>\n\n\
         <p>Kind regards,</p>\n\n\
         <p>Your Friendly Publications Query Script</p>",
        legend
    )
}

/// Strip HTML tags for the plain text alternative.
fn strip_html_tags(text: &str) -> String {
    match Regex::new(r"<[^>]+>") {
        Ok(re) => re.replace_all(text, "").to_string(),
        Err(_) => text.to_string(),
    }
}

/// Build the report message: alternative plain/HTML body plus the
/// spreadsheet attachment, addressed to the full recipient list.
pub fn build_message(config: &Config, spreadsheet: Vec<u8>) -> Result<Message> {
    let mut builder = Message::builder()
        .from(config.from_email.parse::<Mailbox>()?)
        .subject(SUBJECT);
    for recipient in &config.librarian_emails {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    let html = html_body();
    let text = strip_html_tags(&html);

    let attachment = Attachment::new(ATTACHMENT_NAME.to_string())
        .body(spreadsheet, XLSX_CONTENT_TYPE.parse::<ContentType>()?);

    let message = builder.multipart(
        MultiPart::mixed()
            .multipart(MultiPart::alternative_plain_html(text, html))
            .singlepart(attachment),
    )?;

    Ok(message)
}

/// Send the report spreadsheet to the configured recipients.
pub async fn send(config: &Config, spreadsheet: Vec<u8>) -> Result<()> {
    let message = build_message(config, spreadsheet)?;

    // Plain SMTP: the relay sits on the local network.
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        .port(config.smtp_port)
        .build();

    info!(
        host = %config.smtp_host,
        recipients = config.librarian_emails.len(),
        "Sending publications report"
    );
    mailer.send(message).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            ads_api_key: "token".to_string(),
            from_email: "queries@saao.example".to_string(),
            librarian_emails: vec![
                "librarian@saao.example".to_string(),
                "archive@saao.example".to_string(),
            ],
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            previous_bibcodes_file: PathBuf::from("previous_bibcodes.txt"),
            keywords: Vec::new(),
            authors: BTreeMap::new(),
        }
    }

    #[test]
    fn test_html_body_contains_legend() {
        let html = html_body();
        assert!(html.contains("A - Record Type<br>"));
        assert!(html.contains("O - Keywords<br>"));
        assert!(html.contains("Dear Librarian"));
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html_tags("No tags"), "No tags");
        assert_eq!(
            strip_html_tags("<b>Bold</b> and <i>italic</i>"),
            "Bold and italic"
        );
    }

    #[test]
    fn test_build_message() -> Result<()> {
        let message = build_message(&test_config(), b"PK fake spreadsheet".to_vec())?;

        let formatted = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(formatted.contains("Subject: Publications Query Results"));
        assert!(formatted.contains("librarian@saao.example"));
        assert!(formatted.contains("archive@saao.example"));
        assert!(formatted.contains(ATTACHMENT_NAME));
        Ok(())
    }

    #[test]
    fn test_build_message_bad_address() {
        let mut config = test_config();
        config.from_email = "not an address".to_string();

        assert!(build_message(&config, Vec::new()).is_err());
    }
}
