//! MIME decomposition: headers, body text, and PDF attachments
//!
//! Statement mails arrive in every shape: plain text, HTML-only,
//! multipart/alternative nested under multipart/mixed, PDFs attached
//! inline or with a disposition. The walk below flattens all of that
//! into one body string plus the PDF attachments.

use crate::types::{EmailAttachment, FetchedEmail};
use anyhow::{Context, Result};
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use scraper::Html;

/// Parse a raw RFC 822 message into a [`FetchedEmail`].
///
/// Headers are RFC 2047-decoded by the parser. Body text concatenates
/// every non-attachment text part (HTML flattened to text) separated by
/// blank lines. Attachments keep only named `.pdf` parts with a
/// non-empty payload.
pub fn parse_message(uid: u32, raw: &[u8]) -> Result<FetchedEmail> {
    let parsed = mailparse::parse_mail(raw).with_context(|| format!("parsing message uid {uid}"))?;

    let subject = parsed.headers.get_first_value("Subject").unwrap_or_default();
    let sender = parsed.headers.get_first_value("From").unwrap_or_default();
    let date = parsed.headers.get_first_value("Date").unwrap_or_default();

    let mut body_text = String::new();
    let mut attachments = Vec::new();
    collect_parts(&parsed, &mut body_text, &mut attachments);

    Ok(FetchedEmail {
        uid,
        subject,
        sender,
        date,
        body_text,
        attachments,
    })
}

fn collect_parts(part: &ParsedMail<'_>, body: &mut String, attachments: &mut Vec<EmailAttachment>) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_parts(sub, body, attachments);
        }
        return;
    }

    let disposition = part.get_content_disposition();
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned();

    // Named PDFs count as statements whether or not the sender marked
    // them as attachments.
    if let Some(name) = &filename {
        if name.to_lowercase().ends_with(".pdf") {
            match part.get_body_raw() {
                Ok(data) if !data.is_empty() => {
                    attachments.push(EmailAttachment {
                        filename: name.clone(),
                        data,
                    });
                }
                Ok(_) => {}
                Err(err) => log::warn!("could not decode attachment '{name}': {err}"),
            }
        }
    }

    if disposition.disposition == DispositionType::Attachment {
        return;
    }
    match part.ctype.mimetype.as_str() {
        "text/plain" => match part.get_body() {
            Ok(text) => {
                body.push_str(&text);
                body.push_str("\n\n");
            }
            Err(err) => log::warn!("skipping undecodable text part: {err}"),
        },
        "text/html" => match part.get_body() {
            Ok(html) => {
                body.push_str(&html_to_text(&html));
                body.push_str("\n\n");
            }
            Err(err) => log::warn!("skipping undecodable html part: {err}"),
        },
        _ => {}
    }
}

/// Flatten an HTML document to bare text: one trimmed fragment per
/// line, script and style contents dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let inside_non_content = node
            .parent()
            .and_then(|p| p.value().as_element().map(|el| el.name() == "script" || el.name() == "style"))
            .unwrap_or(false);
        if inside_non_content {
            continue;
        }
        let fragment = text.trim();
        if !fragment.is_empty() {
            lines.push(fragment.to_string());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_multipart_with_pdf_attachment() {
        let raw = concat!(
            "From: HDFC Bank <statements@hdfcbank.com>\r\n",
            "Subject: Your e-Statement\r\n",
            "Date: Mon, 3 Mar 2025 09:12:00 +0530\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "Your statement is attached.\r\n",
            "--inner\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<html><head><style>.x{color:red}</style></head>",
            "<body><p>Total Amount Due: Rs. 6,225.00</p>",
            "<script>var x=1;</script></body></html>\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: application/pdf; name=\"statement.pdf\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "Content-Disposition: attachment; filename=\"statement.pdf\"\r\n",
            "\r\n",
            "JVBERi0xLjQgdGVzdA==\r\n",
            "--outer--\r\n",
        );

        let email = parse_message(7, raw.as_bytes()).unwrap();
        assert_eq!(email.uid, 7);
        assert_eq!(email.subject, "Your e-Statement");
        assert_eq!(email.sender, "HDFC Bank <statements@hdfcbank.com>");
        assert!(email.body_text.contains("Your statement is attached."));
        assert!(email.body_text.contains("Total Amount Due: Rs. 6,225.00"));
        assert!(!email.body_text.contains("color:red"));
        assert!(!email.body_text.contains("var x=1"));
        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].filename, "statement.pdf");
        assert_eq!(email.attachments[0].data, b"%PDF-1.4 test");
    }

    #[test]
    fn test_quoted_printable_body_decoded() {
        let raw = concat!(
            "From: x@y.z\r\n",
            "Subject: Statement\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "Total due: =E2=82=B9500\r\n",
        );
        let email = parse_message(1, raw.as_bytes()).unwrap();
        assert!(email.body_text.contains("Total due: ₹500"));
    }

    #[test]
    fn test_rfc2047_subject_decoded() {
        let raw = concat!(
            "From: x@y.z\r\n",
            "Subject: =?utf-8?q?Statement_ready?=\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hi\r\n",
        );
        let email = parse_message(1, raw.as_bytes()).unwrap();
        assert_eq!(email.subject, "Statement ready");
    }

    #[test]
    fn test_non_pdf_attachments_ignored() {
        let raw = concat!(
            "From: x@y.z\r\n",
            "Subject: Statement\r\n",
            "Content-Type: multipart/mixed; boundary=\"b\"\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/csv; name=\"transactions.csv\"\r\n",
            "Content-Disposition: attachment; filename=\"transactions.csv\"\r\n",
            "\r\n",
            "a,b,c\r\n",
            "--b--\r\n",
        );
        let email = parse_message(1, raw.as_bytes()).unwrap();
        assert!(email.attachments.is_empty());
        // attachment-disposition text never leaks into the body
        assert!(!email.body_text.contains("a,b,c"));
    }

    #[test]
    fn test_pdf_uppercase_extension_and_name_param() {
        let raw = concat!(
            "From: x@y.z\r\n",
            "Subject: Statement\r\n",
            "Content-Type: multipart/mixed; boundary=\"b\"\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: application/pdf; name=\"MARCH.PDF\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "JVBERi0xLjQgdGVzdA==\r\n",
            "--b--\r\n",
        );
        let email = parse_message(1, raw.as_bytes()).unwrap();
        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].filename, "MARCH.PDF");
    }

    #[test]
    fn test_html_to_text_fragments_joined_by_newline() {
        let text = html_to_text("<div><p>Minimum Due</p><p>Rs. 320.00</p></div>");
        assert_eq!(text, "Minimum Due\nRs. 320.00");
    }
}
