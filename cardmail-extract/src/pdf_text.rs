//! Text extraction from statement PDFs, protected ones included

use pdf::content::Op;
use pdf::file::FileOptions;

/// Seam for the pipeline: anything that can turn attachment bytes into
/// text, given candidate passwords to try.
pub trait DocumentReader {
    fn read(&self, data: &[u8], passwords: &[String]) -> Option<String>;
}

/// The real reader.
pub struct PdfDocumentReader;

impl DocumentReader for PdfDocumentReader {
    fn read(&self, data: &[u8], passwords: &[String]) -> Option<String> {
        read_document_text(data, passwords)
    }
}

/// Pull the text out of a PDF. Unprotected documents extract directly;
/// protected ones are opened with each candidate password in order,
/// stopping at the first that works. `None` means no text could be
/// recovered at all.
pub fn read_document_text(data: &[u8], passwords: &[String]) -> Option<String> {
    match pdf_extract::extract_text_from_mem(data) {
        Ok(text) => Some(text),
        Err(err) => {
            // lopdf reports protected files as encryption/decryption errors
            let msg = err.to_string().to_lowercase();
            if msg.contains("crypt") || msg.contains("password") {
                log::info!(
                    "document looks password protected; trying {} candidate(s)",
                    passwords.len()
                );
                let unlocked = try_candidates(passwords, |pw| decrypt_and_extract(data, pw));
                if unlocked.is_none() {
                    log::warn!("no candidate password unlocked the document");
                }
                unlocked
            } else {
                log::warn!("could not read document text: {err}");
                None
            }
        }
    }
}

/// Run `attempt` over the candidates in order, returning the first
/// success. Later candidates are never touched once one works.
fn try_candidates<F>(passwords: &[String], mut attempt: F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    for password in passwords {
        if let Some(text) = attempt(password) {
            return Some(text);
        }
    }
    None
}

/// Open with a password and pull the text ops page by page. A wrong
/// password fails the open; a page that fails to parse is skipped.
fn decrypt_and_extract(data: &[u8], password: &str) -> Option<String> {
    let file = FileOptions::cached()
        .password(password.as_bytes())
        .load(data.to_vec())
        .ok()?;

    let mut fragments: Vec<String> = Vec::new();
    for page in file.pages() {
        let page = match page {
            Ok(p) => p,
            Err(_) => continue,
        };
        let Some(content) = &page.contents else {
            continue;
        };
        let Ok(ops) = content.operations(&file) else {
            continue;
        };
        for op in &ops {
            if let Op::TextDraw { text } = op {
                if let Ok(fragment) = std::str::from_utf8(text.as_bytes()) {
                    let fragment = fragment.trim();
                    if !fragment.is_empty() {
                        fragments.push(fragment.to_string());
                    }
                }
            }
        }
    }
    Some(fragments.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_candidates_tried_in_order_until_success() {
        let attempts = Cell::new(0);
        let passwords: Vec<String> = ["AAAA0101", "AMIT1507", "150790"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let text = try_candidates(&passwords, |pw| {
            attempts.set(attempts.get() + 1);
            (pw == "AMIT1507").then(|| "statement text".to_string())
        });

        assert_eq!(text.as_deref(), Some("statement text"));
        // the third candidate is never attempted
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_all_candidates_fail() {
        let attempts = Cell::new(0);
        let passwords: Vec<String> = vec!["a".to_string(), "b".to_string()];
        let text = try_candidates(&passwords, |_| {
            attempts.set(attempts.get() + 1);
            None
        });
        assert!(text.is_none());
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_empty_candidate_list() {
        let text = try_candidates(&[], |_| Some("never".to_string()));
        assert!(text.is_none());
    }

    #[test]
    fn test_garbage_bytes_yield_none() {
        assert!(read_document_text(b"not a pdf at all", &[]).is_none());
    }
}
