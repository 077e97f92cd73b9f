//! Per-email processing: body first, PDFs as fallback, essentials gate

use crate::extractor::StatementExtractor;
use crate::pdf_text::DocumentReader;
use cardmail_core::{
    generate_candidates, strip_subject_prefixes, RecordSource, StatementRecord, StatementResult,
    UserPii,
};
use cardmail_ingest::FetchedEmail;

/// Drives extraction over a batch of fetched emails. Password
/// candidates are generated once per run; the extractor and document
/// reader are injected so tests can script them.
pub struct StatementPipeline<'a> {
    pii: &'a UserPii,
    passwords: Vec<String>,
    subject_prefixes: Vec<String>,
    extractor: &'a dyn StatementExtractor,
    reader: &'a dyn DocumentReader,
}

enum CardCheck {
    Match,
    Mismatch,
    Inconclusive,
}

impl<'a> StatementPipeline<'a> {
    pub fn new(
        pii: &'a UserPii,
        subject_prefixes: Vec<String>,
        extractor: &'a dyn StatementExtractor,
        reader: &'a dyn DocumentReader,
    ) -> Self {
        let passwords = generate_candidates(pii);
        StatementPipeline {
            pii,
            passwords,
            subject_prefixes,
            extractor,
            reader,
        }
    }

    /// Process emails in the order given (newest first from the
    /// scanner), emitting a result per email whose essential amounts
    /// could both be established.
    pub fn process(&self, emails: &[FetchedEmail]) -> Vec<StatementResult> {
        emails
            .iter()
            .filter_map(|email| self.process_email(email))
            .collect()
    }

    fn process_email(&self, email: &FetchedEmail) -> Option<StatementResult> {
        let normalized = strip_subject_prefixes(&email.subject, &self.subject_prefixes);
        log::info!("processing uid {} '{normalized}'", email.uid);

        let mut details = StatementRecord::default();
        let mut source = RecordSource::Unknown;

        if !email.body_text.trim().is_empty() {
            let from_body = self.extractor.extract(&email.body_text);
            if from_body.has_any() {
                details.merge_from(&from_body);
                source = RecordSource::EmailBody;
            }
        }

        if !details.has_essentials() {
            self.merge_from_attachments(email, &mut details, &mut source);
        }

        if details.has_essentials() {
            Some(StatementResult {
                email_id: email.uid.to_string(),
                subject: email.subject.clone(),
                sender: email.sender.clone(),
                date: email.date.clone(),
                details,
                source,
            })
        } else {
            if details.has_any() {
                log::info!(
                    "uid {}: partial details without both due amounts; dropping",
                    email.uid
                );
            }
            None
        }
    }

    /// Walk the PDF attachments in discovery order, merging extracted
    /// fields until both essential amounts are present. A PDF whose
    /// card digits contradict the user's card contributes nothing.
    fn merge_from_attachments(
        &self,
        email: &FetchedEmail,
        details: &mut StatementRecord,
        source: &mut RecordSource,
    ) {
        let user_last4 = self.pii.card_last4();

        for attachment in &email.attachments {
            let Some(text) = self.reader.read(&attachment.data, &self.passwords) else {
                log::warn!(
                    "uid {}: no text recovered from '{}'",
                    email.uid,
                    attachment.filename
                );
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }

            let from_pdf = self.extractor.extract(&text);
            if !from_pdf.has_any() {
                continue;
            }

            match check_card(user_last4.as_deref(), from_pdf.card_last_4_digits.as_deref()) {
                CardCheck::Match => {
                    details.merge_from(&from_pdf);
                    *source = RecordSource::PdfVerified;
                }
                CardCheck::Mismatch => {
                    log::warn!(
                        "uid {}: '{}' belongs to a different card; discarding its fields",
                        email.uid,
                        attachment.filename
                    );
                    continue;
                }
                CardCheck::Inconclusive => {
                    details.merge_from(&from_pdf);
                    *source = RecordSource::PdfUnverified;
                }
            }

            if details.has_essentials() {
                break;
            }
        }
    }
}

fn check_card(user_last4: Option<&str>, extracted: Option<&str>) -> CardCheck {
    match (user_last4, extracted) {
        (Some(user), Some(found)) => {
            if user == found {
                CardCheck::Match
            } else {
                CardCheck::Mismatch
            }
        }
        _ => CardCheck::Inconclusive,
    }
}
