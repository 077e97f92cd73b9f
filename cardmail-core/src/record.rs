//! Extracted statement fields and per-email results

use serde::{Deserialize, Serialize};

/// Financial fields pulled out of a statement body or PDF.
///
/// Every field is optional; extraction fills in what it can confirm.
/// `total_amount_due` and `minimum_amount_due` form the essential pair:
/// a result is only emitted when both are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub total_amount_due: Option<f64>,
    pub minimum_amount_due: Option<f64>,
    pub due_date: Option<String>,
    pub statement_date: Option<String>,
    pub card_last_4_digits: Option<String>,
    pub bank_name: Option<String>,
}

impl StatementRecord {
    /// True when at least one field is populated.
    pub fn has_any(&self) -> bool {
        self.total_amount_due.is_some()
            || self.minimum_amount_due.is_some()
            || self.due_date.is_some()
            || self.statement_date.is_some()
            || self.card_last_4_digits.is_some()
            || self.bank_name.is_some()
    }

    /// True when both essential amounts are present.
    pub fn has_essentials(&self) -> bool {
        self.total_amount_due.is_some() && self.minimum_amount_due.is_some()
    }

    /// Merge `other` into `self`, field by field. Populated incoming
    /// fields overwrite; absent fields never erase existing values.
    pub fn merge_from(&mut self, other: &StatementRecord) {
        if other.total_amount_due.is_some() {
            self.total_amount_due = other.total_amount_due;
        }
        if other.minimum_amount_due.is_some() {
            self.minimum_amount_due = other.minimum_amount_due;
        }
        if other.due_date.is_some() {
            self.due_date = other.due_date.clone();
        }
        if other.statement_date.is_some() {
            self.statement_date = other.statement_date.clone();
        }
        if other.card_last_4_digits.is_some() {
            self.card_last_4_digits = other.card_last_4_digits.clone();
        }
        if other.bank_name.is_some() {
            self.bank_name = other.bank_name.clone();
        }
    }
}

/// Provenance of a result's merged fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordSource {
    /// Fields came from the message body alone.
    #[serde(rename = "email_body")]
    EmailBody,
    /// Fields came from a PDF whose card digits matched the user's card.
    #[serde(rename = "pdf_verified")]
    PdfVerified,
    /// Fields came from a PDF, but card digits were unavailable on one side.
    #[serde(rename = "pdf_unverified")]
    PdfUnverified,
    #[serde(rename = "unknown")]
    Unknown,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::EmailBody => "email_body",
            RecordSource::PdfVerified => "pdf_verified",
            RecordSource::PdfUnverified => "pdf_unverified",
            RecordSource::Unknown => "unknown",
        }
    }
}

/// One qualifying email's extracted details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementResult {
    pub email_id: String,
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub details: StatementRecord,
    pub source: RecordSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essentials_require_both_amounts() {
        let mut record = StatementRecord::default();
        assert!(!record.has_essentials());
        record.total_amount_due = Some(6225.0);
        assert!(!record.has_essentials());
        record.minimum_amount_due = Some(320.0);
        assert!(record.has_essentials());
    }

    #[test]
    fn test_merge_overwrites_populated_fields() {
        let mut base = StatementRecord {
            total_amount_due: Some(100.0),
            bank_name: Some("HDFC Bank".to_string()),
            ..Default::default()
        };
        let incoming = StatementRecord {
            total_amount_due: Some(6225.0),
            minimum_amount_due: Some(320.0),
            ..Default::default()
        };
        base.merge_from(&incoming);
        assert_eq!(base.total_amount_due, Some(6225.0));
        assert_eq!(base.minimum_amount_due, Some(320.0));
        // absent incoming fields never erase
        assert_eq!(base.bank_name.as_deref(), Some("HDFC Bank"));
    }

    #[test]
    fn test_has_any_on_single_field() {
        let record = StatementRecord {
            due_date: Some("14-03-2025".to_string()),
            ..Default::default()
        };
        assert!(record.has_any());
        assert!(!StatementRecord::default().has_any());
    }

    #[test]
    fn test_source_serializes_as_snake_case_tag() {
        let json = serde_json::to_string(&RecordSource::PdfUnverified).unwrap();
        assert_eq!(json, "\"pdf_unverified\"");
        let back: RecordSource = serde_json::from_str("\"email_body\"").unwrap();
        assert_eq!(back, RecordSource::EmailBody);
    }

    #[test]
    fn test_result_serializes_nulls_for_missing_fields() {
        let result = StatementResult {
            email_id: "42".to_string(),
            subject: "e-statement".to_string(),
            sender: "HDFC Bank <statements@hdfcbank.com>".to_string(),
            date: "Mon, 3 Mar 2025 09:12:00 +0530".to_string(),
            details: StatementRecord {
                total_amount_due: Some(6225.0),
                minimum_amount_due: Some(320.0),
                ..Default::default()
            },
            source: RecordSource::EmailBody,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["details"]["total_amount_due"], 6225.0);
        assert!(json["details"]["due_date"].is_null());
        assert_eq!(json["source"], "email_body");
    }
}
