//! Account-holder details supplied for a scan run

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity details used for password derivation and card verification.
///
/// The card number may be the full PAN or any suffix of at least 4 digits;
/// only the last 4 digits are ever consumed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPii {
    pub full_name: String,
    /// Date of birth, strictly `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub mobile_number: String,
    pub credit_card_number: String,
}

impl UserPii {
    /// Reject a malformed date of birth before the pipeline runs.
    pub fn validate(&self) -> Result<()> {
        if NaiveDate::parse_from_str(&self.date_of_birth, "%Y-%m-%d").is_err() {
            bail!(
                "invalid date of birth '{}': expected YYYY-MM-DD",
                self.date_of_birth
            );
        }
        Ok(())
    }

    /// Parsed date of birth, when the field is well-formed.
    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_of_birth, "%Y-%m-%d").ok()
    }

    /// Last 4 digits of the card number, when at least 4 are available.
    pub fn card_last4(&self) -> Option<String> {
        let chars: Vec<char> = self.credit_card_number.trim().chars().collect();
        if chars.len() >= 4 {
            Some(chars[chars.len() - 4..].iter().collect())
        } else {
            None
        }
    }
}
