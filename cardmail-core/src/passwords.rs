//! Candidate passwords for protected statement PDFs
//!
//! Indian card issuers commonly lock statement PDFs with a password
//! derived from the holder's name, date of birth, and card number.
//! This module enumerates the usual schemes from whatever profile
//! fields are available.

use crate::pii::UserPii;

/// Build the ordered, de-duplicated list of candidate passwords for a
/// profile. Patterns whose inputs are missing are skipped without
/// comment; an unparseable date of birth skips the date-based patterns
/// with a warning. Candidates themselves are never logged.
pub fn generate_candidates(pii: &UserPii) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    if pii.full_name.trim().is_empty() || pii.date_of_birth.trim().is_empty() {
        log::warn!("full name or date of birth missing; password coverage will be limited");
    }

    // issuers emboss the first name, so the stem comes from the first token
    let first_name = pii
        .full_name
        .to_lowercase()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    let name_lower: String = first_name.chars().take(4).collect();
    let name_upper = name_lower.to_uppercase();

    // dd, mm, yy, yyyy from the date of birth, when it parses
    let date_parts = if pii.date_of_birth.trim().is_empty() {
        None
    } else {
        match pii.date_of_birth() {
            Some(dob) => Some((
                dob.format("%d").to_string(),
                dob.format("%m").to_string(),
                dob.format("%y").to_string(),
                dob.format("%Y").to_string(),
            )),
            None => {
                log::warn!("date of birth did not parse; skipping date-based password patterns");
                None
            }
        }
    };

    // Issuers use the last four card digits; a shorter configured
    // value is taken whole.
    let card = pii.credit_card_number.trim();
    let card_chars: Vec<char> = card.chars().collect();
    let card_tail: String = if card_chars.len() >= 4 {
        card_chars[card_chars.len() - 4..].iter().collect()
    } else {
        card.to_string()
    };

    if !name_upper.is_empty() && card_tail.chars().count() == 4 {
        push_unique(&mut candidates, format!("{name_upper}{card_tail}"));
    }
    if let Some((dd, mm, yy, _)) = &date_parts {
        if !name_upper.is_empty() {
            push_unique(&mut candidates, format!("{name_upper}{dd}{mm}"));
            push_unique(&mut candidates, format!("{name_lower}{dd}{mm}"));
            push_unique(&mut candidates, format!("{name_lower}{dd}{mm}{yy}"));
        }
    }
    if !name_lower.is_empty() && !card_tail.is_empty() {
        push_unique(&mut candidates, format!("{name_lower}{card_tail}"));
        push_unique(&mut candidates, format!("{name_upper}{card_tail}"));
    }
    if let Some((dd, mm, yy, yyyy)) = &date_parts {
        push_unique(&mut candidates, format!("{dd}{mm}{yy}"));
        push_unique(&mut candidates, format!("{dd}{mm}{yyyy}"));
    }

    log::debug!("generated {} password candidate(s)", candidates.len());
    candidates
}

fn push_unique(list: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !list.contains(&candidate) {
        list.push(candidate);
    }
}
