//! Currency string normalization

use regex::Regex;
use std::sync::OnceLock;

fn rupee_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)rs\.?").expect("invalid rupee prefix regex"))
}

fn currency_noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[₹$€£,\s]").expect("invalid currency noise regex"))
}

fn non_numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d.]").expect("invalid numeric filter regex"))
}

/// Parse an amount out of a currency string as banks format them, e.g.
/// `"Rs. 6,225.00"`, `"₹1,234.56"`, or `"6225"`.
///
/// Currency markers, thousands separators, and whitespace are removed
/// while the decimal point is kept, so `"Rs. 6,225.00"` yields `6225.0`
/// rather than a separator-mangled figure. A second, digits-and-dots-only
/// pass recovers amounts embedded in label text. Returns `None` when no
/// number can be read out.
pub fn normalize_amount(raw: &str) -> Option<f64> {
    let stripped = rupee_prefix_re().replace_all(raw, "");
    let cleaned = currency_noise_re().replace_all(&stripped, "");
    if let Ok(value) = cleaned.parse::<f64>() {
        return Some(value);
    }

    let digits_only = non_numeric_re().replace_all(raw, "");
    digits_only.parse::<f64>().ok()
}
