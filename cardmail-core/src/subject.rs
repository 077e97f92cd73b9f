//! Subject-line cleanup for logging and matching

/// Forwarding prefixes mail clients prepend to subjects.
pub fn default_subject_prefixes() -> Vec<String> {
    vec!["fwd:".to_string(), "re:".to_string(), "fw:".to_string()]
}

/// Lowercase a subject and peel configured prefixes off the front.
/// Each prefix is removed at most once, in list order, so a
/// forwarded reply sheds both markers while `"re: re: x"` keeps one.
pub fn strip_subject_prefixes(subject: &str, prefixes: &[String]) -> String {
    let mut current = subject.to_lowercase();
    for prefix in prefixes {
        if let Some(rest) = current.strip_prefix(prefix.as_str()) {
            current = rest.trim().to_string();
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_reply_sheds_both_markers() {
        let prefixes = default_subject_prefixes();
        assert_eq!(
            strip_subject_prefixes("Fwd: Re: Your Statement", &prefixes),
            "your statement"
        );
    }

    #[test]
    fn test_repeated_prefix_stripped_once() {
        let prefixes = default_subject_prefixes();
        assert_eq!(strip_subject_prefixes("re: re: hello", &prefixes), "re: hello");
    }

    #[test]
    fn test_plain_subject_is_lowercased_only() {
        let prefixes = default_subject_prefixes();
        assert_eq!(
            strip_subject_prefixes("HDFC Bank e-Statement", &prefixes),
            "hdfc bank e-statement"
        );
    }

    #[test]
    fn test_empty_subject() {
        assert_eq!(strip_subject_prefixes("", &default_subject_prefixes()), "");
    }
}
