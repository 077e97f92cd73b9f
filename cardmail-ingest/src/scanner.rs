//! IMAP mailbox scanning for statement mails

use crate::mime::parse_message;
use crate::types::FetchedEmail;
use anyhow::Result;
use imap::Session;
use native_tls::{TlsConnector, TlsStream};
use std::net::TcpStream;
use thiserror::Error;

/// Where and how to log in.
#[derive(Debug, Clone)]
pub struct ImapSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// What to look for once connected.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub subject_keywords: Vec<String>,
    /// Newest messages kept per run.
    pub max_emails: usize,
}

/// Fatal scan failures. Per-message fetch problems are logged and
/// skipped instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IMAP credentials are not configured")]
    MissingCredentials,
    #[error("TLS setup failed")]
    Tls(#[from] native_tls::Error),
    #[error("could not connect to {host}:{port}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: imap::Error,
    },
    #[error("login rejected for {username}")]
    Auth {
        username: String,
        #[source]
        source: imap::Error,
    },
    #[error("could not select INBOX")]
    Select(#[source] imap::Error),
    #[error("subject search failed")]
    Search(#[source] imap::Error),
}

/// One logged-in IMAP session over TLS.
pub struct MailboxScanner {
    session: Session<TlsStream<TcpStream>>,
}

impl MailboxScanner {
    pub fn connect(settings: &ImapSettings) -> Result<Self, ScanError> {
        if settings.username.is_empty() || settings.password.is_empty() {
            return Err(ScanError::MissingCredentials);
        }

        let tls = TlsConnector::builder().build()?;
        let client = imap::connect(
            (settings.host.as_str(), settings.port),
            settings.host.as_str(),
            &tls,
        )
        .map_err(|source| ScanError::Connect {
            host: settings.host.clone(),
            port: settings.port,
            source,
        })?;

        log::info!("connected to {}:{}", settings.host, settings.port);
        let session = client
            .login(&settings.username, &settings.password)
            .map_err(|(source, _)| ScanError::Auth {
                username: settings.username.clone(),
                source,
            })?;

        Ok(MailboxScanner { session })
    }

    /// Search INBOX by subject and fetch the newest matches, most
    /// recent first. A message that fails to fetch or parse is warned
    /// about and skipped.
    pub fn scan(&mut self, search: &SearchSettings) -> Result<Vec<FetchedEmail>, ScanError> {
        self.session.select("INBOX").map_err(ScanError::Select)?;

        let query = build_subject_query(&search.subject_keywords);
        log::debug!("subject search: {query}");
        let matched = self
            .session
            .uid_search(&query)
            .map_err(ScanError::Search)?;

        let uids: Vec<u32> = matched.iter().copied().collect();
        let selected = select_recent(uids, search.max_emails);
        log::info!(
            "{} message(s) matched; fetching the {} most recent",
            matched.len(),
            selected.len()
        );

        let mut emails = Vec::with_capacity(selected.len());
        for uid in selected {
            match self.fetch_message(uid) {
                Ok(Some(email)) => emails.push(email),
                Ok(None) => log::warn!("uid {uid} returned no body; skipping"),
                Err(err) => log::warn!("failed to fetch uid {uid}: {err:#}"),
            }
        }
        Ok(emails)
    }

    fn fetch_message(&mut self, uid: u32) -> Result<Option<FetchedEmail>> {
        // BODY.PEEK keeps the message unread
        let fetches = self
            .session
            .uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")?;
        let Some(fetch) = fetches.iter().next() else {
            return Ok(None);
        };
        let Some(raw) = fetch.body() else {
            return Ok(None);
        };
        parse_message(uid, raw).map(Some)
    }

    /// Close the session. Failures here only cost us politeness.
    pub fn logout(&mut self) {
        if let Err(err) = self.session.logout() {
            log::debug!("imap logout failed: {err}");
        }
    }
}

/// Build the `UID SEARCH` criteria for a keyword list. IMAP `OR` takes
/// exactly two operands, so multiple keywords right-fold into a nested
/// chain. An empty list falls back to a generic statement search.
pub fn build_subject_query(keywords: &[String]) -> String {
    let terms: Vec<String> = keywords
        .iter()
        .filter(|kw| !kw.trim().is_empty())
        .map(|kw| format!("SUBJECT \"{}\"", escape_quoted(kw)))
        .collect();

    if terms.is_empty() {
        log::warn!("no subject keywords configured; using the generic statement search");
        let fallback = vec!["statement".to_string(), "e-statement".to_string()];
        return build_subject_query(&fallback);
    }
    if terms.len() == 1 {
        return terms.into_iter().next().unwrap_or_default();
    }

    let mut chain = terms[terms.len() - 1].clone();
    for term in terms[..terms.len() - 1].iter().rev() {
        chain = format!("OR {term} {chain}");
    }
    format!("({chain})")
}

fn escape_quoted(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Keep the newest `max` UIDs, newest first. UIDs are assigned in
/// ascending order, so recency is just numeric order.
pub fn select_recent(mut uids: Vec<u32>, max: usize) -> Vec<u32> {
    uids.sort_unstable();
    uids.iter().rev().take(max).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_keyword_query() {
        assert_eq!(
            build_subject_query(&keywords(&["e-statement"])),
            "SUBJECT \"e-statement\""
        );
    }

    #[test]
    fn test_two_keywords_nest_one_or() {
        assert_eq!(
            build_subject_query(&keywords(&["credit card statement", "e-statement"])),
            "(OR SUBJECT \"credit card statement\" SUBJECT \"e-statement\")"
        );
    }

    #[test]
    fn test_many_keywords_right_fold() {
        assert_eq!(
            build_subject_query(&keywords(&["a", "b", "c"])),
            "(OR SUBJECT \"a\" OR SUBJECT \"b\" SUBJECT \"c\")"
        );
    }

    #[test]
    fn test_empty_list_falls_back() {
        assert_eq!(
            build_subject_query(&[]),
            "(OR SUBJECT \"statement\" SUBJECT \"e-statement\")"
        );
        // blank entries do not count either
        assert_eq!(
            build_subject_query(&keywords(&["", "  "])),
            "(OR SUBJECT \"statement\" SUBJECT \"e-statement\")"
        );
    }

    #[test]
    fn test_quotes_and_backslashes_escaped() {
        assert_eq!(
            build_subject_query(&keywords(&["say \"hi\"\\now"])),
            "SUBJECT \"say \\\"hi\\\"\\\\now\""
        );
    }

    #[test]
    fn test_select_recent_caps_and_orders_newest_first() {
        assert_eq!(select_recent(vec![5, 9, 12], 2), vec![12, 9]);
        // the oldest uid is never selected, hence never fetched
        assert!(!select_recent(vec![5, 9, 12], 2).contains(&5));
    }

    #[test]
    fn test_select_recent_sorts_unordered_input() {
        assert_eq!(select_recent(vec![9, 12, 5], 10), vec![12, 9, 5]);
    }

    #[test]
    fn test_select_recent_zero_cap() {
        assert!(select_recent(vec![1, 2, 3], 0).is_empty());
    }
}
