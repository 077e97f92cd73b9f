//! cardmail-ingest: IMAP mailbox scanning and MIME message decomposition.

pub mod mime;
pub mod scanner;
pub mod types;

pub use mime::parse_message;
pub use scanner::{ImapSettings, MailboxScanner, ScanError, SearchSettings};
pub use types::{EmailAttachment, FetchedEmail};
