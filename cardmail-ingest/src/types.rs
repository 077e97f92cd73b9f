/// A PDF attachment lifted out of a message, transfer encoding undone.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// One fetched message, decomposed into the pieces extraction works on.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedEmail {
    pub uid: u32,
    pub subject: String,
    pub sender: String,
    /// Raw Date header value, kept as sent.
    pub date: String,
    /// Concatenated text of every inline text part, HTML flattened.
    pub body_text: String,
    pub attachments: Vec<EmailAttachment>,
}
