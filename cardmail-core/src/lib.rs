//! cardmail-core: core types and pure logic for the statement pipeline

pub mod amounts;
pub mod passwords;
pub mod pii;
pub mod record;
pub mod subject;

pub use amounts::normalize_amount;
pub use passwords::generate_candidates;
pub use pii::UserPii;
pub use record::{RecordSource, StatementRecord, StatementResult};
pub use subject::{default_subject_prefixes, strip_subject_prefixes};
