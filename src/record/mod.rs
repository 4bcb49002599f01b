//! RECORD file parsing, hashing and rewriting for Python wheels

mod rewrite;
mod types;

pub use rewrite::rewrite_record;
pub use types::Record;
pub use types::RecordEntry;
pub use types::hash_content;
pub use types::verify_digest;
