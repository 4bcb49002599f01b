//! METADATA / PKG-INFO rewriting

mod rewrite;

pub use rewrite::rewrite_metadata;
