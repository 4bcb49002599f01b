//! wheelfork: republish Python release artifacts under a forked name
//!
//! Downloads the wheels and sdists of an upstream release, rewrites the
//! package name, one renamed dependency and the RECORD digests, injects fresh
//! copies of a few tracked source files, and renames everything to the fork.
//!
//! # Example
//!
//! ```no_run
//! use wheelfork::ForkConfig;
//! use wheelfork::NativeArchiver;
//! use wheelfork::WheelPatcher;
//!
//! let config = ForkConfig::default();
//! let patcher = WheelPatcher::new(&config, &NativeArchiver);
//! patcher
//!     .patch("dist/pythonmonkey-1.0.0-cp312-cp312-manylinux_2_31_x86_64.whl".as_ref())
//!     .unwrap();
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod name;
pub mod record;
pub mod sdist;
pub mod wheel;

pub use archive::ArchiveTransformer;
pub use archive::CommandArchiver;
pub use archive::NativeArchiver;
pub use config::DigestEncoding;
pub use config::ForkConfig;
pub use error::PatchError;
pub use error::RecordError;
pub use error::ValidationError;
pub use error::ValidationResult;
pub use fetch::ArtifactKind;
pub use fetch::Channel;
pub use fetch::Driver;
pub use fetch::PatchedArtifact;
pub use metadata::rewrite_metadata;
pub use name::fork_name;
pub use name::normalize_dist_info_name;
pub use name::strip_local_version;
pub use record::Record;
pub use record::RecordEntry;
pub use record::hash_content;
pub use record::rewrite_record;
pub use record::verify_digest;
pub use sdist::SdistPatcher;
pub use sdist::rewrite_pyproject;
pub use wheel::WheelPatcher;
pub use wheel::WheelReader;
pub use wheel::verify_patched;
