//! ArchivesSpace API access
//!
//! `client` speaks HTTP and holds the session, `models` builds and reads the
//! JSON records, and `accession` combines them into an `AccessionClient`.

pub mod accession;
pub mod client;
pub mod error;
pub mod models;

pub use accession::ArchivesSpaceAccessioner;
pub use client::ArchivesSpaceClient;
pub use error::ApiError;
