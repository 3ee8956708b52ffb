//! `imf-common` — Shared types, traits, and errors for the IMF composition
//! demuxer.
//!
//! This crate is the foundation the parsing and playback crates depend on.
//! It defines the core abstractions:
//!
//! - **Types**: `Rational` (exact clock arithmetic)
//! - **Packets**: `Packet`, `StreamInfo`, `CodecParameters`, `OutputStream`
//! - **Host seams**: `ChildDemuxer`, `ContainerOpener`, `DocumentIo`,
//!   `Interrupt` (supplied by the host media framework)
//! - **Errors**: `ImfError`, `ImfResult` (thiserror-based)
//! - **Options**: `DemuxerOptions`
//! - **URIs**: classification and joining helpers for asset resolution

pub mod config;
pub mod error;
pub mod packet;
pub mod traits;
pub mod types;
pub mod uri;

// Re-export commonly used items at crate root
pub use config::DemuxerOptions;
pub use error::{ImfError, ImfResult};
pub use packet::{CodecParameters, MediaKind, OutputStream, Packet, StreamInfo};
pub use traits::{ChildDemuxer, ContainerOpener, DocumentIo, Interrupt, MICROSECONDS};
pub use types::Rational;
