//! `imf-demux` — Demuxes an IMF Composition.
//!
//! Given the URL of a Composition Playlist (SMPTE ST 2067-3), this crate
//! reconstructs a playable multi-stream timeline: asset maps (SMPTE ST
//! 429-9) resolve track-file UUIDs to container URIs, each virtual track
//! is expanded into runtime resources, and a pull-based scheduler
//! interleaves packets across tracks by smallest composition clock,
//! rewriting timestamps into the composition timeline.
//!
//! Container access is delegated to the host media framework through the
//! seams in `imf-common` (`ContainerOpener`, `ChildDemuxer`,
//! `DocumentIo`); this crate never touches essence bytes itself.
//!
//! # Usage
//!
//! ```rust,ignore
//! use imf_common::{DemuxerOptions, ImfError, Interrupt};
//! use imf_demux::{CompositionDemuxer, FsDocumentIo};
//!
//! let mut demuxer = CompositionDemuxer::open(
//!     "/package/CPL_81bacd63.xml",
//!     &DemuxerOptions::default(),
//!     &FsDocumentIo,
//!     opener,
//!     Interrupt::new(),
//! )?;
//! loop {
//!     match demuxer.read_packet() {
//!         Ok(pkt) => handle(pkt),
//!         Err(ImfError::Eof) => break,
//!         Err(e) => return Err(e),
//!     }
//! }
//! ```

pub mod demuxer;
pub mod io;
pub mod probe;
pub mod resource;
pub mod track;

// Re-export primary API
pub use demuxer::CompositionDemuxer;
pub use io::{read_document, FsDocumentIo};
pub use resource::ResourcePlayback;
pub use track::TrackPlayback;
