//! `imf-cpl` — Composition Playlist and Asset Map parsing for the IMF
//! composition demuxer.
//!
//! This crate turns the two declarative documents of an IMF package into
//! typed entities:
//!
//! - **Scalar readers**: UUID / rational / unsigned-integer element parsing
//! - **Model**: `Composition`, virtual tracks, resources, markers
//! - **CPL parser**: SMPTE ST 2067-3 `CompositionPlaylist` documents
//! - **Asset maps**: SMPTE ST 429-9 `AssetMap` documents merged into a
//!   UUID → URI lookup table
//!
//! Element matching is by local name; namespaces are ignored. Unknown
//! elements at extension points are skipped for forward compatibility.

pub mod assetmap;
pub mod model;
pub mod parser;
pub mod scalar;

// Re-export primary API
pub use assetmap::{AssetLocator, AssetLocatorMap};
pub use model::{
    BaseResource, Composition, Marker, MarkerResource, MarkerVirtualTrack, TrackFileResource,
    TrackFileVirtualTrack, DEFAULT_MARKER_SCOPE,
};
pub use parser::{parse_cpl, parse_cpl_document};
