//! Composition data model: resources, virtual tracks, and the composition
//! itself, as declared by a CPL document.

use imf_common::Rational;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label scope applied to a `Marker` whose `Label` carries no `scope`
/// attribute (SMPTE ST 2067-3 standard markers).
pub const DEFAULT_MARKER_SCOPE: &str =
    "http://www.smpte-ra.org/schemas/2067-3/2013#standard-markers";

/// Timing fields shared by every resource kind. `entry_point` and
/// `duration` are counts of edit units at `edit_rate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseResource {
    pub edit_rate: Rational,
    pub entry_point: u64,
    pub duration: u64,
    /// Number of times the resource plays back to back (at least 1).
    pub repeat_count: u64,
}

impl BaseResource {
    /// Length of one edit unit, in seconds.
    pub fn edit_unit(&self) -> Rational {
        self.edit_rate.inv()
    }
}

/// A timed reference into an essence container file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackFileResource {
    pub base: BaseResource,
    /// Identifies the source container; resolved through the asset map.
    pub track_file_uuid: Uuid,
}

/// A labeled instant within a marker resource's timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub label: String,
    pub scope: String,
    /// Position in edit units of the containing resource.
    pub offset: u64,
}

/// A timed run of markers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerResource {
    pub base: BaseResource,
    pub markers: Vec<Marker>,
}

/// A virtual track composed of track-file resources, in playback order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackFileVirtualTrack {
    pub id: Uuid,
    pub resources: Vec<TrackFileResource>,
}

/// A virtual track composed of marker resources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerVirtualTrack {
    pub id: Uuid,
    pub resources: Vec<MarkerResource>,
}

/// A parsed Composition Playlist: at most one marker track, at most one 2D
/// image track, and any number of audio tracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub id: Uuid,
    pub content_title: String,
    /// Composition edit rate, also the default for resources that declare
    /// none of their own.
    pub edit_rate: Rational,
    pub markers: Option<MarkerVirtualTrack>,
    pub image_2d: Option<TrackFileVirtualTrack>,
    pub audios: Vec<TrackFileVirtualTrack>,
}
