//! Runtime resource contexts — one per expanded repeat of a declared
//! track-file resource, each owning at most one child demuxer.

use imf_common::{ChildDemuxer, ContainerOpener, ImfError, ImfResult, Rational, MICROSECONDS};
use imf_cpl::{AssetLocator, TrackFileResource};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Playback state for a single expanded resource. Repeat copies share the
/// declared resource through the `Arc` but hold independent demuxers.
pub struct ResourcePlayback {
    pub locator: AssetLocator,
    pub resource: Arc<TrackFileResource>,
    demuxer: Option<Box<dyn ChildDemuxer>>,
}

impl ResourcePlayback {
    pub fn new(locator: AssetLocator, resource: Arc<TrackFileResource>) -> Self {
        Self {
            locator,
            resource,
            demuxer: None,
        }
    }

    /// Open the child demuxer at the resource's entry point. A no-op when
    /// a demuxer is already open.
    pub fn open(&mut self, opener: &dyn ContainerOpener) -> ImfResult<()> {
        if self.demuxer.is_some() {
            debug!(uri = %self.locator.absolute_uri, "input context already opened");
            return Ok(());
        }

        let mut child = opener.open(&self.locator.absolute_uri).map_err(|e| {
            error!(uri = %self.locator.absolute_uri, error = %e, "could not open input context");
            e
        })?;

        let base = &self.resource.base;
        let first_stream = child.streams().first().ok_or_else(|| {
            ImfError::invalid(format!(
                "container has no streams: {}",
                self.locator.absolute_uri
            ))
        })?;
        // A mismatch hints at a media/playlist disagreement but is tolerated.
        let time_base = first_stream.time_base.normalized();
        if time_base != base.edit_rate.inv() {
            warn!(
                time_base = %time_base,
                edit_rate = %base.edit_rate,
                uri = %self.locator.absolute_uri,
                "source stream time base does not match resource edit rate"
            );
        }

        let entry_point_us = entry_point_microseconds(base.entry_point, base.edit_rate)?;
        if entry_point_us > 0 {
            debug!(
                uri = %self.locator.absolute_uri,
                entry_point = base.entry_point,
                "seeking to resource entry point"
            );
            child.seek_to(entry_point_us).map_err(|e| {
                error!(
                    uri = %self.locator.absolute_uri,
                    timestamp_us = entry_point_us,
                    error = %e,
                    "could not seek to entry point"
                );
                e
            })?;
        }

        self.demuxer = Some(child);
        Ok(())
    }

    /// Drop the child demuxer, if any. Reopening seeks the entry point
    /// again.
    pub fn close(&mut self) {
        self.demuxer = None;
    }

    pub fn is_open(&self) -> bool {
        self.demuxer.is_some()
    }

    pub fn demuxer(&self) -> Option<&dyn ChildDemuxer> {
        self.demuxer.as_deref()
    }

    pub fn demuxer_mut(&mut self) -> Option<&mut (dyn ChildDemuxer + '_)> {
        self.demuxer
            .as_mut()
            .map(|d| &mut **d as &mut (dyn ChildDemuxer + '_))
    }
}

/// Entry point converted from edit units to microseconds.
fn entry_point_microseconds(entry_point: u64, edit_rate: Rational) -> ImfResult<i64> {
    let us = entry_point as i128 * edit_rate.den as i128 * MICROSECONDS as i128
        / edit_rate.num as i128;
    i64::try_from(us)
        .map_err(|_| ImfError::invalid(format!("entry point overflows: {entry_point}")))
}
