//! Virtual track playback state and its builder: declared resources are
//! expanded by repeat count into independent runtime contexts and the
//! total track duration is accumulated in composition seconds.

use crate::resource::ResourcePlayback;
use imf_common::{ContainerOpener, ImfError, ImfResult, Rational};
use imf_cpl::{AssetLocatorMap, BaseResource, TrackFileVirtualTrack};
use std::sync::Arc;
use tracing::{debug, error};

/// Per-track playback state. `current_timestamp` advances monotonically
/// from zero to `duration`, both in composition seconds.
pub struct TrackPlayback {
    /// Output stream index (image first, then audio tracks in declaration
    /// order).
    pub index: u32,
    pub current_timestamp: Rational,
    pub duration: Rational,
    /// Expanded resources in playback order.
    pub resources: Vec<ResourcePlayback>,
    pub current_resource_index: usize,
    /// Sum of emitted packet durations, in output time-base ticks.
    pub last_pts: i64,
    /// Running decode timestamp of the output stream (last emitted DTS
    /// plus duration), used to smooth resource-boundary regressions.
    pub cur_dts: i64,
}

impl TrackPlayback {
    /// Expand a declared virtual track into playback state. Only the first
    /// runtime resource is opened here; the rest open on activation.
    pub fn build(
        index: u32,
        declared: &TrackFileVirtualTrack,
        assets: &AssetLocatorMap,
        opener: &dyn ContainerOpener,
    ) -> ImfResult<Self> {
        let mut track = TrackPlayback {
            index,
            current_timestamp: Rational::ZERO,
            duration: Rational::ZERO,
            resources: Vec::new(),
            current_resource_index: 0,
            last_pts: 0,
            cur_dts: 0,
        };

        for resource in &declared.resources {
            let locator = assets.locator(&resource.track_file_uuid).ok_or_else(|| {
                error!(uuid = %resource.track_file_uuid, "no asset locator for track file");
                ImfError::invalid(format!(
                    "no asset locator for UUID {}",
                    resource.track_file_uuid
                ))
            })?;
            debug!(
                uuid = %resource.track_file_uuid,
                uri = %locator.absolute_uri,
                repeat_count = resource.base.repeat_count,
                "expanding track file resource"
            );

            let copy_duration = resource_duration_seconds(&resource.base)?;
            let repeats = usize::try_from(resource.base.repeat_count)
                .map_err(|_| ImfError::invalid("repeat count overflows"))?;
            let shared = Arc::new(resource.clone());
            for _ in 0..repeats {
                track
                    .resources
                    .push(ResourcePlayback::new(locator.clone(), Arc::clone(&shared)));
                track.duration = track.duration.add(copy_duration);
            }
        }

        if let Some(first) = track.resources.first_mut() {
            first.open(opener)?;
        }

        debug!(
            index,
            resources = track.resources.len(),
            duration_secs = track.duration.as_f64(),
            "built virtual track"
        );

        Ok(track)
    }

    /// True once the composition clock has consumed the whole track.
    pub fn is_exhausted(&self) -> bool {
        self.current_timestamp == self.duration
    }
}

/// Duration of one playback of a resource, in seconds.
fn resource_duration_seconds(base: &BaseResource) -> ImfResult<Rational> {
    let units = i64::try_from(base.duration)
        .map_err(|_| ImfError::invalid(format!("resource duration overflows: {}", base.duration)))?;
    Ok(base.edit_unit().scaled(units))
}
