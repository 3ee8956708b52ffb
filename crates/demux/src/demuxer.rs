//! The composition demuxer: opens an IMF package from its CPL URL and
//! plays the virtual tracks back as one interleaved packet stream.
//!
//! Scheduling is pull-based: every read serves the track whose composition
//! clock is smallest, locating the active resource within it and rewriting
//! the child packet's timestamps into the composition timeline. The core
//! is single-threaded; the only suspension points are the host's blocking
//! reads, interruptible through [`Interrupt`].

use crate::io::read_document;
use crate::track::TrackPlayback;
use imf_common::{
    uri, ContainerOpener, DemuxerOptions, DocumentIo, ImfError, ImfResult, Interrupt,
    OutputStream, Packet,
};
use imf_cpl::{parse_cpl, AssetLocatorMap, Composition};
use tracing::{debug, error};

/// Default asset map file name, resolved next to the CPL.
const DEFAULT_ASSET_MAP_NAME: &str = "ASSETMAP.xml";

/// A demuxer over one IMF composition.
///
/// Constructed by [`open`](CompositionDemuxer::open); packets are pulled
/// with [`read_packet`](CompositionDemuxer::read_packet) until it returns
/// [`ImfError::Eof`]. All owned state, including child demuxers, is
/// released on drop.
pub struct CompositionDemuxer {
    composition: Composition,
    assets: AssetLocatorMap,
    tracks: Vec<TrackPlayback>,
    streams: Vec<OutputStream>,
    opener: Box<dyn ContainerOpener>,
    interrupt: Interrupt,
}

impl std::fmt::Debug for CompositionDemuxer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionDemuxer")
            .field("composition", &self.composition)
            .field("assets", &self.assets)
            .field("streams", &self.streams)
            .field("interrupt", &self.interrupt)
            .finish_non_exhaustive()
    }
}

impl CompositionDemuxer {
    /// Open a composition: read and parse the CPL, merge the asset maps,
    /// expand every virtual track, and publish the output streams.
    ///
    /// On failure all partially built state is released.
    pub fn open(
        url: &str,
        options: &DemuxerOptions,
        io: &dyn DocumentIo,
        opener: Box<dyn ContainerOpener>,
        interrupt: Interrupt,
    ) -> ImfResult<Self> {
        debug!(url, "start parsing IMF CPL");
        let cpl_text = read_document(io, url)?;
        let composition = parse_cpl(&cpl_text)?;
        debug!(id = %composition.id, "parsed IMF CPL");

        let base_url = uri::url_dirname(url);
        if options.asset_maps.is_none() {
            debug!("no asset maps provided, using the default ASSETMAP.xml");
        }
        let default_map = uri::join_url(base_url, DEFAULT_ASSET_MAP_NAME);

        let mut assets = AssetLocatorMap::new();
        for path in options.asset_map_paths(default_map) {
            debug!(path, "start parsing IMF asset map");
            let text = read_document(io, &path)?;
            assets.merge_document(&text, uri::url_dirname(&path))?;
            debug!(path, assets = assets.len(), "parsed IMF asset map");
        }

        let mut tracks = Vec::new();
        if let Some(image) = &composition.image_2d {
            tracks.push(TrackPlayback::build(
                tracks.len() as u32,
                image,
                &assets,
                opener.as_ref(),
            )?);
        }
        for audio in &composition.audios {
            tracks.push(TrackPlayback::build(
                tracks.len() as u32,
                audio,
                &assets,
                opener.as_ref(),
            )?);
        }

        let streams = tracks
            .iter()
            .map(publish_stream)
            .collect::<ImfResult<Vec<_>>>()?;

        debug!(tracks = tracks.len(), "parsed IMF package");

        Ok(CompositionDemuxer {
            composition,
            assets,
            tracks,
            streams,
            opener,
            interrupt,
        })
    }

    /// The parsed composition playlist.
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The merged asset locator table.
    pub fn asset_locators(&self) -> &AssetLocatorMap {
        &self.assets
    }

    /// Published output streams, image first then audio tracks in
    /// declaration order. A marker-only composition publishes none.
    pub fn streams(&self) -> &[OutputStream] {
        &self.streams
    }

    /// Read the next packet of the composition, taken from the track whose
    /// composition clock is currently smallest. Returns `Err(Eof)` once
    /// every track is exhausted or the host signalled an interrupt.
    pub fn read_packet(&mut self) -> ImfResult<Packet> {
        let track_index = self.next_track_index().ok_or(ImfError::Eof)?;

        // When the smallest clock has reached its duration, all clocks have.
        if self.tracks[track_index].is_exhausted() {
            return Err(ImfError::Eof);
        }

        let resource_index = self.locate_resource(track_index)?;
        self.switch_resource(track_index, resource_index)?;
        self.read_from_active(track_index)
    }

    /// Index of the track with the minimum composition clock, ties broken
    /// by ascending track index.
    fn next_track_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, track) in self.tracks.iter().enumerate() {
            debug!(
                track = track.index,
                timestamp = track.current_timestamp.as_f64(),
                duration = track.duration.as_f64(),
                "comparing track clocks"
            );
            match best {
                Some(b) if self.tracks[b].current_timestamp <= track.current_timestamp => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Find the active resource for the track's current clock: the first
    /// one whose cumulated duration covers one more edit unit of playback.
    fn locate_resource(&self, track_index: usize) -> ImfResult<usize> {
        let track = &self.tracks[track_index];
        let unit = track.resources[0].resource.base.edit_unit();
        let mut cumulated = imf_common::Rational::ZERO;

        debug!(
            track = track.index,
            timestamp = track.current_timestamp.as_f64(),
            duration = track.duration.as_f64(),
            "looking for resource"
        );
        for (i, resource) in track.resources.iter().enumerate() {
            let units = resource.resource.base.duration as i64;
            cumulated = cumulated.add(unit.scaled(units));
            if track.current_timestamp.add(unit) <= cumulated {
                debug!(
                    track = track.index,
                    resource = i,
                    cumulated = cumulated.as_f64(),
                    entry_point = resource.resource.base.entry_point,
                    "found resource to read"
                );
                return Ok(i);
            }
        }

        if track.current_timestamp.add(unit) > track.duration {
            return Err(ImfError::Eof);
        }
        error!(track = track.index, "could not find resource to read");
        Err(ImfError::StreamNotFound(format!(
            "no resource covers timestamp {} on track {}",
            track.current_timestamp, track.index
        )))
    }

    /// Activate `resource_index`, closing the previously open child
    /// demuxer if the index moved. Switching is always forward.
    fn switch_resource(&mut self, track_index: usize, resource_index: usize) -> ImfResult<()> {
        let opener = self.opener.as_ref();
        let track = &mut self.tracks[track_index];
        if resource_index != track.current_resource_index {
            debug!(
                track = track.index,
                from = track.current_resource_index,
                to = resource_index,
                "switching resource, re-opening context"
            );
            let previous = track.current_resource_index;
            track.resources[previous].close();
            track.resources[resource_index].open(opener)?;
            track.current_resource_index = resource_index;
        } else if !track.resources[resource_index].is_open() {
            track.resources[resource_index].open(opener)?;
        }
        Ok(())
    }

    /// Pull one packet from the active resource, rewriting its timestamps
    /// into the composition timeline and advancing the track clocks.
    fn read_from_active(&mut self, track_index: usize) -> ImfResult<Packet> {
        loop {
            if self.interrupt.is_interrupted() {
                return Err(ImfError::Eof);
            }

            let opener = self.opener.as_ref();
            let track = &mut self.tracks[track_index];
            let resource_index = track.current_resource_index;
            let is_final = resource_index + 1 == track.resources.len();
            let entry_point = track.resources[resource_index].resource.base.entry_point;

            let demuxer = track.resources[resource_index]
                .demuxer_mut()
                .ok_or_else(|| ImfError::invalid("active resource has no open demuxer"))?;

            match demuxer.read_packet() {
                Ok(mut pkt) => {
                    let time_base = demuxer.streams()[0].time_base.normalized();
                    debug!(
                        pts = pkt.pts,
                        dts = pkt.dts,
                        duration = pkt.duration,
                        stream_index = pkt.stream_index,
                        "got packet"
                    );

                    // Clamp boundary DTS regressions once playback started.
                    if pkt.dts < track.cur_dts && track.last_pts > 0 {
                        pkt.dts = track.cur_dts;
                    }
                    pkt.pts = track.last_pts;
                    pkt.dts -= entry_point as i64;
                    pkt.stream_index = track.index;

                    track.current_timestamp = track
                        .current_timestamp
                        .add(time_base.scaled(pkt.duration));
                    track.last_pts += pkt.duration;
                    track.cur_dts = pkt.dts + pkt.duration;

                    return Ok(pkt);
                }
                Err(ImfError::Eof) if !is_final => {
                    // The container ran out before the declared boundary;
                    // move to the next runtime resource and retry.
                    debug!(
                        track = track.index,
                        resource = resource_index,
                        "resource exhausted early, advancing"
                    );
                    track.resources[resource_index].close();
                    track.resources[resource_index + 1].open(opener)?;
                    track.current_resource_index = resource_index + 1;
                }
                Err(ImfError::Eof) => return Err(ImfError::Eof),
                Err(e) => {
                    error!(track = track.index, error = %e, "could not get packet");
                    return Err(e);
                }
            }
        }
    }
}

impl Drop for CompositionDemuxer {
    fn drop(&mut self) {
        debug!("closing IMF package");
        for track in &mut self.tracks {
            for resource in &mut track.resources {
                resource.close();
            }
        }
    }
}

/// Publish one output stream from a built track: codec parameters and time
/// base come from the first resource's first stream, the duration from the
/// track's composition duration.
fn publish_stream(track: &TrackPlayback) -> ImfResult<OutputStream> {
    let first = track
        .resources
        .first()
        .ok_or_else(|| ImfError::invalid("virtual track declares no resources"))?;
    let demuxer = first
        .demuxer()
        .ok_or_else(|| ImfError::invalid("first resource is not open"))?;
    let stream = &demuxer.streams()[0];
    // Host-supplied time bases are not guaranteed canonical
    let time_base = stream.time_base.normalized();
    debug!(track = track.index, "publishing stream from first resource");
    Ok(OutputStream {
        id: track.index,
        time_base,
        codec: stream.codec.clone(),
        duration: track.duration.div_to_integer(time_base),
    })
}
