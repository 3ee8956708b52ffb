//! Seams to the host media framework: child demuxer construction, packet
//! reading, document byte streams, and cooperative cancellation.

use crate::error::ImfResult;
use crate::packet::{Packet, StreamInfo};
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Microseconds per second, the unit of [`ChildDemuxer::seek_to`].
pub const MICROSECONDS: i64 = 1_000_000;

/// An opened container, positioned within a single track-file resource.
///
/// Implementations are supplied by the host framework; the composition
/// demuxer only pulls packets and seeks.
pub trait ChildDemuxer {
    /// Streams discovered when the container was opened.
    fn streams(&self) -> &[StreamInfo];

    /// Read the next packet, or `Err(Eof)` when the container is exhausted.
    fn read_packet(&mut self) -> ImfResult<Packet>;

    /// Seek to the exact microsecond offset. Both seek bounds are pinned to
    /// the target, so the position is not constrained to keyframes.
    fn seek_to(&mut self, timestamp_us: i64) -> ImfResult<()>;
}

/// Factory for child demuxers. Opening acquires full stream information.
pub trait ContainerOpener {
    fn open(&self, uri: &str) -> ImfResult<Box<dyn ChildDemuxer>>;
}

/// Byte-stream access for XML documents (the CPL and asset maps).
pub trait DocumentIo {
    fn open(&self, url: &str) -> ImfResult<Box<dyn Read>>;
}

/// Cooperative cancellation flag, polled once per packet-read attempt.
///
/// Clones share the same flag, so the host keeps one handle and the
/// demuxer another.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. The next read attempt reports `Eof`.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
