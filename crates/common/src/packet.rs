//! Packets and stream descriptions — the data flowing between child
//! demuxers, the scheduler, and the caller.

use crate::types::Rational;
use serde::{Deserialize, Serialize};

/// A demuxed packet. Timestamps and duration are in ticks of the owning
/// stream's time base.
#[derive(Clone, Debug, Default)]
pub struct Packet {
    /// Compressed payload.
    pub data: Vec<u8>,
    /// Presentation timestamp.
    pub pts: i64,
    /// Decode timestamp.
    pub dts: i64,
    /// Duration in time-base ticks.
    pub duration: i64,
    /// Index of the stream this packet belongs to.
    pub stream_index: u32,
}

/// Kind of media stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// Codec parameters, copied opaquely from a child stream to the matching
/// output stream.
#[derive(Clone, Debug, PartialEq)]
pub struct CodecParameters {
    pub kind: MediaKind,
    /// Codec name as reported by the host framework (e.g., "jpeg2000").
    pub codec_name: String,
    /// Video dimensions; zero for audio.
    pub width: u32,
    pub height: u32,
    /// Audio layout; zero for video.
    pub sample_rate: u32,
    pub channels: u16,
    /// Codec-specific configuration data.
    pub extra_data: Vec<u8>,
}

impl CodecParameters {
    pub fn video(codec_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            kind: MediaKind::Video,
            codec_name: codec_name.into(),
            width,
            height,
            sample_rate: 0,
            channels: 0,
            extra_data: Vec::new(),
        }
    }

    pub fn audio(codec_name: impl Into<String>, sample_rate: u32, channels: u16) -> Self {
        Self {
            kind: MediaKind::Audio,
            codec_name: codec_name.into(),
            width: 0,
            height: 0,
            sample_rate,
            channels,
            extra_data: Vec::new(),
        }
    }
}

/// Description of one stream inside an opened container.
#[derive(Clone, Debug)]
pub struct StreamInfo {
    /// Tick length of this stream's timestamps. Need not be in canonical
    /// form; the demuxer normalizes it on intake.
    pub time_base: Rational,
    pub codec: CodecParameters,
}

/// One published output stream of the composition, image first then audio
/// tracks in declaration order.
#[derive(Clone, Debug)]
pub struct OutputStream {
    /// Equals the virtual track index.
    pub id: u32,
    /// Inherited from the first resource's first stream.
    pub time_base: Rational,
    pub codec: CodecParameters,
    /// Track duration expressed in `time_base` ticks.
    pub duration: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_parameter_constructors() {
        let v = CodecParameters::video("jpeg2000", 1920, 1080);
        assert_eq!(v.kind, MediaKind::Video);
        assert_eq!(v.width, 1920);
        assert_eq!(v.sample_rate, 0);

        let a = CodecParameters::audio("pcm_s24le", 48000, 6);
        assert_eq!(a.kind, MediaKind::Audio);
        assert_eq!(a.sample_rate, 48000);
        assert_eq!(a.width, 0);
    }

    #[test]
    fn packet_default_is_empty() {
        let pkt = Packet::default();
        assert!(pkt.data.is_empty());
        assert_eq!(pkt.duration, 0);
    }
}
