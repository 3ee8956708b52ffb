//! Demuxer options.

use serde::{Deserialize, Serialize};

/// Options accepted by the composition demuxer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemuxerOptions {
    /// Comma-separated paths or URLs of asset map documents. When absent,
    /// the `ASSETMAP.xml` in the same directory as the CPL is used.
    #[serde(rename = "assetmaps")]
    pub asset_maps: Option<String>,
}

impl DemuxerOptions {
    /// Split the configured paths, or produce the given default.
    pub fn asset_map_paths(&self, default: String) -> Vec<String> {
        match &self.asset_maps {
            Some(paths) => paths
                .split(',')
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect(),
            None => vec![default],
        }
    }
}
