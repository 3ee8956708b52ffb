//! Asset map parsing (SMPTE ST 429-9): builds the UUID → absolute URI
//! lookup table used to resolve track-file resources.
//!
//! A composition may span several asset maps; they merge into one
//! [`AssetLocatorMap`]. Relative paths resolve against the directory of
//! the asset map document that declared them.

use crate::scalar::{child_by_local_name, element_text, read_uuid};
use imf_common::{uri, ImfError, ImfResult};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// One resolved asset: a UUID and the absolute URI of its container file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetLocator {
    pub uuid: Uuid,
    pub absolute_uri: String,
}

/// Merged UUID → locator table across one or more asset maps.
#[derive(Debug, Default)]
pub struct AssetLocatorMap {
    assets: HashMap<Uuid, AssetLocator>,
}

impl AssetLocatorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one asset map document and merge its assets into the table.
    /// `base_url` is the directory of the asset map's own URI.
    pub fn merge_document(&mut self, xml: &str, base_url: &str) -> ImfResult<()> {
        let doc = Document::parse(xml)
            .map_err(|e| ImfError::invalid(format!("malformed asset map XML: {e}")))?;
        self.merge_dom(&doc, base_url)
    }

    fn merge_dom(&mut self, doc: &Document, base_url: &str) -> ImfResult<()> {
        let root = doc.root_element();
        if root.tag_name().name() != "AssetMap" {
            return Err(ImfError::invalid(format!(
                "unexpected asset map root element: {}",
                root.tag_name().name()
            )));
        }

        let asset_list = child_by_local_name(root, "AssetList")
            .ok_or_else(|| ImfError::invalid("missing AssetList element in AssetMap"))?;

        for asset in asset_list
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "Asset")
        {
            let locator = parse_asset(asset, base_url)?;
            debug!(uuid = %locator.uuid, uri = %locator.absolute_uri, "found asset");
            if let Some(previous) = self.assets.insert(locator.uuid, locator) {
                let current = &self.assets[&previous.uuid];
                warn!(
                    uuid = %previous.uuid,
                    previous = %previous.absolute_uri,
                    replacement = %current.absolute_uri,
                    "duplicate asset UUID across asset maps, keeping the later entry"
                );
            }
        }

        Ok(())
    }

    /// Exact-UUID lookup.
    pub fn locator(&self, uuid: &Uuid) -> Option<&AssetLocator> {
        self.assets.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn parse_asset(asset: Node, base_url: &str) -> ImfResult<AssetLocator> {
    let uuid = read_uuid(
        child_by_local_name(asset, "Id")
            .ok_or_else(|| ImfError::invalid("missing Id element in Asset"))?,
    )?;

    let chunk_list = child_by_local_name(asset, "ChunkList")
        .ok_or_else(|| ImfError::invalid("missing ChunkList element in Asset"))?;
    let mut chunks = chunk_list
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Chunk");
    let chunk = chunks
        .next()
        .ok_or_else(|| ImfError::invalid("missing Chunk element in ChunkList"))?;
    if chunks.next().is_some() {
        // Range-partitioned assets are not supported; only the first chunk
        // is played.
        warn!(%uuid, "asset declares multiple chunks, using only the first");
    }

    let path = element_text(
        child_by_local_name(chunk, "Path")
            .ok_or_else(|| ImfError::invalid("missing Path element in Chunk"))?,
    );

    let absolute_uri = if uri::is_absolute(&path) {
        path
    } else {
        uri::join_url(base_url, &path)
    };

    Ok(AssetLocator { uuid, absolute_uri })
}
