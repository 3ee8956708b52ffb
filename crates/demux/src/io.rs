//! Whole-document reads and the filesystem-backed document IO.

use imf_common::{DocumentIo, ImfError, ImfResult};
use std::fs::File;
use std::io::Read;
use tracing::debug;

/// Read cap, one below the maximum representable count so length
/// arithmetic cannot wrap.
const MAX_DOCUMENT_READ: u64 = u64::MAX - 1;

/// Initial buffer size for documents whose length is unknown up front.
const DEFAULT_DOCUMENT_SIZE: usize = 8 * 1024;

/// Read an XML document fully into memory as UTF-8 text.
pub fn read_document(io: &dyn DocumentIo, url: &str) -> ImfResult<String> {
    debug!(url, "reading document");
    let mut reader = io.open(url)?.take(MAX_DOCUMENT_READ);
    let mut bytes = Vec::with_capacity(DEFAULT_DOCUMENT_SIZE);
    reader.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Err(ImfError::invalid(format!("empty document: {url}")));
    }
    String::from_utf8(bytes)
        .map_err(|_| ImfError::invalid(format!("document is not valid UTF-8: {url}")))
}

/// [`DocumentIo`] over the local filesystem, for packages addressed by
/// plain paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsDocumentIo;

impl DocumentIo for FsDocumentIo {
    fn open(&self, url: &str) -> ImfResult<Box<dyn Read>> {
        let file = File::open(url)?;
        Ok(Box::new(file))
    }
}
