//! Container claim — the host dispatches CPL documents to this demuxer by
//! file extension or MIME type; content probing is not performed.

/// File extensions claimed by the demuxer.
pub const EXTENSIONS: &[&str] = &["xml"];

/// MIME types claimed by the demuxer.
pub const MIME_TYPES: &[&str] = &["application/xml", "text/xml"];

/// True when the URL's extension is one the demuxer claims.
pub fn claims_url(url: &str) -> bool {
    let ext = url
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    EXTENSIONS.contains(&ext.as_str())
}

/// True for MIME types the demuxer claims.
pub fn claims_mime_type(mime: &str) -> bool {
    MIME_TYPES.contains(&mime)
}
