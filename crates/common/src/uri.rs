//! URI classification and path joining for asset resolution.
//!
//! Asset map `Path` entries come in four shapes: URLs, POSIX absolute
//! paths, DOS absolute paths (drive-letter or UNC), and package-relative
//! paths that resolve against the directory of the document that named
//! them.

/// True when the string carries a scheme separator (`://`).
pub fn is_url(s: &str) -> bool {
    s.contains("://")
}

/// True for POSIX absolute paths (`/media/file.mxf`).
pub fn is_unix_absolute(s: &str) -> bool {
    s.starts_with('/')
}

/// True for DOS absolute paths: `C:\x`, `C:/x`, or UNC `\\host\x`.
pub fn is_dos_absolute(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() >= 3 && b[1] == b':' && (b[2] == b'\\' || b[2] == b'/') {
        return true;
    }
    b.len() >= 2 && b[0] == b'\\' && b[1] == b'\\'
}

/// True for any of the absolute forms above.
pub fn is_absolute(s: &str) -> bool {
    is_url(s) || is_unix_absolute(s) || is_dos_absolute(s)
}

/// Directory part of a path or URL: everything before the last separator,
/// or `.` when there is none.
pub fn url_dirname(url: &str) -> &str {
    match url.rfind(['/', '\\']) {
        Some(0) => &url[..1],
        Some(idx) => &url[..idx],
        None => ".",
    }
}

/// Append a path component to a base, inserting exactly one separator.
pub fn join_url(base: &str, component: &str) -> String {
    if base.is_empty() {
        return component.to_owned();
    }
    if base.ends_with('/') || base.ends_with('\\') {
        format!("{base}{component}")
    } else {
        format!("{base}/{component}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_url("http://host/x.mxf"));
        assert!(is_url("file:///x.mxf"));
        assert!(!is_url("video/x.mxf"));
    }

    #[test]
    fn unix_absolute_detection() {
        assert!(is_unix_absolute("/abs/file.mxf"));
        assert!(!is_unix_absolute("rel/file.mxf"));
    }

    #[test]
    fn dos_absolute_detection() {
        assert!(is_dos_absolute("C:\\media\\file.mxf"));
        assert!(is_dos_absolute("C:/media/file.mxf"));
        assert!(is_dos_absolute("\\\\server\\share\\file.mxf"));
        assert!(!is_dos_absolute("C:"));
        assert!(!is_dos_absolute("file.mxf"));
    }

    #[test]
    fn dirname_strips_last_component() {
        assert_eq!(url_dirname("http://h/base/ASSETMAP.xml"), "http://h/base");
        assert_eq!(url_dirname("/pkg/CPL.xml"), "/pkg");
        assert_eq!(url_dirname("/CPL.xml"), "/");
        assert_eq!(url_dirname("CPL.xml"), ".");
    }

    #[test]
    fn join_inserts_single_separator() {
        assert_eq!(join_url("http://h/base", "sub/x.mxf"), "http://h/base/sub/x.mxf");
        assert_eq!(join_url("/pkg/", "ASSETMAP.xml"), "/pkg/ASSETMAP.xml");
        assert_eq!(join_url("", "x.mxf"), "x.mxf");
    }
}
