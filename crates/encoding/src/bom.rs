/// Known byte order marks, longest first so UTF-32 wins over UTF-16
const BOMS: &[(&str, &[u8])] = &[
    ("UTF-32LE", &[0xFF, 0xFE, 0x00, 0x00]),
    ("UTF-32BE", &[0x00, 0x00, 0xFE, 0xFF]),
    ("UTF-8", &[0xEF, 0xBB, 0xBF]),
    ("UTF-16LE", &[0xFF, 0xFE]),
    ("UTF-16BE", &[0xFE, 0xFF]),
];

/// Scan for a Unicode byte order mark. Returns the indicated charset name
/// and the width of the mark in bytes.
pub fn scan_bom(bytes: &[u8]) -> Option<(&'static str, usize)> {
    BOMS.iter()
        .find(|(_, bom)| bytes.starts_with(bom))
        .map(|(name, bom)| (*name, bom.len()))
}

/// Whether a charset is a Unicode charset, i.e. one that may carry a byte
/// order mark.
pub fn is_unicode(encoding: &str) -> bool {
    encoding.starts_with("UTF-")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn utf32_beats_utf16() {
        assert_eq!(
            scan_bom(&[0xFF, 0xFE, 0x00, 0x00, 0x61]),
            Some(("UTF-32LE", 4))
        );
        assert_eq!(scan_bom(&[0xFF, 0xFE, 0x61, 0x00]), Some(("UTF-16LE", 2)));
    }

    #[test]
    fn utf8_bom() {
        assert_eq!(scan_bom(&[0xEF, 0xBB, 0xBF, b'a']), Some(("UTF-8", 3)));
    }

    #[test]
    fn no_bom() {
        assert_eq!(scan_bom(b"plain text"), None);
        assert_eq!(scan_bom(&[]), None);
    }

    #[test]
    fn unicode_charsets() {
        assert!(is_unicode("UTF-8"));
        assert!(is_unicode("UTF-16BE"));
        assert!(!is_unicode("windows-1252"));
        assert!(!is_unicode("None"));
    }
}
