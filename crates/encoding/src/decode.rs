use tekst_core::EndOfLine;

use crate::{bom::scan_bom, canonical_name, EncodingError, NONE};

/// Result of decoding a byte stream into canonical UTF-8 text.
#[derive(Debug)]
pub struct FileLoadResult {
    /// Size of the raw input in bytes
    pub size: u64,
    /// Decoded text, BOM stripped
    pub text: String,
    /// Canonical name of the on disk charset
    pub encoding: &'static str,
    /// Whether a byte order mark must be written back on save
    pub has_bom: bool,
    /// Dominant line ending style of the decoded text
    pub eol: EndOfLine,
    /// Input contained an embedded NUL in a charset that allows none, the
    /// text was cut there and the document must become read only
    pub truncated: bool,
}

/// Decode `bytes` to canonical text.
///
/// With `forced` set, detection is skipped and the bytes must be valid in
/// that charset. The `"None"` sentinel disables conversion entirely and
/// carries the bytes through. Without `forced`: BOM scan, then UTF-8
/// validation, then best effort charset detection.
pub fn decode(bytes: &[u8], forced: Option<&str>) -> Result<FileLoadResult, EncodingError> {
    let size = bytes.len() as u64;

    if bytes.is_empty() {
        return Ok(FileLoadResult {
            size,
            text: String::new(),
            encoding: encoding_rs::UTF_8.name(),
            has_bom: false,
            eol: EndOfLine::default(),
            truncated: false,
        });
    }

    let (mut text, encoding) = match forced {
        Some(label) => {
            let name = canonical_name(label)?;
            if name == NONE {
                (raw_passthrough(bytes), NONE)
            } else {
                let text = convert_to_utf8(bytes, name)
                    .ok_or(EncodingError::ForcedEncodingInvalid(name))?;
                (text, name)
            }
        }
        None => auto_detect(bytes)?,
    };

    // Conversion keeps a leading byte order mark as U+FEFF
    let has_bom = encoding != NONE && text.starts_with('\u{feff}');
    if has_bom {
        text.remove(0);
    }

    let truncated = nul_truncate(&mut text, encoding);
    let eol = EndOfLine::detect(&text);

    Ok(FileLoadResult {
        size,
        text,
        encoding,
        has_bom,
        eol,
        truncated,
    })
}

fn auto_detect(bytes: &[u8]) -> Result<(String, &'static str), EncodingError> {
    if let Some((name, _)) = scan_bom(bytes) {
        if let Some(text) = convert_to_utf8(bytes, name) {
            return Ok((text, name));
        }
        // The BOM lied, retry with plain detection
        log::debug!("BOM indicated {name} but the data does not decode as it");
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((text.to_string(), encoding_rs::UTF_8.name()));
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);

    match enc.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(cow) => Ok((cow.into_owned(), enc.name())),
        None => Err(EncodingError::UndetectableEncoding),
    }
}

/// Strict conversion to UTF-8, None if the data is not valid in `encoding`.
/// A leading BOM is kept in the output as U+FEFF.
fn convert_to_utf8(bytes: &[u8], encoding: &'static str) -> Option<String> {
    match encoding {
        "UTF-8" => std::str::from_utf8(bytes).ok().map(str::to_string),
        "UTF-32LE" => decode_utf32(bytes, u32::from_le_bytes),
        "UTF-32BE" => decode_utf32(bytes, u32::from_be_bytes),
        name => {
            let enc = encoding_rs::Encoding::for_label(name.as_bytes())?;
            enc.decode_without_bom_handling_and_without_replacement(bytes)
                .map(|cow| cow.into_owned())
        }
    }
}

fn decode_utf32(bytes: &[u8], read: fn([u8; 4]) -> u32) -> Option<String> {
    if bytes.len() % 4 != 0 {
        return None;
    }

    let mut text = String::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let scalar = read(chunk.try_into().ok()?);
        text.push(char::from_u32(scalar)?);
    }
    Some(text)
}

/// Latin-1 mapping, keeps every byte addressable and reversible
fn raw_passthrough(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// Embedded NUL bytes are only legal in wide charsets. For the others the
/// text is cut at the first NUL and flagged so the caller forces read only.
fn nul_truncate(text: &mut String, encoding: &str) -> bool {
    if !matches!(encoding, "UTF-8" | NONE) {
        return false;
    }

    match text.find('\0') {
        Some(pos) => {
            text.truncate(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_input_is_utf8() {
        let res = decode(&[], None).unwrap();
        assert_eq!(res.encoding, "UTF-8");
        assert_eq!(res.text, "");
        assert!(!res.has_bom);
        assert!(!res.truncated);
    }

    #[test]
    fn plain_utf8() {
        let res = decode("täksti".as_bytes(), None).unwrap();
        assert_eq!(res.encoding, "UTF-8");
        assert_eq!(res.text, "täksti");
        assert!(!res.has_bom);
    }

    #[test]
    fn utf16le_bom_ascii() {
        let bytes = [0xFF, 0xFE, 0x61, 0x00, 0x62, 0x00, 0x63, 0x00];
        let res = decode(&bytes, None).unwrap();
        assert_eq!(res.text, "abc");
        assert_eq!(res.encoding, "UTF-16LE");
        assert!(res.has_bom);
        assert!(!res.truncated);
    }

    #[test]
    fn utf8_bom_stripped() {
        let bytes = [0xEF, 0xBB, 0xBF, b'h', b'i'];
        let res = decode(&bytes, None).unwrap();
        assert_eq!(res.text, "hi");
        assert_eq!(res.encoding, "UTF-8");
        assert!(res.has_bom);
    }

    #[test]
    fn utf32be_bom() {
        let bytes = [0x00, 0x00, 0xFE, 0xFF, 0x00, 0x00, 0x00, 0x41];
        let res = decode(&bytes, None).unwrap();
        assert_eq!(res.text, "A");
        assert_eq!(res.encoding, "UTF-32BE");
        assert!(res.has_bom);
    }

    #[test]
    fn forced_none_keeps_raw_bytes() {
        let res = decode(&[0xFF], Some("None")).unwrap();
        assert_eq!(res.encoding, NONE);
        assert_eq!(res.text, "\u{ff}");
        assert!(!res.truncated);
        assert!(!res.has_bom);
    }

    #[test]
    fn forced_utf8_invalid() {
        let err = decode(&[0xFF, 0xFE], Some("UTF-8")).unwrap_err();
        assert!(matches!(err, EncodingError::ForcedEncodingInvalid("UTF-8")));
    }

    #[test]
    fn forced_legacy_charset() {
        // 0xE4 is ä in windows-1252
        let res = decode(&[b'a', 0xE4], Some("windows-1252")).unwrap();
        assert_eq!(res.text, "aä");
        assert_eq!(res.encoding, "windows-1252");
    }

    #[test]
    fn detected_legacy_charset() {
        let bytes = b"p\xE4iv\xE4\xE4 kaikille, t\xE4m\xE4 on pitk\xE4hk\xF6 lause";
        let res = decode(bytes, None).unwrap();
        assert!(res.text.contains('ä'));
        assert!(!res.has_bom);
    }

    #[test]
    fn embedded_nul_truncates() {
        let res = decode(b"abc\0def", None).unwrap();
        assert!(res.truncated);
        assert_eq!(res.text, "abc");
        assert_eq!(res.size, 7);
    }

    #[test]
    fn nul_is_fine_in_wide_charsets() {
        // UTF-16LE "ab" contains NUL high bytes
        let bytes = [0xFF, 0xFE, 0x61, 0x00, 0x62, 0x00];
        let res = decode(&bytes, None).unwrap();
        assert!(!res.truncated);
        assert_eq!(res.text, "ab");
    }

    #[test]
    fn eol_detected_from_text() {
        let res = decode(b"a\r\nb\r\n", None).unwrap();
        assert_eq!(res.eol, EndOfLine::Crlf);
    }
}
