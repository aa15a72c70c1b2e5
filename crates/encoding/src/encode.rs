use crate::{bom::is_unicode, canonical_name, EncodingError, NONE};

/// Convert canonical text to the on disk charset.
///
/// With `emit_bom` set and a Unicode target, a U+FEFF is prepended to the
/// canonical text before conversion so the marker ends up in the target
/// byte order together with the body.
pub fn encode(text: &str, encoding: &str, emit_bom: bool) -> Result<Vec<u8>, EncodingError> {
    let name = canonical_name(encoding)?;

    let mut with_bom = String::new();
    let text = if emit_bom && is_unicode(name) {
        with_bom.reserve(text.len() + '\u{feff}'.len_utf8());
        with_bom.push('\u{feff}');
        with_bom.push_str(text);
        with_bom.as_str()
    } else {
        text
    };

    match name {
        NONE => encode_raw(text),
        "UTF-8" => Ok(text.as_bytes().to_vec()),
        "UTF-16LE" => Ok(encode_utf16(text, u16::to_le_bytes)),
        "UTF-16BE" => Ok(encode_utf16(text, u16::to_be_bytes)),
        "UTF-32LE" => Ok(encode_utf32(text, u32::to_le_bytes)),
        "UTF-32BE" => Ok(encode_utf32(text, u32::to_be_bytes)),
        name => encode_with(text, name),
    }
}

/// Inverse of the raw passthrough, every scalar must fit back into a byte
fn encode_raw(text: &str) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(text.len());
    for (i, ch) in text.char_indices() {
        let scalar = ch as u32;
        if scalar > 0xFF {
            return Err(illegal_sequence(text, i));
        }
        out.push(scalar as u8);
    }
    Ok(out)
}

fn encode_utf16(text: &str, to_bytes: fn(u16) -> [u8; 2]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&to_bytes(unit));
    }
    out
}

fn encode_utf32(text: &str, to_bytes: fn(u32) -> [u8; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 4);
    for ch in text.chars() {
        out.extend_from_slice(&to_bytes(ch as u32));
    }
    out
}

fn encode_with(text: &str, name: &'static str) -> Result<Vec<u8>, EncodingError> {
    let enc = encoding_rs::Encoding::for_label(name.as_bytes())
        .ok_or_else(|| EncodingError::Unsupported(name.to_string()))?;

    let mut encoder = enc.new_encoder();
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    let mut total_read = 0;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(&text[total_read..], &mut buf, true);
        total_read += read;
        out.extend_from_slice(&buf[..written]);

        match result {
            encoding_rs::EncoderResult::InputEmpty => break,
            encoding_rs::EncoderResult::OutputFull => {}
            encoding_rs::EncoderResult::Unmappable(ch) => {
                let offset = total_read - ch.len_utf8();
                log::debug!("charset conversion failed at byte {offset}");
                return Err(illegal_sequence(text, offset));
            }
        }
    }

    Ok(out)
}

/// Diagnostic context: the first valid scalar within the 6 bytes following
/// the failure point.
fn illegal_sequence(text: &str, offset: usize) -> EncodingError {
    let end = (offset + 6).min(text.len());
    let tail = &text.as_bytes()[offset..end];
    let context = String::from_utf8_lossy(tail)
        .chars()
        .find(|ch| *ch != '\u{fffd}')
        .map(String::from)
        .unwrap_or_default();

    EncodingError::IllegalSequence { offset, context }
}
