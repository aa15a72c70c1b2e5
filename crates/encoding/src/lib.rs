mod bom;
mod decode;
mod encode;

use thiserror::Error;

pub use bom::{is_unicode, scan_bom};
pub use decode::{decode, FileLoadResult};
pub use encode::encode;

/// Sentinel charset name for binary safe raw viewing. No conversion is done,
/// every byte is carried through unchanged.
pub const NONE: &str = "None";

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("The file is not valid {0}")]
    ForcedEncodingInvalid(&'static str),

    #[error("The file does not look like a text file or the file encoding is not supported")]
    UndetectableEncoding,

    #[error("Unsupported charset: {0}")]
    Unsupported(String),

    #[error("Cannot convert \"{context}\" at byte {offset} to the target charset")]
    IllegalSequence { offset: usize, context: String },
}

/// Resolve a charset label to its canonical name. Labels the registry does
/// not know are an error, not a silent fallback.
pub fn canonical_name(label: &str) -> Result<&'static str, EncodingError> {
    if label.eq_ignore_ascii_case(NONE) {
        return Ok(NONE);
    }

    // encoding_rs has no UTF-32, resolve those labels here
    for name in ["UTF-32LE", "UTF-32BE"] {
        if label.eq_ignore_ascii_case(name) {
            return Ok(name);
        }
    }

    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(enc) => Ok(enc.name()),
        None => Err(EncodingError::Unsupported(label.to_string())),
    }
}
