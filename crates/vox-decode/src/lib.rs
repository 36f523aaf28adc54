//! Sound payload decoders for voicebox.
//!
//! Payloads arrive pre-loaded in memory in one of two containers:
//! RIFF/WAVE or Creative Voice (VOC). Both decode eagerly into
//! [`vox_core::PcmData`]; the engine accepts only mono/stereo payloads in
//! unsigned 8-bit or signed 16-bit PCM, and the decoders reject anything
//! else up front.

mod voc;
mod wav;

pub use voc::load_voc;
pub use wav::load_wav;

use vox_core::PcmData;

/// Error type for payload decoding.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Unrecognized container or malformed header
    InvalidHeader,
    /// Payload ends mid-structure
    UnexpectedEof,
    /// Channel/sample-type combination outside mono/stereo × u8/i16
    UnsupportedFormat,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidHeader => write!(f, "Invalid or unrecognized payload header"),
            DecodeError::UnexpectedEof => write!(f, "Payload truncated"),
            DecodeError::UnsupportedFormat => write!(f, "Unsupported channel/sample format"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a payload, sniffing the container from its magic bytes.
pub fn decode(data: &[u8]) -> Result<PcmData, DecodeError> {
    if data.starts_with(b"RIFF") {
        wav::load_wav(data)
    } else if data.starts_with(b"Creative") {
        voc::load_voc(data)
    } else {
        Err(DecodeError::InvalidHeader)
    }
}
