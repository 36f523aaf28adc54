//! Creative Voice (VOC) payload decoding.
//!
//! The container is a 26-byte header followed by typed data blocks. Sound
//! data appears either in legacy blocks (type 1, 8-bit with a one-byte
//! rate divisor, optionally preceded by a type-8 extension for stereo) or
//! in the later type-9 block carrying an explicit rate/bits/channels
//! description. Silence blocks expand to centered samples; repeat markers
//! and text blocks are skipped.

use vox_core::{PcmData, PcmFrames};

use crate::DecodeError;

const MAGIC: &[u8; 19] = b"Creative Voice File";

/// Block type tags.
const BLOCK_TERMINATOR: u8 = 0;
const BLOCK_SOUND_DATA: u8 = 1;
const BLOCK_CONTINUATION: u8 = 2;
const BLOCK_SILENCE: u8 = 3;
const BLOCK_MARKER: u8 = 4;
const BLOCK_TEXT: u8 = 5;
const BLOCK_REPEAT: u8 = 6;
const BLOCK_END_REPEAT: u8 = 7;
const BLOCK_EXTENSION: u8 = 8;
const BLOCK_SOUND_DATA_NEW: u8 = 9;

/// Codec ids shared by block types 1 and 9.
const CODEC_PCM_U8: u16 = 0;
const CODEC_PCM_I16: u16 = 4;

/// Decode a VOC payload into PCM frames.
pub fn load_voc(data: &[u8]) -> Result<PcmData, DecodeError> {
    let blocks_start = parse_header(data)?;
    let mut state = VocState::default();

    let mut pos = blocks_start;
    while pos < data.len() {
        let block_type = data[pos];
        if block_type == BLOCK_TERMINATOR {
            break;
        }
        if pos + 4 > data.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let size = read_u24_le(data, pos + 1) as usize;
        let body_start = pos + 4;
        if body_start + size > data.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let body = &data[body_start..body_start + size];

        match block_type {
            BLOCK_SOUND_DATA => state.sound_data(body)?,
            BLOCK_CONTINUATION => state.continuation(body)?,
            BLOCK_SILENCE => state.silence(body)?,
            BLOCK_EXTENSION => state.extension(body)?,
            BLOCK_SOUND_DATA_NEW => state.sound_data_new(body)?,
            BLOCK_MARKER | BLOCK_TEXT | BLOCK_REPEAT | BLOCK_END_REPEAT => {}
            _ => return Err(DecodeError::InvalidHeader),
        }

        pos = body_start + size;
    }

    state.finish()
}

/// Validate the fixed header; returns the offset of the first block.
fn parse_header(data: &[u8]) -> Result<usize, DecodeError> {
    if data.len() < 26 {
        return Err(DecodeError::UnexpectedEof);
    }
    if &data[0..19] != MAGIC || data[19] != 0x1A {
        return Err(DecodeError::InvalidHeader);
    }
    let blocks_start = read_u16_le(data, 20) as usize;
    let version = read_u16_le(data, 22);
    let checksum = read_u16_le(data, 24);
    if checksum != (!version).wrapping_add(0x1234) {
        return Err(DecodeError::InvalidHeader);
    }
    if blocks_start < 26 || blocks_start > data.len() {
        return Err(DecodeError::InvalidHeader);
    }
    Ok(blocks_start)
}

/// Accumulates raw sample bytes and the format they were declared in.
#[derive(Default)]
struct VocState {
    sample_rate: u32,
    codec: Option<u16>,
    stereo: bool,
    /// From a type-8 extension block, applied to the next type-1 block.
    pending_ext: Option<(u32, bool)>,
    raw: Vec<u8>,
}

impl VocState {
    fn sound_data(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        if body.len() < 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let codec = body[1] as u16;
        if codec != CODEC_PCM_U8 && codec != CODEC_PCM_I16 {
            return Err(DecodeError::UnsupportedFormat);
        }

        if let Some((rate, stereo)) = self.pending_ext.take() {
            self.set_format(rate, codec, stereo)?;
        } else {
            let divisor = 256 - body[0] as u32;
            self.set_format(1_000_000 / divisor, codec, false)?;
        }
        self.raw.extend_from_slice(&body[2..]);
        Ok(())
    }

    fn continuation(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        if self.codec.is_none() {
            // Continuation with nothing to continue.
            return Err(DecodeError::InvalidHeader);
        }
        self.raw.extend_from_slice(body);
        Ok(())
    }

    fn silence(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        if body.len() < 3 {
            return Err(DecodeError::UnexpectedEof);
        }
        let length = read_u16_le(body, 0) as usize + 1;
        match self.codec {
            Some(CODEC_PCM_I16) => self.raw.extend(core::iter::repeat(0u8).take(length * 2)),
            // Silence before any sound block defaults to 8-bit.
            _ => self.raw.extend(core::iter::repeat(0x80u8).take(length)),
        }
        Ok(())
    }

    fn extension(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        if body.len() < 4 {
            return Err(DecodeError::UnexpectedEof);
        }
        let time_constant = read_u16_le(body, 0) as u32;
        let stereo = body[3] == 1;
        let mut rate = 256_000_000 / (65_536 - time_constant);
        if stereo {
            rate /= 2;
        }
        self.pending_ext = Some((rate, stereo));
        Ok(())
    }

    fn sound_data_new(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        if body.len() < 12 {
            return Err(DecodeError::UnexpectedEof);
        }
        let rate = read_u32_le(body, 0);
        let bits = body[4];
        let channels = body[5];
        let codec = read_u16_le(body, 6);

        let valid = matches!(
            (bits, codec),
            (8, CODEC_PCM_U8) | (16, CODEC_PCM_I16)
        );
        if !valid || !(1..=2).contains(&channels) {
            return Err(DecodeError::UnsupportedFormat);
        }
        self.set_format(rate, codec, channels == 2)?;
        self.raw.extend_from_slice(&body[12..]);
        Ok(())
    }

    /// Declare the stream format; every sound block must agree.
    fn set_format(&mut self, rate: u32, codec: u16, stereo: bool) -> Result<(), DecodeError> {
        match self.codec {
            None => {
                self.sample_rate = rate;
                self.codec = Some(codec);
                self.stereo = stereo;
                Ok(())
            }
            Some(existing) if existing == codec && self.stereo == stereo => Ok(()),
            _ => Err(DecodeError::UnsupportedFormat),
        }
    }

    fn finish(self) -> Result<PcmData, DecodeError> {
        let codec = self.codec.ok_or(DecodeError::InvalidHeader)?;
        let frames = match (codec, self.stereo) {
            (CODEC_PCM_U8, false) => PcmFrames::MonoU8(self.raw),
            (CODEC_PCM_U8, true) => {
                let mut left = Vec::with_capacity(self.raw.len() / 2);
                let mut right = Vec::with_capacity(self.raw.len() / 2);
                for chunk in self.raw.chunks_exact(2) {
                    left.push(chunk[0]);
                    right.push(chunk[1]);
                }
                PcmFrames::StereoU8(left, right)
            }
            (CODEC_PCM_I16, false) => PcmFrames::MonoI16(
                self.raw
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes([c[0], c[1]]))
                    .collect(),
            ),
            (CODEC_PCM_I16, true) => {
                let mut left = Vec::with_capacity(self.raw.len() / 4);
                let mut right = Vec::with_capacity(self.raw.len() / 4);
                for chunk in self.raw.chunks_exact(4) {
                    left.push(i16::from_le_bytes([chunk[0], chunk[1]]));
                    right.push(i16::from_le_bytes([chunk[2], chunk[3]]));
                }
                PcmFrames::StereoI16(left, right)
            }
            _ => return Err(DecodeError::UnsupportedFormat),
        };
        Ok(PcmData {
            sample_rate: self.sample_rate,
            frames,
        })
    }
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u24_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], 0])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
