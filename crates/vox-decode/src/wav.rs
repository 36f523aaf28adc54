//! RIFF/WAVE payload decoding.

use vox_core::{PcmData, PcmFrames};

use crate::DecodeError;

/// Decode a WAV payload into PCM frames.
///
/// Plain PCM only (format tag 1), 8 or 16 bits, one or two channels.
/// 8-bit WAV data is unsigned and stays unsigned — that is the engine's
/// native 8-bit format.
pub fn load_wav(data: &[u8]) -> Result<PcmData, DecodeError> {
    let header = parse_header(data)?;
    let frames = read_pcm_data(data, &header)?;
    Ok(PcmData {
        sample_rate: header.sample_rate,
        frames,
    })
}

struct WavHeader {
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_offset: usize,
    data_size: usize,
}

fn parse_header(data: &[u8]) -> Result<WavHeader, DecodeError> {
    if data.len() < 44 {
        return Err(DecodeError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(DecodeError::InvalidHeader);
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u32, u16)> = None;
    let mut data_chunk: Option<(usize, usize)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32_le(data, pos + 4) as usize;

        if chunk_id == b"fmt " && chunk_size >= 16 {
            let format = read_u16_le(data, pos + 8);
            if format != 1 {
                // Compressed / float WAV is not PCM the engine can take.
                return Err(DecodeError::UnsupportedFormat);
            }
            let channels = read_u16_le(data, pos + 10);
            let rate = read_u32_le(data, pos + 12);
            let bits = read_u16_le(data, pos + 22);
            fmt = Some((channels, rate, bits));
        } else if chunk_id == b"data" {
            data_chunk = Some((pos + 8, chunk_size));
        }

        pos += 8 + chunk_size;
        // Chunks are word-aligned.
        if pos % 2 != 0 {
            pos += 1;
        }
    }

    let (num_channels, sample_rate, bits_per_sample) = fmt.ok_or(DecodeError::InvalidHeader)?;
    let (data_offset, data_size) = data_chunk.ok_or(DecodeError::InvalidHeader)?;

    if bits_per_sample != 8 && bits_per_sample != 16 {
        return Err(DecodeError::UnsupportedFormat);
    }
    if !(1..=2).contains(&num_channels) {
        return Err(DecodeError::UnsupportedFormat);
    }

    Ok(WavHeader {
        num_channels,
        sample_rate,
        bits_per_sample,
        data_offset,
        data_size,
    })
}

fn read_pcm_data(data: &[u8], header: &WavHeader) -> Result<PcmFrames, DecodeError> {
    let end = (header.data_offset + header.data_size).min(data.len());
    let raw = &data[header.data_offset..end];

    match (header.bits_per_sample, header.num_channels) {
        (8, 1) => Ok(PcmFrames::MonoU8(raw.to_vec())),
        (8, 2) => {
            let (l, r) = split_u8_stereo(raw);
            Ok(PcmFrames::StereoU8(l, r))
        }
        (16, 1) => Ok(PcmFrames::MonoI16(read_i16_mono(raw))),
        (16, 2) => {
            let (l, r) = split_i16_stereo(raw);
            Ok(PcmFrames::StereoI16(l, r))
        }
        _ => Err(DecodeError::UnsupportedFormat),
    }
}

fn split_u8_stereo(raw: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut left = Vec::with_capacity(raw.len() / 2);
    let mut right = Vec::with_capacity(raw.len() / 2);
    for chunk in raw.chunks_exact(2) {
        left.push(chunk[0]);
        right.push(chunk[1]);
    }
    (left, right)
}

fn read_i16_mono(raw: &[u8]) -> Vec<i16> {
    raw.chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

fn split_i16_stereo(raw: &[u8]) -> (Vec<i16>, Vec<i16>) {
    let mut left = Vec::with_capacity(raw.len() / 4);
    let mut right = Vec::with_capacity(raw.len() / 4);
    for chunk in raw.chunks_exact(4) {
        left.push(i16::from_le_bytes([chunk[0], chunk[1]]));
        right.push(i16::from_le_bytes([chunk[2], chunk[3]]));
    }
    (left, right)
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
