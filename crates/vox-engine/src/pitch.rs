//! Fixed-point pitch transposition.
//!
//! A pitch offset is a signed count of hundredths of a semitone (100 = one
//! semitone up). [`pitch_scale`] turns it into a 16.16 fixed-point
//! playback-rate multiplier: a table covers one octave at 4-cent
//! resolution, and whole octaves become bit shifts of the looked-up ratio.

/// Detune steps per semitone column span (100 cents / 4 cents per step).
const MAX_DETUNE: i32 = 25;

/// Cents per octave.
const OCTAVE_CENTS: i32 = 1200;

/// Unity playback rate in 16.16 fixed point.
pub const UNITY_SCALE: u32 = 1 << 16;

/// Rate multipliers for one octave: 12 semitone rows x 25 detune steps,
/// 16.16 fixed point, rising from exactly 1.0 to just under 2.0.
const PITCH_TABLE: [[u32; 25]; 12] = [
    [
        0x10000, 0x10097, 0x1012f, 0x101c7, 0x10260,
        0x102f9, 0x10392, 0x1042c, 0x104c6, 0x10561,
        0x105fb, 0x10696, 0x10732, 0x107ce, 0x1086a,
        0x10907, 0x109a4, 0x10a41, 0x10adf, 0x10b7d,
        0x10c1b, 0x10cba, 0x10d59, 0x10df8, 0x10e98,
    ],
    [
        0x10f38, 0x10fd9, 0x1107a, 0x1111b, 0x111bd,
        0x1125f, 0x11302, 0x113a5, 0x11448, 0x114eb,
        0x1158f, 0x11634, 0x116d8, 0x1177e, 0x11823,
        0x118c9, 0x1196f, 0x11a16, 0x11abd, 0x11b64,
        0x11c0c, 0x11cb4, 0x11d5d, 0x11e06, 0x11eaf,
    ],
    [
        0x11f59, 0x12003, 0x120ae, 0x12159, 0x12204,
        0x122b0, 0x1235c, 0x12409, 0x124b6, 0x12563,
        0x12611, 0x126bf, 0x1276d, 0x1281c, 0x128cc,
        0x1297b, 0x12a2b, 0x12adc, 0x12b8d, 0x12c3e,
        0x12cf0, 0x12da2, 0x12e55, 0x12f08, 0x12fbc,
    ],
    [
        0x1306f, 0x13124, 0x131d8, 0x1328d, 0x13343,
        0x133f9, 0x134af, 0x13566, 0x1361d, 0x136d5,
        0x1378d, 0x13846, 0x138fe, 0x139b8, 0x13a72,
        0x13b2c, 0x13be6, 0x13ca1, 0x13d5d, 0x13e19,
        0x13ed5, 0x13f92, 0x1404f, 0x1410d, 0x141cb,
    ],
    [
        0x1428a, 0x14349, 0x14408, 0x144c8, 0x14588,
        0x14649, 0x1470a, 0x147cc, 0x1488e, 0x14951,
        0x14a14, 0x14ad7, 0x14b9b, 0x14c5f, 0x14d24,
        0x14dea, 0x14eaf, 0x14f75, 0x1503c, 0x15103,
        0x151cb, 0x15293, 0x1535b, 0x15424, 0x154ee,
    ],
    [
        0x155b8, 0x15682, 0x1574d, 0x15818, 0x158e4,
        0x159b0, 0x15a7d, 0x15b4a, 0x15c18, 0x15ce6,
        0x15db4, 0x15e83, 0x15f53, 0x16023, 0x160f4,
        0x161c5, 0x16296, 0x16368, 0x1643a, 0x1650d,
        0x165e1, 0x166b5, 0x16789, 0x1685e, 0x16934,
    ],
    [
        0x16a09, 0x16ae0, 0x16bb7, 0x16c8e, 0x16d66,
        0x16e3e, 0x16f17, 0x16ff1, 0x170ca, 0x171a5,
        0x17280, 0x1735b, 0x17437, 0x17513, 0x175f0,
        0x176ce, 0x177ac, 0x1788a, 0x17969, 0x17a49,
        0x17b29, 0x17c09, 0x17cea, 0x17dcc, 0x17eae,
    ],
    [
        0x17f91, 0x18074, 0x18157, 0x1823c, 0x18320,
        0x18406, 0x184eb, 0x185d2, 0x186b8, 0x187a0,
        0x18888, 0x18970, 0x18a59, 0x18b43, 0x18c2d,
        0x18d17, 0x18e02, 0x18eee, 0x18fda, 0x190c7,
        0x191b5, 0x192a2, 0x19391, 0x19480, 0x1956f,
    ],
    [
        0x1965f, 0x19750, 0x19841, 0x19933, 0x19a25,
        0x19b18, 0x19c0c, 0x19d00, 0x19df4, 0x19ee9,
        0x19fdf, 0x1a0d5, 0x1a1cc, 0x1a2c4, 0x1a3bc,
        0x1a4b4, 0x1a5ad, 0x1a6a7, 0x1a7a1, 0x1a89c,
        0x1a998, 0x1aa94, 0x1ab90, 0x1ac8d, 0x1ad8b,
    ],
    [
        0x1ae89, 0x1af88, 0x1b088, 0x1b188, 0x1b289,
        0x1b38a, 0x1b48c, 0x1b58f, 0x1b692, 0x1b795,
        0x1b89a, 0x1b99f, 0x1baa4, 0x1bbaa, 0x1bcb1,
        0x1bdb8, 0x1bec0, 0x1bfc9, 0x1c0d2, 0x1c1dc,
        0x1c2e6, 0x1c3f1, 0x1c4fd, 0x1c609, 0x1c716,
    ],
    [
        0x1c823, 0x1c931, 0x1ca40, 0x1cb50, 0x1cc60,
        0x1cd70, 0x1ce81, 0x1cf93, 0x1d0a6, 0x1d1b9,
        0x1d2cd, 0x1d3e1, 0x1d4f6, 0x1d60c, 0x1d722,
        0x1d839, 0x1d951, 0x1da69, 0x1db82, 0x1dc9c,
        0x1ddb6, 0x1ded1, 0x1dfec, 0x1e109, 0x1e225,
    ],
    [
        0x1e343, 0x1e461, 0x1e580, 0x1e6a0, 0x1e7c0,
        0x1e8e0, 0x1ea02, 0x1eb24, 0x1ec47, 0x1ed6b,
        0x1ee8f, 0x1efb4, 0x1f0d9, 0x1f1ff, 0x1f326,
        0x1f44e, 0x1f576, 0x1f69f, 0x1f7c9, 0x1f8f3,
        0x1fa1e, 0x1fb4a, 0x1fc76, 0x1fda3, 0x1fed1,
    ],
];

/// Convert a pitch offset in hundredths of a semitone to a 16.16
/// fixed-point playback-rate scale.
///
/// The offset is unbounded in either direction. Octave shifts become bit
/// shifts of the table entry, so offsets beyond roughly ±10 octaves start
/// shifting significant bits off the end of the 32-bit ratio; callers are
/// expected to stay in a musically sane range.
pub fn pitch_scale(pitch_offset: i32) -> u32 {
    if pitch_offset == 0 {
        return PITCH_TABLE[0][0];
    }

    // Reduce into one octave; euclidean division keeps the note shift in
    // [0, 1200) for negative offsets and pushes the sign into the octave.
    let note_shift = pitch_offset.rem_euclid(OCTAVE_CENTS);
    let octave_shift = pitch_offset.div_euclid(OCTAVE_CENTS);

    let note = (note_shift / 100) as usize;
    let detune = ((note_shift % 100) / (100 / MAX_DETUNE)) as usize;

    let scale = PITCH_TABLE[note][detune];

    if octave_shift < 0 {
        scale >> -octave_shift
    } else {
        scale << octave_shift
    }
}

/// Convert a 16.16 rate scale to a float multiplier, for sinks whose rate
/// control is floating point.
pub fn scale_to_f32(scale: u32) -> f32 {
    scale as f32 / UNITY_SCALE as f32
}
