//! Environmental reverb presets.
//!
//! Gameplay code expresses "how reverberant is this room" as a single
//! 0-255 intensity; the selector maps it onto one of four fixed preset
//! parameter tables applied to a single global effect shared by every
//! voice. There is no per-voice reverb and no interpolation between
//! presets.

/// Parameter table for one environmental reverb configuration.
///
/// Field meanings follow the usual EAX-style reverb model; sinks are free
/// to honor as much or as little of the table as their effect engine
/// supports. Times are seconds, gains are linear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbParams {
    pub density: f32,
    pub diffusion: f32,
    pub gain: f32,
    pub gain_hf: f32,
    pub decay_time: f32,
    pub reflections_gain: f32,
    pub reflections_delay: f32,
    pub late_gain: f32,
    pub late_delay: f32,
}

/// Open parking structure: short, dry tail.
const LIGHT: ReverbParams = ReverbParams {
    density: 1.0,
    diffusion: 1.0,
    gain: 0.3162,
    gain_hf: 1.0,
    decay_time: 1.65,
    reflections_gain: 0.2082,
    reflections_delay: 0.008,
    late_gain: 0.2652,
    late_delay: 0.012,
};

/// Sewer pipe, shorter decay variant.
const HEAVY_A: ReverbParams = ReverbParams {
    density: 0.3071,
    diffusion: 0.8,
    gain: 0.3162,
    gain_hf: 0.3162,
    decay_time: 1.54,
    reflections_gain: 1.2589,
    reflections_delay: 0.014,
    late_gain: 3.2471,
    late_delay: 0.021,
};

/// Sewer pipe, longer decay variant.
const HEAVY_B: ReverbParams = ReverbParams {
    density: 0.3071,
    diffusion: 0.8,
    gain: 0.3162,
    gain_hf: 0.3162,
    decay_time: 1.81,
    reflections_gain: 1.3017,
    reflections_delay: 0.014,
    late_gain: 3.2471,
    late_delay: 0.021,
};

/// Psychotic: very long, warbling tail.
const EXTREME: ReverbParams = ReverbParams {
    density: 0.0625,
    diffusion: 0.5,
    gain: 0.3162,
    gain_hf: 0.8404,
    decay_time: 7.56,
    reflections_gain: 0.4864,
    reflections_delay: 0.02,
    late_gain: 2.4378,
    late_delay: 0.03,
};

/// One of the four environmental reverb configurations.
///
/// `Option<ReverbPreset>` encodes "reverb off"; `None` means the effect is
/// detached from every voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReverbPreset {
    Light,
    HeavyA,
    HeavyB,
    Extreme,
}

impl ReverbPreset {
    /// Map a 0-255 reverb intensity to a preset.
    ///
    /// Thresholds: 0 disables, 1-63 Light, 64-179 HeavyA, 180-219 HeavyB,
    /// 220+ Extreme.
    pub fn from_level(level: u8) -> Option<ReverbPreset> {
        match level {
            0 => None,
            1..=63 => Some(ReverbPreset::Light),
            64..=179 => Some(ReverbPreset::HeavyA),
            180..=219 => Some(ReverbPreset::HeavyB),
            _ => Some(ReverbPreset::Extreme),
        }
    }

    /// The preset's parameter table.
    pub fn params(&self) -> &'static ReverbParams {
        match self {
            ReverbPreset::Light => &LIGHT,
            ReverbPreset::HeavyA => &HEAVY_A,
            ReverbPreset::HeavyB => &HEAVY_B,
            ReverbPreset::Extreme => &EXTREME,
        }
    }
}
