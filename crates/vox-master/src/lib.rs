//! Public facade for the voicebox sound-effect engine.
//!
//! [`VoiceManager`] ties the allocation engine, the payload decoders, and
//! an output sink into the API gameplay code calls: play a positioned
//! sound, stop it, transpose it, pick the room reverb, and get told —
//! exactly once — when it finishes.

mod error;
mod manager;

// Re-export common types so callers don't need the subcrates directly.
pub use vox_core::{
    ChannelId, ChannelState, OutputSink, ReverbPreset, SinkError, SinkEvent,
};
pub use vox_decode::DecodeError;
pub use vox_engine::{pitch_scale, scale_to_f32, CompletionFn, MAX_VOICES, UNITY_SCALE};
pub use vox_sink::CpalSink;

pub use error::{InitError, PlayError};
pub use manager::{PlayParams, VoiceManager};
