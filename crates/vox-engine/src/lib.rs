//! Voice allocation and playback-completion engine for voicebox.
//!
//! Multiplexes a fixed pool of sink channels across sound-effect
//! requests, resolves pitch offsets to fixed-point rate scales, and
//! delivers one-shot completion notifications.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod notify;
mod pitch;
mod pool;

pub use notify::{CompletionFn, CompletionNotifier};
pub use pitch::{pitch_scale, scale_to_f32, UNITY_SCALE};
pub use pool::{VoicePool, VoiceSlot, MAX_VOICES, NO_TOKEN};
