//! Core types for the voicebox sound-effect engine.
//!
//! Shared between the allocation engine, the payload decoders, and the
//! output sinks. The engine side is written entirely against the
//! [`OutputSink`] trait defined here, so sinks and tests can be swapped
//! freely.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod compass;
mod pcm;
mod reverb;
mod sink;

pub use compass::{angle_to_offset, COMPASS_MASK, COMPASS_POINTS};
pub use pcm::{ChannelLayout, PcmData, PcmFrames, SampleFormat};
pub use reverb::{ReverbParams, ReverbPreset};
pub use sink::{BufferKey, ChannelId, ChannelState, OutputSink, SinkError, SinkEvent};
