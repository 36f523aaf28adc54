//! cpal-backed output sink for voicebox.
//!
//! Implements the [`vox_core::OutputSink`] contract with a software mixer
//! that runs inside the platform audio stream callback. The control side
//! and the mixer share nothing but a pair of SPSC ring buffers (commands
//! in, state-change events out) and one atomic state cell per channel, so
//! the audio callback never takes a lock.

mod cpal_backend;
mod mixer;

pub use cpal_backend::CpalSink;
