//! Output-sink contract the voice engine is written against.
//!
//! A sink owns a fixed set of playback channels and a bank of buffer
//! objects. The engine lends decoded PCM to the sink, points channels at
//! buffers, and asks the sink for channel state; the sink reports
//! asynchronous state transitions through [`OutputSink::poll_event`].

use alloc::string::String;

use crate::pcm::PcmData;
use crate::reverb::ReverbPreset;

slotmap::new_key_type! {
    /// Key for a sink-owned buffer object holding decoded PCM.
    pub struct BufferKey;
}

/// Handle for one sink playback channel.
///
/// Issued by the sink at startup and stable for its lifetime; also serves
/// as the public voice handle returned by `play`.
pub type ChannelId = u32;

/// Playback state of one sink channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
    /// Never started since the sink came up.
    #[default]
    Initial,
    /// Ran to completion or was stopped.
    Stopped,
    Playing,
}

impl ChannelState {
    /// Initial and Stopped both mean "not rendering": the channel is free
    /// for allocation and any pending completion is due.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ChannelState::Playing)
    }
}

/// Asynchronous channel state transition reported by the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkEvent {
    pub channel: ChannelId,
    pub state: ChannelState,
}

/// Error type for sink operations.
#[derive(Debug)]
pub enum SinkError {
    /// No audio device available
    NoDevice,
    /// Failed to initialize the audio device
    DeviceInit(String),
    /// Failed to create the output stream
    StreamCreate(String),
    /// Playback error
    Playback(String),
    /// Channel handle does not belong to this sink
    BadChannel(ChannelId),
    /// Buffer key does not belong to this sink
    BadBuffer,
}

impl core::fmt::Display for SinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SinkError::NoDevice => write!(f, "No audio device available"),
            SinkError::DeviceInit(msg) => write!(f, "Device init error: {}", msg),
            SinkError::StreamCreate(msg) => write!(f, "Stream create error: {}", msg),
            SinkError::Playback(msg) => write!(f, "Playback error: {}", msg),
            SinkError::BadChannel(ch) => write!(f, "Unknown channel handle {}", ch),
            SinkError::BadBuffer => write!(f, "Unknown buffer key"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SinkError {}

/// Trait for audio output sinks.
///
/// The engine treats the sink as authoritative for channel state: the
/// allocator queries it live instead of shadowing a free-list, so a
/// just-finished channel is reusable even before its completion event has
/// been drained.
pub trait OutputSink {
    /// Number of playback channels the sink was opened with.
    fn channel_count(&self) -> usize;

    /// Stable handle for the channel at a pool index.
    fn channel_id(&self, index: usize) -> ChannelId;

    /// Live playback state of a channel. Unknown handles read as Stopped.
    fn channel_state(&self, channel: ChannelId) -> ChannelState;

    /// Upload decoded PCM into a new sink-owned buffer object.
    fn create_buffer(&mut self, pcm: PcmData) -> Result<BufferKey, SinkError>;

    /// Release a buffer object. Channels already bound to it keep playing
    /// their copy of the data.
    fn destroy_buffer(&mut self, buffer: BufferKey);

    /// Point a channel at a buffer. The channel must not be Playing.
    fn bind_buffer(&mut self, channel: ChannelId, buffer: BufferKey) -> Result<(), SinkError>;

    /// Per-channel gain, 0.0-1.0.
    fn set_gain(&mut self, channel: ChannelId, gain: f32);

    /// Master gain applied to the mixed output, 0.0-1.0.
    fn set_master_gain(&mut self, gain: f32);

    /// Listener-relative 2D position of a channel.
    fn set_position(&mut self, channel: ChannelId, x: f32, y: f32);

    /// Listener-relative 2D velocity of a channel. Sinks without a doppler
    /// model may ignore this.
    fn set_velocity(&mut self, channel: ChannelId, x: f32, y: f32);

    /// Playback-rate multiplier as a 16.16 fixed-point scale.
    fn set_rate(&mut self, channel: ChannelId, scale: u32);

    /// Swap left and right at the mixed output.
    fn set_reverse_stereo(&mut self, swapped: bool);

    /// Load a preset into the global effect and attach every channel's
    /// auxiliary send to it; `None` detaches every channel.
    fn set_reverb(&mut self, preset: Option<ReverbPreset>);

    /// Begin playback on a channel from the start of its bound buffer.
    fn start(&mut self, channel: ChannelId) -> Result<(), SinkError>;

    /// Halt a channel. A no-op if it is not Playing.
    fn stop(&mut self, channel: ChannelId);

    /// Drain one pending state-transition event, if any.
    fn poll_event(&mut self) -> Option<SinkEvent>;
}
