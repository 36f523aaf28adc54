//! cpal device backend implementing the [`OutputSink`] contract.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use slotmap::SlotMap;
use tracing::{info, warn};

use vox_core::{
    BufferKey, ChannelId, ChannelState, OutputSink, PcmData, ReverbPreset, SinkError, SinkEvent,
};

use crate::mixer::{decode_state, LaneCommand, Mixer, CHANNEL_BASE, STATE_PLAYING, STATE_STOPPED};

const COMMAND_QUEUE_LEN: usize = 1024;
const EVENT_QUEUE_LEN: usize = 256;

/// Map a public channel handle back to a mixer lane index.
fn lane_index(channel: ChannelId, lanes: usize) -> Option<usize> {
    channel
        .checked_sub(CHANNEL_BASE)
        .map(|i| i as usize)
        .filter(|&i| i < lanes)
}

/// cpal-backed output sink.
///
/// Owns the platform stream; the mixer lives inside the stream callback
/// and all interaction goes through the command/event rings plus the
/// per-channel state atomics.
pub struct CpalSink {
    // Keeps the stream alive; playback dies with the sink.
    _stream: Stream,
    sample_rate: u32,
    commands: HeapProd<LaneCommand>,
    events: HeapCons<SinkEvent>,
    states: Arc<[AtomicU8]>,
    buffers: SlotMap<BufferKey, Arc<PcmData>>,
}

impl CpalSink {
    /// Open the default output device with the given number of playback
    /// channels and start the stream.
    pub fn new(voices: usize) -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| SinkError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // Force stereo output — the mixer produces 2-channel interleaving.
        config.channels = 2;
        let sample_rate = config.sample_rate.0;

        let (cmd_prod, cmd_cons) = HeapRb::<LaneCommand>::new(COMMAND_QUEUE_LEN).split();
        let (ev_prod, ev_cons) = HeapRb::<SinkEvent>::new(EVENT_QUEUE_LEN).split();
        let states: Arc<[AtomicU8]> = (0..voices).map(|_| AtomicU8::new(0)).collect();

        let mut mixer = Mixer::new(voices, cmd_cons, ev_prod, Arc::clone(&states), sample_rate);
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mixer.process(data, channels);
                },
                |err| warn!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| SinkError::StreamCreate(e.to_string()))?;

        stream
            .play()
            .map_err(|e| SinkError::Playback(e.to_string()))?;

        info!(
            "opened output device: {} voices at {} Hz",
            voices, sample_rate
        );

        Ok(Self {
            _stream: stream,
            sample_rate,
            commands: cmd_prod,
            events: ev_cons,
            states,
            buffers: SlotMap::with_key(),
        })
    }

    /// Output stream sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn lane(&self, channel: ChannelId) -> Option<usize> {
        lane_index(channel, self.states.len())
    }

    /// Non-blocking command push; the ring is sized so overflow means the
    /// control side is badly ahead of the audio thread.
    fn push(&mut self, command: LaneCommand) -> bool {
        if self.commands.try_push(command).is_err() {
            warn!("sink command queue full, command dropped");
            return false;
        }
        true
    }
}

impl OutputSink for CpalSink {
    fn channel_count(&self) -> usize {
        self.states.len()
    }

    fn channel_id(&self, index: usize) -> ChannelId {
        index as u32 + CHANNEL_BASE
    }

    fn channel_state(&self, channel: ChannelId) -> ChannelState {
        match self.lane(channel) {
            Some(lane) => decode_state(self.states[lane].load(Ordering::Acquire)),
            None => ChannelState::Stopped,
        }
    }

    fn create_buffer(&mut self, pcm: PcmData) -> Result<BufferKey, SinkError> {
        Ok(self.buffers.insert(Arc::new(pcm)))
    }

    fn destroy_buffer(&mut self, buffer: BufferKey) {
        // Lanes hold their own reference; dropping ours is enough.
        self.buffers.remove(buffer);
    }

    fn bind_buffer(&mut self, channel: ChannelId, buffer: BufferKey) -> Result<(), SinkError> {
        let lane = self.lane(channel).ok_or(SinkError::BadChannel(channel))?;
        let pcm = self
            .buffers
            .get(buffer)
            .cloned()
            .ok_or(SinkError::BadBuffer)?;
        self.push(LaneCommand::Bind { lane, pcm });
        Ok(())
    }

    fn set_gain(&mut self, channel: ChannelId, gain: f32) {
        let Some(lane) = self.lane(channel) else {
            warn!("set_gain: unknown channel {}", channel);
            return;
        };
        self.push(LaneCommand::SetGain { lane, gain });
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.push(LaneCommand::SetMasterGain(gain));
    }

    fn set_position(&mut self, channel: ChannelId, x: f32, y: f32) {
        let Some(lane) = self.lane(channel) else {
            warn!("set_position: unknown channel {}", channel);
            return;
        };
        self.push(LaneCommand::SetPosition { lane, x, y });
    }

    fn set_velocity(&mut self, _channel: ChannelId, _x: f32, _y: f32) {
        // Accepted for interface parity; the software mixer has no
        // doppler model, so a stationary velocity is the only one.
    }

    fn set_rate(&mut self, channel: ChannelId, scale: u32) {
        let Some(lane) = self.lane(channel) else {
            warn!("set_rate: unknown channel {}", channel);
            return;
        };
        self.push(LaneCommand::SetRate { lane, scale });
    }

    fn set_reverse_stereo(&mut self, swapped: bool) {
        self.push(LaneCommand::SetReverseStereo(swapped));
    }

    fn set_reverb(&mut self, preset: Option<ReverbPreset>) {
        self.push(LaneCommand::SetReverb(preset));
    }

    fn start(&mut self, channel: ChannelId) -> Result<(), SinkError> {
        let lane = self.lane(channel).ok_or(SinkError::BadChannel(channel))?;
        // Publish Playing eagerly so an allocation scan between now and
        // the mixer picking the command up cannot hand the channel out
        // twice.
        let previous = self.states[lane].swap(STATE_PLAYING, Ordering::AcqRel);
        if !self.push(LaneCommand::Start { lane }) {
            self.states[lane].store(previous, Ordering::Release);
            return Err(SinkError::Playback("command queue full".into()));
        }
        Ok(())
    }

    fn stop(&mut self, channel: ChannelId) {
        let Some(lane) = self.lane(channel) else {
            warn!("stop: unknown channel {}", channel);
            return;
        };
        // Mirror the eager start: the channel reads as free immediately.
        self.states[lane].store(STATE_STOPPED, Ordering::Release);
        self.push(LaneCommand::Stop { lane });
    }

    fn poll_event(&mut self) -> Option<SinkEvent> {
        self.events.try_pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_index_round_trips_channel_ids() {
        for index in 0..8usize {
            let channel = index as u32 + CHANNEL_BASE;
            assert_eq!(lane_index(channel, 8), Some(index));
        }
    }

    #[test]
    fn lane_index_rejects_out_of_range() {
        assert_eq!(lane_index(0, 8), None); // below the handle base
        assert_eq!(lane_index(8 + CHANNEL_BASE, 8), None);
        assert_eq!(lane_index(u32::MAX, 8), None);
    }
}
