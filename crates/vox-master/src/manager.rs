//! The voice manager facade.

use tracing::{debug, warn};

use vox_core::{
    angle_to_offset, ChannelId, ChannelState, OutputSink, ReverbPreset, COMPASS_MASK,
    COMPASS_POINTS,
};
use vox_decode::decode;
use vox_engine::{pitch_scale, CompletionNotifier, VoicePool, MAX_VOICES};
use vox_sink::CpalSink;

use crate::error::{InitError, PlayError};

/// One play request.
pub struct PlayParams<'a> {
    /// Raw payload bytes (WAV or VOC container).
    pub payload: &'a [u8],
    /// Pitch transposition in hundredths of a semitone, signed.
    pub pitch_offset: i32,
    /// 32-point compass index; out-of-range values wrap.
    pub angle: i32,
    /// Distance from the listener. Negative distance means "mirrored
    /// behind": it is negated and the angle rotated a half turn.
    pub distance: i32,
    /// Accepted for interface parity; there is no preemption, so
    /// priority does not currently influence allocation.
    pub priority: u8,
    /// Completion correlation token, delivered back at most once when
    /// the voice finishes. `None` requests no notification.
    pub token: Option<u64>,
}

/// Multiplexes a fixed pool of sink channels across play requests.
///
/// All methods are driven from one logical owner thread; completion
/// callbacks fire from [`VoiceManager::drain_completions`] and from
/// explicit [`VoiceManager::stop`], never from a hidden thread.
pub struct VoiceManager<S: OutputSink> {
    sink: S,
    pool: VoicePool,
    notifier: CompletionNotifier,
    master_gain: u8,
    reverse_stereo: bool,
}

impl VoiceManager<CpalSink> {
    /// Open the default output device with the given number of voices.
    pub fn open(voices: usize) -> Result<Self, InitError> {
        if voices == 0 || voices > MAX_VOICES {
            return Err(InitError::InvalidVoiceCount(voices));
        }
        let sink = CpalSink::new(voices).map_err(InitError::Sink)?;
        Self::new(sink)
    }
}

impl<S: OutputSink> VoiceManager<S> {
    /// Wrap an existing sink. The pool covers every sink channel.
    pub fn new(sink: S) -> Result<Self, InitError> {
        let voices = sink.channel_count();
        if voices == 0 || voices > MAX_VOICES {
            return Err(InitError::InvalidVoiceCount(voices));
        }
        let pool = VoicePool::new(&sink);
        Ok(Self {
            sink,
            pool,
            notifier: CompletionNotifier::new(),
            master_gain: 255,
            reverse_stereo: false,
        })
    }

    /// Number of voices in the pool.
    pub fn voices(&self) -> usize {
        self.pool.len()
    }

    /// Borrow the underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the underlying sink, e.g. for sink-specific
    /// configuration the facade does not cover.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Decode a payload and start it on a free voice.
    ///
    /// Returns the sink channel handle for later `stop`/`set_pitch`
    /// calls. Exhaustion and format failures are terminal for this one
    /// request; nothing is retried or queued.
    pub fn play(&mut self, params: PlayParams<'_>) -> Result<ChannelId, PlayError> {
        let PlayParams {
            payload,
            pitch_offset,
            mut angle,
            mut distance,
            priority: _,
            token,
        } = params;

        if distance < 0 {
            distance = -distance;
            angle += COMPASS_POINTS as i32 / 2;
        }

        let Some(index) = self.pool.find_free(&self.sink) else {
            warn!("play: all voices busy, request dropped");
            return Err(PlayError::NoFreeVoice);
        };

        let pcm = decode(payload)?;

        let angle = (angle & COMPASS_MASK) as u8;
        let (x, y) = angle_to_offset(angle, distance as f32);

        let channel = self.pool.slots()[index].channel();
        let buffer = self.sink.create_buffer(pcm)?;
        if let Some(old) = self.pool.replace_buffer(index, buffer) {
            self.sink.destroy_buffer(old);
        }
        if let Err(err) = self.sink.bind_buffer(channel, buffer) {
            self.sink.destroy_buffer(buffer);
            return Err(err.into());
        }

        self.sink.set_position(channel, x, y);
        self.sink.set_velocity(channel, 0.0, 0.0);
        self.sink.set_rate(channel, pitch_scale(pitch_offset));

        let slot = &self.pool.slots()[index];
        slot.set_token(token);

        if let Err(err) = self.sink.start(channel) {
            slot.set_token(None);
            return Err(err.into());
        }

        debug!("play: voice {} armed on channel {}", index, channel);
        Ok(channel)
    }

    /// Stop one voice by handle. If a completion is pending for it, the
    /// callback fires here, synchronously; the sink's trailing stop event
    /// then finds the token already claimed.
    pub fn stop(&mut self, handle: ChannelId) {
        self.sink.stop(handle);
        if let Some(slot) = self.pool.slot_by_channel(handle) {
            self.notifier.fire(slot);
        }
    }

    /// Stop every voice. Deliberately does not claim pending tokens:
    /// bulk stop is a teardown path, and completions for the silenced
    /// voices arrive only if the event path is still drained afterwards.
    pub fn stop_all(&mut self) {
        for slot in self.pool.slots() {
            self.sink.stop(slot.channel());
        }
    }

    /// Re-transpose a playing voice.
    pub fn set_pitch(&mut self, handle: ChannelId, pitch_offset: i32) {
        self.sink.set_rate(handle, pitch_scale(pitch_offset));
    }

    /// Map a 0-255 reverb intensity onto the global environmental effect.
    /// Zero detaches the effect from every voice.
    pub fn set_reverb(&mut self, level: u8) {
        self.sink.set_reverb(ReverbPreset::from_level(level));
    }

    /// Master gain, 0-255.
    pub fn set_master_gain(&mut self, gain: u8) {
        self.master_gain = gain;
        self.sink.set_master_gain(gain as f32 / 255.0);
    }

    /// The current master gain, 0-255.
    pub fn master_gain(&self) -> u8 {
        self.master_gain
    }

    /// Swap the left and right output channels.
    pub fn set_reverse_stereo(&mut self, swapped: bool) {
        self.reverse_stereo = swapped;
        self.sink.set_reverse_stereo(swapped);
    }

    /// Whether the output channels are swapped.
    pub fn reverse_stereo(&self) -> bool {
        self.reverse_stereo
    }

    /// Register the completion callback, replacing any previous one.
    /// Only one callback is registered at a time.
    pub fn register_completion_callback<F>(&mut self, callback: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.notifier.register(Box::new(callback));
    }

    /// Drain the sink's state-change events and fire completions for
    /// voices that finished. Call this on the owner thread's schedule
    /// (typically once per game tick). Returns the number of callbacks
    /// delivered.
    pub fn drain_completions(&mut self) -> usize {
        self.notifier.drain(&mut self.sink, &self.pool)
    }

    /// Whether the given handle is still playing.
    pub fn is_active(&self, handle: ChannelId) -> bool {
        self.sink.channel_state(handle) == ChannelState::Playing
    }

    /// Whether any voice is playing.
    pub fn any_active(&self) -> bool {
        self.pool
            .slots()
            .iter()
            .any(|slot| self.sink.channel_state(slot.channel()) == ChannelState::Playing)
    }

    /// Whether a play request would find a free voice right now.
    pub fn voice_available(&self) -> bool {
        self.pool.find_free(&self.sink).is_some()
    }
}
