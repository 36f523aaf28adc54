//! Integration tests: the full play/stop/completion lifecycle against a
//! scripted sink.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use slotmap::SlotMap;
use vox_core::{
    BufferKey, ChannelId, ChannelState, OutputSink, PcmData, ReverbPreset, SinkError, SinkEvent,
};
use vox_master::{PlayError, PlayParams, UNITY_SCALE, VoiceManager};

/// Scripted sink: records every call, lets tests flip channel states and
/// queue the asynchronous events a device would deliver.
struct FakeSink {
    states: Vec<ChannelState>,
    events: VecDeque<SinkEvent>,
    buffers: SlotMap<BufferKey, PcmData>,
    bound: Vec<Option<BufferKey>>,
    rates: Vec<u32>,
    positions: Vec<(f32, f32)>,
    aux_attached: Vec<bool>,
    master_gain: f32,
    reverse_stereo: bool,
    reverb: Option<ReverbPreset>,
    starts: Vec<ChannelId>,
}

impl FakeSink {
    fn new(voices: usize) -> Self {
        Self {
            states: vec![ChannelState::Initial; voices],
            events: VecDeque::new(),
            buffers: SlotMap::with_key(),
            bound: vec![None; voices],
            rates: vec![1 << 16; voices],
            positions: vec![(0.0, 0.0); voices],
            aux_attached: vec![false; voices],
            master_gain: 1.0,
            reverse_stereo: false,
            reverb: None,
            starts: Vec::new(),
        }
    }

    fn lane(&self, channel: ChannelId) -> Option<usize> {
        let index = channel.checked_sub(1)? as usize;
        (index < self.states.len()).then_some(index)
    }

    /// Simulate the device finishing a channel: state flips and the
    /// asynchronous event is queued for the next drain.
    fn finish(&mut self, channel: ChannelId) {
        let lane = self.lane(channel).unwrap();
        self.states[lane] = ChannelState::Stopped;
        self.events.push_back(SinkEvent {
            channel,
            state: ChannelState::Stopped,
        });
    }

    /// Queue a raw event without touching state.
    fn push_event(&mut self, channel: ChannelId, state: ChannelState) {
        self.events.push_back(SinkEvent { channel, state });
    }
}

impl OutputSink for FakeSink {
    fn channel_count(&self) -> usize {
        self.states.len()
    }
    fn channel_id(&self, index: usize) -> ChannelId {
        index as u32 + 1
    }
    fn channel_state(&self, channel: ChannelId) -> ChannelState {
        match self.lane(channel) {
            Some(lane) => self.states[lane],
            None => ChannelState::Stopped,
        }
    }
    fn create_buffer(&mut self, pcm: PcmData) -> Result<BufferKey, SinkError> {
        Ok(self.buffers.insert(pcm))
    }
    fn destroy_buffer(&mut self, buffer: BufferKey) {
        self.buffers.remove(buffer);
    }
    fn bind_buffer(&mut self, channel: ChannelId, buffer: BufferKey) -> Result<(), SinkError> {
        let lane = self.lane(channel).ok_or(SinkError::BadChannel(channel))?;
        if !self.buffers.contains_key(buffer) {
            return Err(SinkError::BadBuffer);
        }
        self.bound[lane] = Some(buffer);
        Ok(())
    }
    fn set_gain(&mut self, _channel: ChannelId, _gain: f32) {}
    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }
    fn set_position(&mut self, channel: ChannelId, x: f32, y: f32) {
        if let Some(lane) = self.lane(channel) {
            self.positions[lane] = (x, y);
        }
    }
    fn set_velocity(&mut self, _channel: ChannelId, _x: f32, _y: f32) {}
    fn set_rate(&mut self, channel: ChannelId, scale: u32) {
        if let Some(lane) = self.lane(channel) {
            self.rates[lane] = scale;
        }
    }
    fn set_reverse_stereo(&mut self, swapped: bool) {
        self.reverse_stereo = swapped;
    }
    fn set_reverb(&mut self, preset: Option<ReverbPreset>) {
        self.reverb = preset;
        let attach = preset.is_some();
        for send in self.aux_attached.iter_mut() {
            *send = attach;
        }
    }
    fn start(&mut self, channel: ChannelId) -> Result<(), SinkError> {
        let lane = self.lane(channel).ok_or(SinkError::BadChannel(channel))?;
        self.states[lane] = ChannelState::Playing;
        self.starts.push(channel);
        Ok(())
    }
    fn stop(&mut self, channel: ChannelId) {
        if let Some(lane) = self.lane(channel) {
            if self.states[lane] == ChannelState::Playing {
                self.events.push_back(SinkEvent {
                    channel,
                    state: ChannelState::Stopped,
                });
            }
            self.states[lane] = ChannelState::Stopped;
        }
    }
    fn poll_event(&mut self) -> Option<SinkEvent> {
        self.events.pop_front()
    }
}

/// Build a minimal 8-bit mono WAV payload.
fn wav_payload(samples: &[u8]) -> Vec<u8> {
    let data_size = samples.len() as u32;
    let mut buf = Vec::new();
    buf.extend(b"RIFF");
    buf.extend(&(36 + data_size).to_le_bytes());
    buf.extend(b"WAVE");
    buf.extend(b"fmt ");
    buf.extend(&16u32.to_le_bytes());
    buf.extend(&1u16.to_le_bytes()); // PCM
    buf.extend(&1u16.to_le_bytes()); // mono
    buf.extend(&11025u32.to_le_bytes());
    buf.extend(&11025u32.to_le_bytes());
    buf.extend(&1u16.to_le_bytes());
    buf.extend(&8u16.to_le_bytes());
    buf.extend(b"data");
    buf.extend(&data_size.to_le_bytes());
    buf.extend(samples);
    buf
}

/// A WAV the decoder parses but the engine must refuse (IEEE float).
fn float_wav_payload() -> Vec<u8> {
    let mut buf = wav_payload(&[128; 8]);
    buf[20] = 3; // format tag: IEEE float
    buf
}

fn request(payload: &[u8], token: Option<u64>) -> PlayParams<'_> {
    PlayParams {
        payload,
        pitch_offset: 0,
        angle: 0,
        distance: 0,
        priority: 0,
        token,
    }
}

fn manager(voices: usize) -> VoiceManager<FakeSink> {
    VoiceManager::new(FakeSink::new(voices)).unwrap()
}

fn counting_callback(
    manager: &mut VoiceManager<FakeSink>,
) -> (Arc<AtomicUsize>, Arc<Mutex<Vec<u64>>>) {
    let count = Arc::new(AtomicUsize::new(0));
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let (c, t) = (Arc::clone(&count), Arc::clone(&tokens));
    manager.register_completion_callback(move |token| {
        c.fetch_add(1, Ordering::SeqCst);
        t.lock().unwrap().push(token);
    });
    (count, tokens)
}

// --- Allocation ---

#[test]
fn pool_of_four_serves_four_then_exhausts() {
    let mut mgr = manager(4);
    let payload = wav_payload(&[128; 32]);

    let mut handles = Vec::new();
    for token in 0..4u64 {
        handles.push(mgr.play(request(&payload, Some(token))).unwrap());
    }

    // All four handles are distinct.
    let mut unique = handles.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 4);

    // Fifth request is refused outright, even at maximum priority
    // (priority does not preempt).
    let err = mgr
        .play(PlayParams {
            priority: 255,
            ..request(&payload, Some(99))
        })
        .unwrap_err();
    assert!(matches!(err, PlayError::NoFreeVoice));
}

#[test]
fn finished_voice_is_reusable_before_any_drain() {
    let mut mgr = manager(2);
    let payload = wav_payload(&[128; 32]);

    let first = mgr.play(request(&payload, None)).unwrap();
    let _second = mgr.play(request(&payload, None)).unwrap();
    assert!(!mgr.voice_available());

    // The device finishes the first channel; no completion drain has run,
    // but the allocator queries live state and reuses it.
    mgr.sink_mut().finish(first);
    assert!(mgr.voice_available());
    let third = mgr.play(request(&payload, None)).unwrap();
    assert_eq!(third, first);
}

#[test]
fn rejects_zero_voice_sink() {
    assert!(VoiceManager::new(FakeSink::new(0)).is_err());
    assert!(VoiceManager::new(FakeSink::new(33)).is_err());
}

// --- Pitch ---

#[test]
fn octave_offset_doubles_playback_rate() {
    let mut mgr = manager(2);
    let payload = wav_payload(&[128; 32]);

    let high = mgr
        .play(PlayParams {
            pitch_offset: 1200,
            ..request(&payload, None)
        })
        .unwrap();
    let base = mgr.play(request(&payload, None)).unwrap();

    let sink = mgr.sink();
    let high_rate = sink.rates[(high - 1) as usize];
    let base_rate = sink.rates[(base - 1) as usize];
    assert_eq!(high_rate, base_rate * 2);
    assert_eq!(base_rate, UNITY_SCALE);
}

#[test]
fn set_pitch_retunes_a_live_handle() {
    let mut mgr = manager(1);
    let payload = wav_payload(&[128; 32]);
    let handle = mgr.play(request(&payload, None)).unwrap();

    mgr.set_pitch(handle, -1200);
    assert_eq!(mgr.sink().rates[(handle - 1) as usize], UNITY_SCALE / 2);
}

// --- Positioning ---

#[test]
fn angle_zero_lands_on_positive_x() {
    let mut mgr = manager(1);
    let payload = wav_payload(&[128; 32]);
    let handle = mgr
        .play(PlayParams {
            angle: 0,
            distance: 100,
            ..request(&payload, None)
        })
        .unwrap();

    let (x, y) = mgr.sink().positions[(handle - 1) as usize];
    assert!((x - 100.0).abs() < 1e-3);
    assert!(y.abs() < 1e-3);
}

#[test]
fn negative_distance_mirrors_behind() {
    let mut mgr = manager(1);
    let payload = wav_payload(&[128; 32]);
    let handle = mgr
        .play(PlayParams {
            angle: 0,
            distance: -100,
            ..request(&payload, None)
        })
        .unwrap();

    // angle 0 at distance -100 places the sound at angle 16, distance 100.
    let (x, y) = mgr.sink().positions[(handle - 1) as usize];
    assert!((x + 100.0).abs() < 1e-3);
    assert!(y.abs() < 1e-3);
}

#[test]
fn large_angles_wrap_around_the_compass() {
    let mut mgr = manager(2);
    let payload = wav_payload(&[128; 32]);
    let a = mgr
        .play(PlayParams {
            angle: 8,
            distance: 50,
            ..request(&payload, None)
        })
        .unwrap();
    let b = mgr
        .play(PlayParams {
            angle: 8 + 32,
            distance: 50,
            ..request(&payload, None)
        })
        .unwrap();

    let sink = mgr.sink();
    assert_eq!(
        sink.positions[(a - 1) as usize],
        sink.positions[(b - 1) as usize]
    );
}

// --- Formats ---

#[test]
fn unsupported_format_is_refused_and_releases_resources() {
    let mut mgr = manager(1);
    let err = mgr.play(request(&float_wav_payload(), None)).unwrap_err();
    assert!(matches!(err, PlayError::UnsupportedFormat));

    // No sink buffer left behind, and the voice is still free.
    assert!(mgr.sink().buffers.is_empty());
    assert!(mgr.voice_available());
}

#[test]
fn garbage_payload_is_a_decode_error() {
    let mut mgr = manager(1);
    let err = mgr.play(request(b"definitely not audio", None)).unwrap_err();
    assert!(matches!(err, PlayError::Decode(_)));
}

#[test]
fn rearming_a_voice_releases_its_previous_buffer() {
    let mut mgr = manager(1);
    let payload = wav_payload(&[128; 32]);

    let first = mgr.play(request(&payload, None)).unwrap();
    assert_eq!(mgr.sink().buffers.len(), 1);
    let first_buffer = mgr.sink().bound[0].unwrap();

    mgr.sink_mut().finish(first);
    let _second = mgr.play(request(&payload, None)).unwrap();
    // The first buffer was destroyed when the slot was rearmed, and the
    // channel was started once per play.
    assert_eq!(mgr.sink().buffers.len(), 1);
    assert_ne!(mgr.sink().bound[0], Some(first_buffer));
    assert_eq!(mgr.sink().starts.len(), 2);
}

// --- Completion ---

#[test]
fn completion_token_fires_exactly_once_via_event_path() {
    let mut mgr = manager(1);
    let (count, tokens) = counting_callback(&mut mgr);
    let payload = wav_payload(&[128; 32]);

    let handle = mgr.play(request(&payload, Some(42))).unwrap();
    assert_eq!(mgr.drain_completions(), 0, "nothing finished yet");

    mgr.sink_mut().finish(handle);
    assert_eq!(mgr.drain_completions(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(*tokens.lock().unwrap(), vec![42]);

    // A duplicate event for the same channel finds the sentinel.
    mgr.sink_mut().push_event(handle, ChannelState::Stopped);
    assert_eq!(mgr.drain_completions(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn explicit_stop_races_async_event_without_double_fire() {
    let mut mgr = manager(1);
    let (count, tokens) = counting_callback(&mut mgr);
    let payload = wav_payload(&[128; 32]);

    let handle = mgr.play(request(&payload, Some(7))).unwrap();

    // Explicit stop fires synchronously; the sink also queued its own
    // stopped event, which must not fire again.
    mgr.stop(handle);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(mgr.drain_completions(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(*tokens.lock().unwrap(), vec![7]);
}

#[test]
fn voice_without_token_completes_silently() {
    let mut mgr = manager(1);
    let (count, _) = counting_callback(&mut mgr);
    let payload = wav_payload(&[128; 32]);

    let handle = mgr.play(request(&payload, None)).unwrap();
    mgr.sink_mut().finish(handle);
    assert_eq!(mgr.drain_completions(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn playing_transition_events_do_not_fire_completions() {
    let mut mgr = manager(1);
    let (count, _) = counting_callback(&mut mgr);
    let payload = wav_payload(&[128; 32]);

    let handle = mgr.play(request(&payload, Some(5))).unwrap();
    // A device may report the transition into Playing as well; that event
    // carries no completion.
    mgr.sink_mut().push_event(handle, ChannelState::Playing);
    assert_eq!(mgr.drain_completions(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(mgr.is_active(handle));
}

#[test]
fn stop_all_does_not_fire_callbacks() {
    // Bulk stop is a teardown path: tokens stay pending until (unless)
    // the event path is drained afterwards.
    let mut mgr = manager(2);
    let (count, _) = counting_callback(&mut mgr);
    let payload = wav_payload(&[128; 32]);

    mgr.play(request(&payload, Some(1))).unwrap();
    mgr.play(request(&payload, Some(2))).unwrap();

    mgr.stop_all();
    assert_eq!(count.load(Ordering::SeqCst), 0, "stop_all must not drain tokens");
    assert!(!mgr.any_active());

    // The silenced channels' events are still in the queue; a later drain
    // delivers them through the normal asynchronous path.
    assert_eq!(mgr.drain_completions(), 2);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn registering_a_new_callback_replaces_the_old() {
    let mut mgr = manager(1);
    let (old_count, _) = counting_callback(&mut mgr);
    let new_count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&new_count);
    mgr.register_completion_callback(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    let payload = wav_payload(&[128; 32]);
    let handle = mgr.play(request(&payload, Some(3))).unwrap();
    mgr.sink_mut().finish(handle);
    mgr.drain_completions();

    assert_eq!(old_count.load(Ordering::SeqCst), 0);
    assert_eq!(new_count.load(Ordering::SeqCst), 1);
}

// --- Reverb & global controls ---

#[test]
fn reverb_levels_select_presets() {
    let mut mgr = manager(2);

    mgr.set_reverb(32);
    assert_eq!(mgr.sink().reverb, Some(ReverbPreset::Light));
    mgr.set_reverb(100);
    assert_eq!(mgr.sink().reverb, Some(ReverbPreset::HeavyA));
    mgr.set_reverb(200);
    assert_eq!(mgr.sink().reverb, Some(ReverbPreset::HeavyB));
    mgr.set_reverb(255);
    assert_eq!(mgr.sink().reverb, Some(ReverbPreset::Extreme));
}

#[test]
fn reverb_zero_detaches_every_voice() {
    let mut mgr = manager(3);

    mgr.set_reverb(200);
    assert!(mgr.sink().aux_attached.iter().all(|&a| a));

    mgr.set_reverb(0);
    assert_eq!(mgr.sink().reverb, None);
    assert!(mgr.sink().aux_attached.iter().all(|&a| !a));
}

#[test]
fn master_gain_is_scaled_to_unit_range() {
    let mut mgr = manager(1);
    mgr.set_master_gain(255);
    assert_eq!(mgr.sink().master_gain, 1.0);
    mgr.set_master_gain(0);
    assert_eq!(mgr.sink().master_gain, 0.0);
    mgr.set_master_gain(128);
    assert!((mgr.sink().master_gain - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(mgr.master_gain(), 128);
}

#[test]
fn reverse_stereo_round_trips() {
    let mut mgr = manager(1);
    assert!(!mgr.reverse_stereo());
    mgr.set_reverse_stereo(true);
    assert!(mgr.sink().reverse_stereo);
    assert!(mgr.reverse_stereo());
}
