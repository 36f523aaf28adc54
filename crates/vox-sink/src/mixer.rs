//! Software mixing core, run inside the output stream callback.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use ringbuf::traits::{Consumer, Producer};
use ringbuf::{HeapCons, HeapProd};
use vox_core::{ChannelState, PcmData, ReverbParams, ReverbPreset, SinkEvent};

/// Channel handles start at 1 so a zeroed handle is never valid.
pub(crate) const CHANNEL_BASE: u32 = 1;

/// Beyond this distance a voice is fully attenuated (linear model).
pub(crate) const MAX_DISTANCE: f32 = 255.0;

/// Atomic encodings of [`ChannelState`].
pub(crate) const STATE_INITIAL: u8 = 0;
pub(crate) const STATE_STOPPED: u8 = 1;
pub(crate) const STATE_PLAYING: u8 = 2;

pub(crate) fn decode_state(value: u8) -> ChannelState {
    match value {
        STATE_PLAYING => ChannelState::Playing,
        STATE_STOPPED => ChannelState::Stopped,
        _ => ChannelState::Initial,
    }
}

/// Control-side instructions applied by the mixer between output frames.
pub(crate) enum LaneCommand {
    Bind { lane: usize, pcm: Arc<PcmData> },
    SetGain { lane: usize, gain: f32 },
    SetPosition { lane: usize, x: f32, y: f32 },
    SetRate { lane: usize, scale: u32 },
    Start { lane: usize },
    Stop { lane: usize },
    SetMasterGain(f32),
    SetReverseStereo(bool),
    SetReverb(Option<ReverbPreset>),
}

/// One playback channel as the mixer sees it.
struct Lane {
    pcm: Option<Arc<PcmData>>,
    /// Source position, 16 fractional bits.
    cursor: u64,
    /// Rate scale from the engine, 16.16.
    scale: u32,
    /// Source frames per output frame, 16.16; scale × rate ratio.
    step: u64,
    gain: f32,
    pan_left: f32,
    pan_right: f32,
    attenuation: f32,
    aux_send: bool,
    playing: bool,
}

impl Lane {
    fn new() -> Self {
        Self {
            pcm: None,
            cursor: 0,
            scale: 1 << 16,
            step: 0,
            gain: 1.0,
            pan_left: std::f32::consts::FRAC_1_SQRT_2,
            pan_right: std::f32::consts::FRAC_1_SQRT_2,
            attenuation: 1.0,
            aux_send: false,
            playing: false,
        }
    }

    /// The cursor step folds the payload/output rate ratio into the
    /// engine's rate scale; recomputed whenever either input changes.
    fn update_step(&mut self, output_rate: u32) {
        self.step = match &self.pcm {
            Some(pcm) => self.scale as u64 * pcm.sample_rate as u64 / output_rate as u64,
            None => 0,
        };
    }

    /// Update cached spatialization from a listener-relative offset:
    /// +x pans right, distance attenuates linearly out to MAX_DISTANCE.
    fn update_position(&mut self, x: f32, y: f32) {
        let distance = (x * x + y * y).sqrt();
        self.attenuation = (1.0 - distance / MAX_DISTANCE).clamp(0.0, 1.0);

        let pan = if distance > f32::EPSILON { x / distance } else { 0.0 };
        let theta = (pan + 1.0) * std::f32::consts::FRAC_PI_4;
        self.pan_left = theta.cos();
        self.pan_right = theta.sin();
    }
}

/// Single global feedback-delay reverb fed by every lane's auxiliary send.
struct ReverbUnit {
    buf: Vec<f32>,
    pos: usize,
    feedback: f32,
    wet: f32,
}

impl ReverbUnit {
    fn new(params: &ReverbParams, sample_rate: u32) -> Self {
        let delay = (params.reflections_delay + params.late_delay).max(0.005);
        let len = ((delay * sample_rate as f32) as usize).max(1);
        // Feedback chosen so the tail decays by 60 dB over decay_time.
        let feedback = 10f32.powf(-3.0 * delay / params.decay_time);
        let wet = params.gain * params.late_gain.min(1.0);
        Self {
            buf: vec![0.0; len],
            pos: 0,
            feedback,
            wet,
        }
    }

    /// One-sample recurrence: read the delayed tap, refill with the
    /// current send plus feedback.
    fn process(&mut self, input: f32) -> f32 {
        let tap = self.buf[self.pos];
        self.buf[self.pos] = input + tap * self.feedback;
        self.pos = (self.pos + 1) % self.buf.len();
        tap * self.wet
    }
}

/// The mixer owns lane state and drains control commands between frames.
/// It is the only writer of sample data and the producer of state-change
/// events.
pub(crate) struct Mixer {
    lanes: Vec<Lane>,
    commands: HeapCons<LaneCommand>,
    events: HeapProd<SinkEvent>,
    states: Arc<[AtomicU8]>,
    output_rate: u32,
    master_gain: f32,
    reverse_stereo: bool,
    reverb: Option<ReverbUnit>,
}

impl Mixer {
    pub(crate) fn new(
        voices: usize,
        commands: HeapCons<LaneCommand>,
        events: HeapProd<SinkEvent>,
        states: Arc<[AtomicU8]>,
        output_rate: u32,
    ) -> Self {
        Self {
            lanes: (0..voices).map(|_| Lane::new()).collect(),
            commands,
            events,
            states,
            output_rate,
            master_gain: 1.0,
            reverse_stereo: false,
            reverb: None,
        }
    }

    fn publish_state(&mut self, lane: usize, value: u8) {
        self.states[lane].store(value, Ordering::Release);
        let event = SinkEvent {
            channel: lane as u32 + CHANNEL_BASE,
            state: decode_state(value),
        };
        // A full event ring drops the oldest information first in spirit:
        // we drop the new event and the control side keeps the last state
        // via the atomics.
        let _ = self.events.try_push(event);
    }

    fn apply(&mut self, command: LaneCommand) {
        match command {
            LaneCommand::Bind { lane, pcm } => {
                let rate = self.output_rate;
                let l = &mut self.lanes[lane];
                l.pcm = Some(pcm);
                l.cursor = 0;
                l.update_step(rate);
            }
            LaneCommand::SetGain { lane, gain } => {
                self.lanes[lane].gain = gain.clamp(0.0, 1.0);
            }
            LaneCommand::SetPosition { lane, x, y } => {
                self.lanes[lane].update_position(x, y);
            }
            LaneCommand::SetRate { lane, scale } => {
                let rate = self.output_rate;
                let l = &mut self.lanes[lane];
                l.scale = scale;
                l.update_step(rate);
            }
            LaneCommand::Start { lane } => {
                let ready = {
                    let l = &mut self.lanes[lane];
                    l.cursor = 0;
                    l.playing = l.pcm.as_ref().is_some_and(|pcm| !pcm.is_empty());
                    l.playing
                };
                if ready {
                    self.publish_state(lane, STATE_PLAYING);
                } else {
                    // Starting an unbound or empty channel ends instantly.
                    self.publish_state(lane, STATE_STOPPED);
                }
            }
            LaneCommand::Stop { lane } => {
                if self.lanes[lane].playing {
                    self.lanes[lane].playing = false;
                    self.publish_state(lane, STATE_STOPPED);
                }
            }
            LaneCommand::SetMasterGain(gain) => {
                self.master_gain = gain.clamp(0.0, 1.0);
            }
            LaneCommand::SetReverseStereo(swapped) => {
                self.reverse_stereo = swapped;
            }
            LaneCommand::SetReverb(preset) => {
                self.reverb = preset.map(|p| ReverbUnit::new(p.params(), self.output_rate));
                let attach = preset.is_some();
                for lane in self.lanes.iter_mut() {
                    lane.aux_send = attach;
                }
            }
        }
    }

    /// Fill an interleaved output buffer. Channels beyond stereo are
    /// zeroed.
    pub(crate) fn process(&mut self, data: &mut [f32], channels: usize) {
        while let Some(command) = self.commands.try_pop() {
            self.apply(command);
        }

        for frame in data.chunks_mut(channels) {
            let mut left = 0.0f32;
            let mut right = 0.0f32;
            let mut send = 0.0f32;

            for (index, lane) in self.lanes.iter_mut().enumerate() {
                if !lane.playing {
                    continue;
                }
                let Some(pcm) = lane.pcm.as_ref() else {
                    continue;
                };

                let (l16, r16) = pcm.frames.sample_at(lane.cursor);
                let l = l16 as f32 / 32768.0;
                let r = r16 as f32 / 32768.0;
                let level = lane.gain * lane.attenuation;

                left += l * level * lane.pan_left;
                right += r * level * lane.pan_right;
                if lane.aux_send {
                    send += (l + r) * 0.5 * level;
                }

                lane.cursor += lane.step;
                if (lane.cursor >> 16) as usize >= pcm.len() {
                    lane.playing = false;
                    self.states[index].store(STATE_STOPPED, Ordering::Release);
                    let _ = self.events.try_push(SinkEvent {
                        channel: index as u32 + CHANNEL_BASE,
                        state: ChannelState::Stopped,
                    });
                }
            }

            if let Some(reverb) = self.reverb.as_mut() {
                let tail = reverb.process(send);
                left += tail;
                right += tail;
            }

            let (mut out_l, mut out_r) = (left * self.master_gain, right * self.master_gain);
            if self.reverse_stereo {
                std::mem::swap(&mut out_l, &mut out_r);
            }

            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = match channel {
                    0 => out_l.clamp(-1.0, 1.0),
                    1 => out_r.clamp(-1.0, 1.0),
                    _ => 0.0,
                };
            }
        }
    }
}
