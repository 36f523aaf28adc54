//! Completion notification: correlating sink stop events back to tokens.

use alloc::boxed::Box;

use vox_core::{OutputSink, SinkEvent};

use crate::pool::{VoicePool, VoiceSlot};

/// The registered completion callback. Receives the caller-supplied token
/// of a voice that finished playing.
pub type CompletionFn = Box<dyn FnMut(u64) + Send>;

/// Delivers each pending completion token at most once.
///
/// The callback is an injected capability owned by whoever owns the
/// notifier, not process-wide state, so independent audio subsystems and
/// tests cannot cross-contaminate. Only one callback is registered at a
/// time; registering another replaces it.
#[derive(Default)]
pub struct CompletionNotifier {
    callback: Option<CompletionFn>,
}

impl CompletionNotifier {
    pub fn new() -> Self {
        Self { callback: None }
    }

    /// Register the completion callback, replacing any previous one.
    pub fn register(&mut self, callback: CompletionFn) {
        self.callback = Some(callback);
    }

    /// Claim a slot's pending token and deliver it.
    ///
    /// Returns true if a token was claimed. The claim happens whether or
    /// not a callback is registered — an unclaimed token would otherwise
    /// fire spuriously once a callback appears. Two detections racing for
    /// the same slot resolve through the atomic claim: the loser observes
    /// the sentinel and delivers nothing.
    pub fn fire(&mut self, slot: &VoiceSlot) -> bool {
        match slot.take_token() {
            Some(token) => {
                if let Some(callback) = self.callback.as_mut() {
                    callback(token);
                }
                true
            }
            None => false,
        }
    }

    /// Drain the sink's pending state-transition events, delivering
    /// completions for channels that reached a terminal state. Events
    /// reporting a transition *into* Playing carry no completion and are
    /// skipped. Returns the number of tokens claimed.
    pub fn drain(&mut self, sink: &mut impl OutputSink, pool: &VoicePool) -> usize {
        let mut fired = 0;
        while let Some(SinkEvent { channel, state }) = sink.poll_event() {
            if !state.is_terminal() {
                continue;
            }
            if let Some(slot) = pool.slot_by_channel(channel) {
                if self.fire(slot) {
                    fired += 1;
                }
            }
        }
        fired
    }
}
