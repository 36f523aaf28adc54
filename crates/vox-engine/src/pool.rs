//! Fixed pool of voice slots and the first-fit allocator.

use core::sync::atomic::{AtomicU64, Ordering};

use vox_core::{BufferKey, ChannelId, OutputSink};

/// Maximum number of voices a pool can hold.
pub const MAX_VOICES: usize = 32;

/// Token value meaning "no completion callback owed".
pub const NO_TOKEN: u64 = u64::MAX;

/// One playback channel's bookkeeping: the sink handle it drives, the
/// buffer currently bound to it, and the pending completion token.
///
/// The token is atomic because completion can be claimed from the event
/// drain while an explicit stop races it; whichever reads the non-sentinel
/// value first owns delivery.
pub struct VoiceSlot {
    channel: ChannelId,
    buffer: Option<BufferKey>,
    token: AtomicU64,
}

impl VoiceSlot {
    fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            buffer: None,
            token: AtomicU64::new(NO_TOKEN),
        }
    }

    /// The sink channel this slot drives.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// The sink buffer currently bound to the channel, if any.
    pub fn buffer(&self) -> Option<BufferKey> {
        self.buffer
    }

    /// Record the completion token for a freshly started sound.
    /// `None` stores the sentinel: the caller wants no callback.
    pub fn set_token(&self, token: Option<u64>) {
        self.token.store(token.unwrap_or(NO_TOKEN), Ordering::Release);
    }

    /// Claim the pending token, resetting it to the sentinel.
    ///
    /// At most one caller observes `Some` per recorded token, which is
    /// what makes completion delivery idempotent when the explicit-stop
    /// path and the asynchronous event path race.
    pub fn take_token(&self) -> Option<u64> {
        match self.token.swap(NO_TOKEN, Ordering::AcqRel) {
            NO_TOKEN => None,
            token => Some(token),
        }
    }

    /// Whether a callback is still owed for this slot.
    pub fn has_pending(&self) -> bool {
        self.token.load(Ordering::Acquire) != NO_TOKEN
    }
}

/// Fixed-size array of voice slots, one per sink channel.
///
/// The pool never resizes after construction and holds no free-list: the
/// allocator asks the sink for live channel state on every scan.
pub struct VoicePool {
    slots: heapless::Vec<VoiceSlot, MAX_VOICES>,
}

impl VoicePool {
    /// Build a pool covering the sink's channels, capped at [`MAX_VOICES`].
    pub fn new(sink: &impl OutputSink) -> Self {
        let mut slots = heapless::Vec::new();
        for index in 0..sink.channel_count().min(MAX_VOICES) {
            let _ = slots.push(VoiceSlot::new(sink.channel_id(index)));
        }
        Self { slots }
    }

    /// Number of slots in the pool.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the pool holds no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Get a slot by pool index.
    pub fn slot(&self, index: usize) -> Option<&VoiceSlot> {
        self.slots.get(index)
    }

    /// All slots in pool order.
    pub fn slots(&self) -> &[VoiceSlot] {
        &self.slots
    }

    /// Find the slot driving the given sink channel.
    pub fn slot_by_channel(&self, channel: ChannelId) -> Option<&VoiceSlot> {
        self.slots.iter().find(|slot| slot.channel == channel)
    }

    /// First-fit allocation: the lowest-indexed slot whose sink channel is
    /// not Playing. Queries the sink live for every candidate, so a voice
    /// that just ran out is reusable before its event has been drained.
    /// `None` means the request should be dropped; there is no stealing
    /// and no queueing.
    pub fn find_free(&self, sink: &impl OutputSink) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| sink.channel_state(slot.channel).is_terminal())
    }

    /// Bind a new buffer to a slot, returning the previous one so the
    /// caller can release it with the sink.
    pub fn replace_buffer(&mut self, index: usize, buffer: BufferKey) -> Option<BufferKey> {
        let slot = &mut self.slots[index];
        slot.buffer.replace(buffer)
    }
}
