//! Typed recognition messages and the callback table
//!
//! The transport parses the wire protocol and hands the adapter one of eight
//! message kinds through a fixed-shape callback table. Offsets and durations
//! are in 100-ns ticks.

use crate::transport::UspHandle;

/// Version tag carried by every callback table.
pub const USP_CALLBACK_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechStartDetected {
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEndDetected {
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechHypothesis {
    pub text: String,
    pub offset: u64,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechFragment {
    pub text: String,
    pub offset: u64,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechPhrase {
    pub recognition_status: u32,
    pub display_text: String,
    pub offset: u64,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnStart {
    pub context_service_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEnd;

/// Asynchronous service error delivered through the error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UspErrorMessage {
    pub code: u32,
    pub description: String,
}

/// One entry of the callback table.
pub type UspCallback<M> = Box<dyn Fn(UspHandle, &M) + Send + Sync>;

/// Fixed-shape callback table registered with the transport at open time.
///
/// Populated once per adapter at construction and never mutated afterward;
/// the transport invokes entries from its own thread(s).
pub struct UspCallbacks {
    pub version: u16,
    pub on_speech_start_detected: UspCallback<SpeechStartDetected>,
    pub on_speech_end_detected: UspCallback<SpeechEndDetected>,
    pub on_speech_hypothesis: UspCallback<SpeechHypothesis>,
    pub on_speech_fragment: UspCallback<SpeechFragment>,
    pub on_speech_phrase: UspCallback<SpeechPhrase>,
    pub on_turn_start: UspCallback<TurnStart>,
    pub on_turn_end: UspCallback<TurnEnd>,
    pub on_error: UspCallback<UspErrorMessage>,
}

impl std::fmt::Debug for UspCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UspCallbacks")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
