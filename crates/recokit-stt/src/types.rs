//! Core types shared between the host pipeline and engine adapters

use serde::{Deserialize, Serialize};

/// PCM format tag for the `format_tag` field (WAVE_FORMAT_PCM).
pub const WAVE_FORMAT_PCM: u16 = 1;

/// PCM audio format descriptor, matching the `WAVEFORMATEX` layout field for
/// field: 18 fixed bytes followed by `extra.len()` format-specific bytes.
///
/// The descriptor is carried byte-exact into the synthetic RIFF header an
/// adapter sends ahead of the audio, so fields keep their wire meaning even
/// where they are redundant (`avg_bytes_per_sec`, `block_align`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Trailing format-specific bytes (the region counted by `cbSize`).
    pub extra: Vec<u8>,
}

impl AudioFormat {
    /// Plain 16-bit PCM at the given rate and channel count.
    pub fn pcm16(samples_per_sec: u32, channels: u16) -> Self {
        let block_align = channels * 2;
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            samples_per_sec,
            avg_bytes_per_sec: samples_per_sec * block_align as u32,
            block_align,
            bits_per_sample: 16,
            extra: Vec::new(),
        }
    }

    /// Total serialized size of the descriptor (`18 + cbSize`).
    pub fn descriptor_len(&self) -> usize {
        18 + self.extra.len()
    }
}

/// Whether a result is still being refined or is the final read on a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Intermediate,
    Final,
}

/// A recognition result constructed by the site's result factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoResult {
    pub id: u64,
    pub kind: ResultKind,
    pub text: String,
}

/// Asynchronous service error forwarded verbatim to the site.
///
/// The adapter does not interpret `code`; it is whatever the transport
/// reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: u32,
    pub description: String,
}
