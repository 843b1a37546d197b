//! Synthetic RIFF/WAVE header for the outbound audio stream
//!
//! The service expects an audio stream that opens like a WAV file. Because
//! the stream length is unknown when the header goes out, the RIFF and data
//! chunk sizes are written as zero and are never back-patched; the service
//! treats them as informational.

use recokit_stt::AudioFormat;

const TAG_RIFF: &[u8; 4] = b"RIFF";
const TAG_WAVE: &[u8; 4] = b"WAVE";
const TAG_FMT: &[u8; 4] = b"fmt ";
const TAG_DATA: &[u8; 4] = b"data";

/// Render the header that precedes every PCM byte of a session.
///
/// All numeric fields are little-endian regardless of host; the format
/// descriptor is embedded verbatim.
pub fn wave_header(format: &AudioFormat) -> Vec<u8> {
    let cb_format = format.descriptor_len() as u32;
    let mut header = Vec::with_capacity(28 + cb_format as usize);

    header.extend_from_slice(TAG_RIFF);
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(TAG_WAVE);

    header.extend_from_slice(TAG_FMT);
    header.extend_from_slice(&cb_format.to_le_bytes());
    write_descriptor(&mut header, format);

    header.extend_from_slice(TAG_DATA);
    header.extend_from_slice(&0u32.to_le_bytes());

    header
}

fn write_descriptor(out: &mut Vec<u8>, format: &AudioFormat) {
    out.extend_from_slice(&format.format_tag.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.samples_per_sec.to_le_bytes());
    out.extend_from_slice(&format.avg_bytes_per_sec.to_le_bytes());
    out.extend_from_slice(&format.block_align.to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    out.extend_from_slice(&(format.extra.len() as u16).to_le_bytes());
    out.extend_from_slice(&format.extra);
}
