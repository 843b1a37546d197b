//! Per-instance mirror of the outbound audio stream
//!
//! Debug aid: every byte handed to the transport is also appended to
//! `uspaudiodump_<N>.wav`. Despite the extension the file is the raw byte
//! stream (header with zero sizes plus PCM frames), not a well-formed WAV;
//! the declared sizes are never patched.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

pub struct DumpSink {
    path: PathBuf,
    file: File,
}

impl DumpSink {
    /// `instance` is the process-wide adapter number; it only keeps files of
    /// concurrent adapters from colliding.
    pub fn create(dir: &Path, instance: usize) -> std::io::Result<Self> {
        let path = dir.join(format!("uspaudiodump_{instance}.wav"));
        let file = File::create(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mirror outbound bytes. Failures degrade to a warning; the dump must
    /// never disturb the audio path.
    pub fn write(&mut self, data: &[u8]) {
        if let Err(err) = self.file.write_all(data) {
            warn!(path = %self.path.display(), %err, "audio dump write failed");
        }
    }
}
