//! Speech-to-text abstraction layer for RecoKit
//!
//! This crate defines the host-facing contracts a recognition engine adapter
//! is built against: the site interface that consumes recognition events, the
//! capability services the site can hand out (named properties, result
//! factory), and the engine-adapter trait itself. It knows nothing about any
//! particular transport or cloud service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub mod error;
pub mod types;

pub use error::EngineError;
pub use types::{AudioFormat, ErrorPayload, RecoResult, ResultKind};

/// Generates unique recognition-result ids
static RESULT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a process-wide unique result id
pub fn next_result_id() -> u64 {
    RESULT_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Opaque key -> string property store supplied by the site.
///
/// Keys are matched case-sensitively; an unset key reads as an empty string.
pub trait NamedProperties: Send + Sync {
    fn string_value(&self, key: &str) -> String;
}

/// Constructs recognition results from raw text.
///
/// The adapter never retains result state; every hypothesis or phrase coming
/// off the wire is turned into a fresh `RecoResult` through this factory.
pub trait RecoResultFactory: Send + Sync {
    fn intermediate_result(&self, text: &str) -> RecoResult;
    fn final_result(&self, text: &str) -> RecoResult;
}

/// The host object that owns an engine adapter.
///
/// The adapter holds a non-owning (weak) back-reference to its site and calls
/// these methods from the transport callback thread, in the order the
/// transport delivered the underlying messages. Offsets are in 100-ns ticks.
pub trait RecoEngineSite: Send + Sync {
    fn speech_start_detected(&self, offset: u64);
    fn speech_end_detected(&self, offset: u64);
    fn intermediate_reco_result(&self, offset: u64, result: RecoResult);
    fn final_reco_result(&self, offset: u64, result: RecoResult);
    /// Carrier for messages with no dedicated site call; `payload` is opaque.
    fn additional_message(&self, offset: u64, payload: serde_json::Value);
    fn done_processing_audio(&self);
    fn error(&self, payload: ErrorPayload);

    /// Capability query: named-properties service, if the site provides one.
    fn named_properties(&self) -> Option<Arc<dyn NamedProperties>>;
    /// Capability query: result factory, if the site provides one.
    fn result_factory(&self) -> Option<Arc<dyn RecoResultFactory>>;
}

/// A streaming recognition engine adapter, as seen by the host pipeline.
///
/// Lifecycle: constructed detached, `bind_site` once, `init` once, any number
/// of `set_format` / `process_audio` calls, then `term`.
pub trait RecoEngine {
    /// Attach the owning site. The adapter keeps only a weak reference.
    fn bind_site(&mut self, site: &Arc<dyn RecoEngineSite>);

    /// Open the session. Fails with `Uninitialized` when no site is bound and
    /// `AlreadyInitialized` on a second call.
    fn init(&mut self) -> Result<(), EngineError>;

    /// Close the session. Safe to call again after the handle is gone.
    fn term(&mut self) -> Result<(), EngineError>;

    /// `Some(format)` starts (or restarts) an audio stream; `None` signals
    /// end-of-stream and flushes any buffered audio.
    fn set_format(&mut self, format: Option<&AudioFormat>) -> Result<(), EngineError>;

    /// Forward raw PCM bytes. An empty slice is a flush request.
    fn process_audio(&mut self, data: &[u8]) -> Result<(), EngineError>;
}
