//! USP session controller and callback normalization
//!
//! `UspRecoEngineAdapter` owns the transport handle and drives the session
//! lifecycle: resolve configuration, open, authenticate, connect, stream,
//! close. Inbound it receives the transport's raw callbacks, recovers the
//! owning adapter state through a single resolve helper, and translates each
//! message kind into the matching site call.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::json;
use tracing::{debug, error, info, trace, warn};

use recokit_stt::{AudioFormat, EngineError, ErrorPayload, RecoEngine, RecoEngineSite};

use crate::config::{EndpointConfig, SessionConfig};
use crate::dump::DumpSink;
use crate::header::wave_header;
use crate::messages::{
    SpeechEndDetected, SpeechFragment, SpeechHypothesis, SpeechPhrase, SpeechStartDetected,
    TurnEnd, TurnStart, UspCallbacks, UspErrorMessage, USP_CALLBACK_VERSION,
};
use crate::transport::{EndpointKind, UspError, UspHandle, UspTransport};
use crate::write_buffer::WriteBuffer;

/// Process-wide adapter numbering; only disambiguates dump file names.
static INSTANCE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Knobs the host can turn before `init`.
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Coalesce audio writes into service-preferred chunks.
    pub buffered_writes: bool,
    /// Milliseconds of audio per service-preferred chunk.
    pub preferred_buffer_ms: u32,
    /// When set, mirror every outbound byte into this directory.
    pub audio_dump_dir: Option<PathBuf>,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            buffered_writes: true,
            preferred_buffer_ms: 100,
            audio_dump_dir: None,
        }
    }
}

/// State shared with the transport callback thread.
///
/// The producer thread owns everything else; callbacks only ever need the
/// site back-reference, so that is all that crosses the boundary.
struct AdapterShared {
    instance: usize,
    site: RwLock<Option<Weak<dyn RecoEngineSite>>>,
}

impl AdapterShared {
    /// Recover the adapter state a callback belongs to. This is the only
    /// place the opaque callback context is turned back into adapter state.
    fn resolve(handle: UspHandle, context: &Weak<AdapterShared>) -> Option<Arc<AdapterShared>> {
        let shared = context.upgrade();
        if shared.is_none() {
            trace!(handle = handle.raw(), "callback after adapter release, dropped");
        }
        shared
    }

    fn site(&self) -> Option<Arc<dyn RecoEngineSite>> {
        self.site.read().as_ref().and_then(Weak::upgrade)
    }

    fn with_site(&self, dispatch: impl FnOnce(&dyn RecoEngineSite)) {
        match self.site() {
            Some(site) => dispatch(site.as_ref()),
            None => error!(
                instance = self.instance,
                "recognition event dropped: no site bound"
            ),
        }
    }

    fn on_speech_start_detected(&self, message: &SpeechStartDetected) {
        self.with_site(|site| site.speech_start_detected(message.offset));
    }

    fn on_speech_end_detected(&self, message: &SpeechEndDetected) {
        self.with_site(|site| site.speech_end_detected(message.offset));
    }

    /// Hypothesis and fragment messages get the same treatment at this
    /// layer; downstream differentiation is a future refinement.
    fn intermediate_result(&self, offset: u64, text: &str) {
        self.with_site(|site| match site.result_factory() {
            Some(factory) => {
                site.intermediate_reco_result(offset, factory.intermediate_result(text))
            }
            None => error!(
                instance = self.instance,
                "site has no result factory, intermediate result dropped"
            ),
        });
    }

    fn on_speech_phrase(&self, message: &SpeechPhrase) {
        self.with_site(|site| match site.result_factory() {
            Some(factory) => site.final_reco_result(
                message.offset,
                factory.final_result(&message.display_text),
            ),
            None => error!(
                instance = self.instance,
                "site has no result factory, final result dropped"
            ),
        });
    }

    fn on_turn_start(&self, message: &TurnStart) {
        let payload = json!({
            "context": { "serviceTag": message.context_service_tag }
        });
        self.with_site(|site| site.additional_message(0, payload.clone()));
    }

    fn on_turn_end(&self, _message: &TurnEnd) {
        self.with_site(|site| site.done_processing_audio());
    }

    fn on_error(&self, message: &UspErrorMessage) {
        self.with_site(|site| {
            site.error(ErrorPayload {
                code: message.code,
                description: message.description.clone(),
            })
        });
    }
}

/// Streaming recognition engine adapter over a USP transport.
///
/// One instance per recognition session; see [`RecoEngine`] for the
/// lifecycle contract.
pub struct UspRecoEngineAdapter<T: UspTransport> {
    transport: Arc<T>,
    options: AdapterOptions,
    shared: Arc<AdapterShared>,
    callbacks: Arc<UspCallbacks>,
    handle: Option<UspHandle>,
    write_buffer: WriteBuffer,
    dump: Option<DumpSink>,
}

impl<T: UspTransport> UspRecoEngineAdapter<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_options(transport, AdapterOptions::default())
    }

    pub fn with_options(transport: Arc<T>, options: AdapterOptions) -> Self {
        let instance = INSTANCE_COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::new(AdapterShared {
            instance,
            site: RwLock::new(None),
        });
        let callbacks = Arc::new(build_callbacks(Arc::downgrade(&shared)));
        Self {
            transport,
            options,
            shared,
            callbacks,
            handle: None,
            write_buffer: WriteBuffer::new(),
            dump: None,
        }
    }

    /// Process-wide instance number of this adapter.
    pub fn instance(&self) -> usize {
        self.shared.instance
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn open_session(&self, config: &SessionConfig) -> Result<UspHandle, UspError> {
        match &config.endpoint {
            EndpointConfig::CustomUrl(url) => {
                self.transport.open_url(url, Arc::clone(&self.callbacks))
            }
            EndpointConfig::BingSpeech => self.transport.open(
                EndpointKind::BingSpeech,
                config.reco_mode,
                Arc::clone(&self.callbacks),
            ),
            EndpointConfig::Cris => self.transport.open(
                EndpointKind::Cris,
                config.reco_mode,
                Arc::clone(&self.callbacks),
            ),
            EndpointConfig::Cortana => self.transport.open(
                EndpointKind::Cortana,
                config.reco_mode,
                Arc::clone(&self.callbacks),
            ),
        }
    }

    fn configure_session(&self, handle: UspHandle, config: &SessionConfig) -> Result<(), UspError> {
        if let Some((kind, data)) = config.auth.as_parts() {
            self.transport.set_authentication(handle, kind, data)?;
        }
        if let Some(language) = &config.language {
            self.transport.set_language(handle, language)?;
        }
        if let Some(model_id) = &config.model_id {
            self.transport.set_model_id(handle, model_id)?;
        }
        self.transport.connect(handle)
    }

    /// Send bytes straight to the transport, bypassing the chunk buffer.
    /// The RIFF header takes this path so it can never be split.
    fn forward_unbuffered(&mut self, data: &[u8]) -> Result<(), EngineError> {
        let handle = self.handle.ok_or(EngineError::Uninitialized)?;
        let Self {
            transport, dump, ..
        } = self;
        let mut sink = transport_sink(transport.as_ref(), handle, dump);
        sink(data).map_err(EngineError::from)
    }

    fn flush(&mut self) -> Result<(), EngineError> {
        let handle = self.handle.ok_or(EngineError::Uninitialized)?;
        let Self {
            transport,
            dump,
            write_buffer,
            ..
        } = self;
        let mut sink = transport_sink(transport.as_ref(), handle, dump);
        write_buffer.flush(&mut sink).map_err(EngineError::from)
    }
}

impl<T: UspTransport> RecoEngine for UspRecoEngineAdapter<T> {
    fn bind_site(&mut self, site: &Arc<dyn RecoEngineSite>) {
        *self.shared.site.write() = Some(Arc::downgrade(site));
    }

    fn init(&mut self) -> Result<(), EngineError> {
        let site = self.shared.site().ok_or(EngineError::Uninitialized)?;
        if self.handle.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }

        let properties = site
            .named_properties()
            .ok_or(EngineError::UnexpectedSiteFailure)?;
        let config = SessionConfig::from_properties(properties.as_ref());
        debug!(
            instance = self.shared.instance,
            endpoint = ?config.endpoint.kind(),
            mode = ?config.reco_mode,
            "opening usp session"
        );

        let handle = self.open_session(&config).map_err(EngineError::from)?;

        if let Err(err) = self.configure_session(handle, &config) {
            // Leave the adapter retryable: release the half-open session and
            // keep the handle unset.
            if let Err(close_err) = self.transport.close(handle) {
                warn!(%close_err, "close after failed init");
            }
            return Err(err.into());
        }

        self.handle = Some(handle);

        if let Some(dir) = &self.options.audio_dump_dir {
            match DumpSink::create(dir, self.shared.instance) {
                Ok(sink) => self.dump = Some(sink),
                Err(err) => warn!(%err, "audio dump unavailable, continuing without it"),
            }
        }

        info!(
            instance = self.shared.instance,
            handle = handle.raw(),
            "usp session open"
        );
        Ok(())
    }

    fn term(&mut self) -> Result<(), EngineError> {
        debug!(instance = self.shared.instance, "terminating usp session");

        let result = match self.handle.take() {
            Some(handle) => self.transport.close(handle).map_err(EngineError::from),
            None => Ok(()),
        };

        // The session is over either way; drop any residue and the mirror.
        self.write_buffer = WriteBuffer::new();
        self.dump = None;
        result
    }

    fn set_format(&mut self, format: Option<&AudioFormat>) -> Result<(), EngineError> {
        if self.handle.is_none() {
            return Err(EngineError::Uninitialized);
        }

        match format {
            Some(format) => {
                let header = wave_header(format);
                self.forward_unbuffered(&header)?;

                let chunk_size = format.samples_per_sec as usize
                    * format.block_align as usize
                    * self.options.preferred_buffer_ms as usize
                    / 1000;
                self.write_buffer
                    .configure(chunk_size, self.options.buffered_writes);
                debug!(
                    instance = self.shared.instance,
                    chunk_size,
                    mode = ?self.write_buffer.mode(),
                    "audio format installed"
                );
            }
            // A null format is the end-of-stream signal.
            None => self.flush()?,
        }
        Ok(())
    }

    fn process_audio(&mut self, data: &[u8]) -> Result<(), EngineError> {
        let handle = self.handle.ok_or(EngineError::Uninitialized)?;
        let Self {
            transport,
            dump,
            write_buffer,
            ..
        } = self;
        let mut sink = transport_sink(transport.as_ref(), handle, dump);
        write_buffer.write(data, &mut sink).map_err(EngineError::from)
    }
}

/// Sink that writes to the transport and mirrors into the dump file.
///
/// The transport reports zero-byte writes as `WriteAudio` errors, but a
/// zero-byte write is the only flush signal it has; that case is remapped
/// to success.
fn transport_sink<'a, T: UspTransport + ?Sized>(
    transport: &'a T,
    handle: UspHandle,
    dump: &'a mut Option<DumpSink>,
) -> impl FnMut(&[u8]) -> Result<(), UspError> + 'a {
    move |bytes: &[u8]| {
        let result = match transport.write_audio(handle, bytes) {
            Err(UspError::WriteAudio(_)) if bytes.is_empty() => Ok(()),
            other => other,
        };
        if let Some(sink) = dump.as_mut() {
            sink.write(bytes);
        }
        result
    }
}

fn build_callbacks(context: Weak<AdapterShared>) -> UspCallbacks {
    let ctx = context;
    UspCallbacks {
        version: USP_CALLBACK_VERSION,
        on_speech_start_detected: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &SpeechStartDetected| {
                trace!(
                    handle = handle.raw(),
                    offset = message.offset,
                    "Speech.StartDetected"
                );
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.on_speech_start_detected(message);
                }
            })
        },
        on_speech_end_detected: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &SpeechEndDetected| {
                trace!(
                    handle = handle.raw(),
                    offset = message.offset,
                    "Speech.EndDetected"
                );
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.on_speech_end_detected(message);
                }
            })
        },
        on_speech_hypothesis: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &SpeechHypothesis| {
                trace!(
                    handle = handle.raw(),
                    offset = message.offset,
                    duration = message.duration,
                    text = %message.text,
                    "Speech.Hypothesis"
                );
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.intermediate_result(message.offset, &message.text);
                }
            })
        },
        on_speech_fragment: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &SpeechFragment| {
                trace!(
                    handle = handle.raw(),
                    offset = message.offset,
                    duration = message.duration,
                    text = %message.text,
                    "Speech.Fragment"
                );
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.intermediate_result(message.offset, &message.text);
                }
            })
        },
        on_speech_phrase: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &SpeechPhrase| {
                trace!(
                    handle = handle.raw(),
                    status = message.recognition_status,
                    offset = message.offset,
                    text = %message.display_text,
                    "Speech.Phrase"
                );
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.on_speech_phrase(message);
                }
            })
        },
        on_turn_start: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &TurnStart| {
                trace!(
                    handle = handle.raw(),
                    service_tag = %message.context_service_tag,
                    "Turn.Start"
                );
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.on_turn_start(message);
                }
            })
        },
        on_turn_end: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &TurnEnd| {
                trace!(handle = handle.raw(), "Turn.End");
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.on_turn_end(message);
                }
            })
        },
        on_error: {
            let ctx = ctx.clone();
            Box::new(move |handle, message: &UspErrorMessage| {
                trace!(
                    handle = handle.raw(),
                    code = message.code,
                    description = %message.description,
                    "Error"
                );
                if let Some(shared) = AdapterShared::resolve(handle, &ctx) {
                    shared.on_error(message);
                }
            })
        },
    }
}
