//! Abstract surface of the USP client library
//!
//! The adapter drives the transport exclusively through this trait; the wire
//! protocol behind it is opaque. Recognition messages come back through the
//! callback table registered at `open` time (see [`crate::messages`]).

use std::sync::Arc;

use thiserror::Error;

use crate::messages::UspCallbacks;

/// Opaque session handle issued by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UspHandle(u64);

impl UspHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Service entry points the transport can open without a caller-supplied URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    BingSpeech,
    Cris,
    Cortana,
}

/// Hint to the service about expected utterance shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoMode {
    Interactive,
    Conversation,
    Dictation,
    Unknown,
}

/// Authentication scheme applied to a freshly opened session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    SubscriptionKey,
    AuthToken,
    RpsToken,
}

/// Failures reported by transport operations.
#[derive(Debug, Error)]
pub enum UspError {
    #[error("failed to open session: {0}")]
    Open(String),

    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("session configuration rejected: {0}")]
    Configure(String),

    #[error("connect failed: {0}")]
    Connect(String),

    /// Also returned by transports for zero-byte writes; the adapter remaps
    /// that case to success when the write was a flush carrier.
    #[error("audio write failed: {0}")]
    WriteAudio(String),

    #[error("close failed: {0}")]
    Close(String),
}

impl From<UspError> for recokit_stt::EngineError {
    fn from(err: UspError) -> Self {
        recokit_stt::EngineError::Transport(Box::new(err))
    }
}

/// The USP client library, as consumed by the adapter.
///
/// Implementations must serialize callbacks for a single handle with respect
/// to each other, but not with respect to the calling (producer) thread.
pub trait UspTransport: Send + Sync {
    /// Open a session against a well-known endpoint.
    fn open(
        &self,
        endpoint: EndpointKind,
        mode: RecoMode,
        callbacks: Arc<UspCallbacks>,
    ) -> Result<UspHandle, UspError>;

    /// Open a session against a caller-supplied URL. No reco mode applies.
    fn open_url(&self, url: &str, callbacks: Arc<UspCallbacks>) -> Result<UspHandle, UspError>;

    fn set_authentication(
        &self,
        handle: UspHandle,
        kind: AuthKind,
        data: &str,
    ) -> Result<(), UspError>;

    fn set_language(&self, handle: UspHandle, language: &str) -> Result<(), UspError>;

    fn set_model_id(&self, handle: UspHandle, model_id: &str) -> Result<(), UspError>;

    fn connect(&self, handle: UspHandle) -> Result<(), UspError>;

    fn write_audio(&self, handle: UspHandle, data: &[u8]) -> Result<(), UspError>;

    /// Close the session. Must synchronize against in-flight callbacks
    /// before returning.
    fn close(&self, handle: UspHandle) -> Result<(), UspError>;
}
