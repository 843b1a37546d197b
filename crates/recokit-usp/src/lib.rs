//! USP cloud speech engine adapter for RecoKit
//!
//! Bridges a host recognizer pipeline (raw PCM in, recognition events out)
//! and a Unified Speech Protocol client library. The adapter resolves which
//! endpoint, mode, auth, language and model to use from the site's named
//! properties, frames the PCM into a synthetic RIFF/WAVE stream, coalesces
//! writes into service-preferred chunks, and normalizes the transport's
//! asynchronous callbacks onto the [`recokit_stt::RecoEngineSite`] interface.

pub mod adapter;
pub mod config;
pub mod dump;
pub mod header;
pub mod messages;
pub mod transport;
pub mod write_buffer;

pub use adapter::{AdapterOptions, UspRecoEngineAdapter};
pub use config::{AuthConfig, EndpointConfig, SessionConfig};
pub use header::wave_header;
pub use transport::{AuthKind, EndpointKind, RecoMode, UspError, UspHandle, UspTransport};
pub use write_buffer::{WriteBuffer, WriteMode};
