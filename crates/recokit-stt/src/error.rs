use thiserror::Error;

/// Errors surfaced by a recognition engine adapter at its call sites.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The operation requires an open session (or a bound site) and there
    /// is none.
    #[error("engine adapter is not initialized")]
    Uninitialized,

    /// `init` was called on an adapter that already has an open session.
    #[error("engine adapter is already initialized")]
    AlreadyInitialized,

    /// The site did not provide a capability the adapter requires.
    #[error("required site capability is unavailable")]
    UnexpectedSiteFailure,

    /// A failure bubbled up from the underlying transport.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}
