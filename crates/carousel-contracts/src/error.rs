//! Error types for the carousel workspace.
//!
//! Only setup and protocol paths are fallible. Tick reactions never error:
//! "not eligible" is a normal outcome of the per-tick decision logic, not a
//! failure.

use thiserror::Error;

/// The unified error type for the carousel crates.
#[derive(Debug, Error)]
pub enum CarouselError {
    /// A scenario configuration value is missing, malformed, or inconsistent.
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    /// A scenario file could not be read or parsed.
    #[error("failed to load scenario '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// A product kind outside the catalog was referenced.
    #[error("unknown product kind {kind}")]
    UnknownKind { kind: u8 },

    /// A requested ring dimension cannot host the simulation.
    #[error("ring setup failed: {reason}")]
    RingSetup { reason: String },

    /// The coordinator rejected a join request.
    #[error("admission rejected: {reason}")]
    AdmissionRejected { reason: String },

    /// A channel endpoint hung up while the simulation still needed it.
    ///
    /// Fatal during setup; during shutdown races it is logged and ignored.
    #[error("channel closed: {endpoint}")]
    ChannelClosed { endpoint: String },

    /// A worker thread panicked; surfaced when the simulation is joined.
    #[error("worker thread panicked: {name}")]
    WorkerPanicked { name: String },
}

/// Convenience alias used throughout the carousel crates.
pub type CarouselResult<T> = Result<T, CarouselError>;
