use thiserror::Error;

/// Raised by [`crate::config::Configuration::new`] when an option is out of its
/// documented range. Surfaced at construction time, never at `start()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("interval_ms must be >= 1, got {0}")]
    IntervalTooSmall(u64),
    #[error("max_managed_depth must be in 1..=1024, got {0}")]
    ManagedDepthOutOfRange(usize),
    #[error("max_native_depth must be in 1..=512, got {0}")]
    NativeDepthOutOfRange(usize),
    #[error("ring_capacity must be a power of two in 1..=65536, got {0}")]
    RingCapacityInvalid(usize),
}

/// Raised by [`crate::session::Session::start`]. The underlying OS error is
/// preserved so callers can distinguish e.g. `EAGAIN` from `ENOMEM`.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("a session is already running")]
    AlreadyRunning,
    #[error("failed to install signal handler: {0}")]
    SignalInstall(#[source] std::io::Error),
    #[error("failed to arm sampling timer: {0}")]
    TimerArm(#[source] std::io::Error),
    #[error("failed to spawn collector thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

/// Raised by [`crate::session::Session::stop`]. The profile for samples already
/// collected is still returned alongside this error where possible.
#[derive(Debug, Error)]
pub enum StopError {
    #[error("session was not running")]
    NotRunning,
    #[error("failed to disarm sampling timer: {0}")]
    TimerDisarm(#[source] std::io::Error),
    #[error("collector thread panicked")]
    CollectorPanicked,
}
