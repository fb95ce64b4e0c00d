use crate::error::ConfigError;

/// Which clock drives the sampling timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    /// Process CPU time (`CLOCK_PROCESS_CPUTIME_ID` / `ITIMER_PROF`, delivers `SIGPROF`).
    Cpu,
    /// Wall-clock time (`CLOCK_MONOTONIC` / `ITIMER_REAL`, delivers `SIGALRM`).
    Wall,
}

/// Options accepted by [`Configuration::new`]. Every field has a documented
/// default matching `ConfigOptions::default()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigOptions {
    pub interval_ms: u64,
    pub time_mode: TimeMode,
    pub max_managed_depth: usize,
    pub max_native_depth: usize,
    pub ring_capacity: usize,
    /// Test-only: skip timer/signal syscalls so a session can be driven by
    /// [`crate::session::Session::fire_for_test`] instead of a real interrupt.
    pub test_no_install_timer: bool,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            interval_ms: 9,
            time_mode: TimeMode::Cpu,
            max_managed_depth: 1024,
            max_native_depth: 512,
            ring_capacity: 4096,
            test_no_install_timer: false,
        }
    }
}

/// Validated, normalized configuration. Once constructed, every accessor
/// returns exactly the value that will be used — there is no further
/// normalization downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configuration {
    opts: ConfigOptions,
}

impl Configuration {
    pub fn new(opts: ConfigOptions) -> Result<Self, ConfigError> {
        if opts.interval_ms < 1 {
            return Err(ConfigError::IntervalTooSmall(opts.interval_ms));
        }
        if opts.max_managed_depth < 1 || opts.max_managed_depth > 1024 {
            return Err(ConfigError::ManagedDepthOutOfRange(opts.max_managed_depth));
        }
        if opts.max_native_depth < 1 || opts.max_native_depth > 512 {
            return Err(ConfigError::NativeDepthOutOfRange(opts.max_native_depth));
        }
        if opts.ring_capacity < 1
            || opts.ring_capacity > 65536
            || !opts.ring_capacity.is_power_of_two()
        {
            return Err(ConfigError::RingCapacityInvalid(opts.ring_capacity));
        }
        Ok(Self { opts })
    }

    /// The normalized options this session was actually built with.
    pub fn effective(&self) -> ConfigOptions {
        self.opts
    }

    pub fn interval_ms(&self) -> u64 {
        self.opts.interval_ms
    }

    pub fn time_mode(&self) -> TimeMode {
        self.opts.time_mode
    }

    pub fn max_managed_depth(&self) -> usize {
        self.opts.max_managed_depth
    }

    pub fn max_native_depth(&self) -> usize {
        self.opts.max_native_depth
    }

    pub fn ring_capacity(&self) -> usize {
        self.opts.ring_capacity
    }

    pub fn test_no_install_timer(&self) -> bool {
        self.opts.test_no_install_timer
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(ConfigOptions::default()).expect("default options are always valid")
    }
}
