//! Sampling profiler core for a managed-runtime process.
//!
//! A timer signal periodically interrupts the program; an async-signal-safe
//! handler captures the current call stack into a lock-free single-producer
//! single-consumer ring; a collector thread drains the ring, interns
//! functions/locations, and aggregates identical stacks; `Session::stop`
//! serializes the result into a deduplicated [`Profile`].
//!
//! # Example
//!
//! ```no_run
//! use sampler_core::config::ConfigOptions;
//! use sampler_core::runtime::testing::{FakeRuntime, FakeSymbolizer, FakeUnwinder};
//! use sampler_core::session::Session;
//! use std::sync::Arc;
//!
//! let options = ConfigOptions { test_no_install_timer: true, ..ConfigOptions::default() };
//! let session = Session::new(
//!     options,
//!     Arc::new(FakeRuntime::with_stack(vec![("main", "app.rb", 1)])),
//!     Arc::new(FakeSymbolizer::new(vec![])),
//!     Arc::new(FakeUnwinder::with_pcs(vec![])),
//! ).unwrap();
//!
//! session.start().unwrap();
//! session.fire_for_test();
//! let profile = session.stop().unwrap();
//! println!("collected {} samples", profile.collected_sample_count);
//! ```

pub mod aggregate;
pub mod collector;
pub mod config;
pub mod error;
pub mod function;
pub mod intern;
pub mod invariants;
pub mod location;
pub mod reservation;
pub mod ring;
pub mod runtime;
pub mod sample;
pub mod serializer;
mod signal;
pub mod stack;
pub mod session;
mod timer;

pub use config::{ConfigOptions, Configuration, TimeMode};
pub use error::{ConfigError, ResourceError, StopError};
pub use ring::Ring;
pub use sample::Sample;
pub use serializer::Profile;
pub use session::Session;
