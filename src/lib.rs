//! Process-wide singleton slots with pluggable creation and locking policies.
//!
//! This crate provides one construct, [`Singleton<T, C, M>`]: a slot that
//! holds at most one live instance of `T` per slot, materialized lazily on
//! first access. Two orthogonal policies are composed at the type level:
//!
//! - [`CreationPolicy`]: how the instance is allocated and later released.
//!   The default, [`DefaultCreation`], boxes `T::default()`; factories for
//!   non-default-constructible types, placement buffers, and pools are
//!   ordinary implementations of the same trait.
//! - [`ThreadingModel`]: how concurrent first access is synchronized.
//!   [`MultiThreaded`] (the default) guards the check-then-create sequence
//!   with a per-slot mutex; [`SingleThreaded`] is a zero-cost no-op whose
//!   slots are confined to one thread by the type system.
//!
//! Distinct `(T, C, M)` combinations are fully independent slots, even for
//! the same `T`.
//!
//! # Features
//!
//! - **Lazy creation**: the policy's `create` runs exactly once per slot,
//!   on the first access, never at program start.
//! - **Race-free first access**: under [`MultiThreaded`], one of any number
//!   of racing threads creates and all of them observe the fully
//!   constructed instance.
//! - **Fallible creation**: a policy error surfaces from the accessor, the
//!   slot stays empty, and a later access retries.
//! - **Best-effort teardown**: the first access of a `static` slot
//!   registers a process-exit hook that releases the instance through the
//!   policy's `destroy`; owned slots are torn down by `Drop`.
//!
//! # Examples
//!
//! ## A shared static
//!
//! ```rust
//! use monoslot::Singleton;
//!
//! #[derive(Default)]
//! struct Stats {
//!    requests: std::sync::atomic::AtomicU64,
//! }
//!
//! static STATS: Singleton<Stats> = Singleton::new();
//!
//! let a = STATS.instance();
//! let b = STATS.instance();
//! // Same instance, created once.
//! assert!(std::ptr::eq(a, b));
//! ```
//!
//! ## A custom creation policy
//!
//! ```rust
//! use monoslot::{CreationPolicy, Singleton};
//!
//! struct Registry {
//!    capacity: usize,
//! }
//!
//! // `Registry` has no `Default`; a factory policy builds it instead.
//! enum RegistryFactory {}
//!
//! impl CreationPolicy<Registry> for RegistryFactory {
//!    type Handle = Box<Registry>;
//!    type Error = core::convert::Infallible;
//!
//!    fn create() -> Result<Box<Registry>, Self::Error> {
//!       Ok(Box::new(Registry { capacity: 64 }))
//!    }
//!
//!    fn destroy(handle: Box<Registry>) {
//!       drop(handle);
//!    }
//! }
//!
//! static REGISTRY: Singleton<Registry, RegistryFactory> = Singleton::new();
//!
//! assert_eq!(REGISTRY.instance().capacity, 64);
//! ```
//!
//! ## A single-threaded slot
//!
//! ```rust
//! use monoslot::{DefaultCreation, SingleThreaded, Singleton};
//!
//! // Not `Sync`, so it lives in an owned value rather than a `static`;
//! // teardown happens in `Drop`.
//! let slot: Singleton<String, DefaultCreation, SingleThreaded> = Singleton::new();
//! let value = slot.get_or_create().unwrap();
//! assert!(value.is_empty());
//! ```

/// Creation policies and the construction error type.
mod create;

/// The per-slot blocking mutex.
mod mutex;

/// The singleton slot itself.
mod singleton;

/// Process-exit teardown registry.
mod teardown;

/// Threading models and the guard contract.
mod threading;

pub use create::{ConstructionError, CreationPolicy, DefaultCreation};
pub use mutex::{RawMutex, RawMutexGuard};
pub use singleton::Singleton;
pub use threading::{MultiThreaded, NoGuard, SingleThreaded, ThreadSafe, ThreadingModel};
