//! Threading models: how first-time creation is synchronized.
//!
//! A [`ThreadingModel`] supplies the lock value each slot embeds and the
//! scoped guard type whose lifetime brackets the slot's check-then-create
//! sequence. Two models are provided:
//!
//! - [`SingleThreaded`]: the guard is a zero-sized no-op token. Slots using
//!   this model are not `Sync`, so they cannot be shared across threads in
//!   the first place — the model trades the lock away for a compile-time
//!   confinement to one thread.
//! - [`MultiThreaded`]: the guard holds a per-slot [`RawMutex`], so at most
//!   one thread runs the check-then-create sequence at a time and the
//!   release/acquire pair makes the created instance visible to every later
//!   locker.
//!
//! Custom models implement [`ThreadingModel`]; models that really do provide
//! mutual exclusion additionally implement the unsafe [`ThreadSafe`] marker,
//! which is what lets a slot be shared across threads.

use crate::mutex::{RawMutex, RawMutexGuard};

/// Synchronization strategy for a slot's first-time creation.
///
/// `Lock` is the per-slot synchronization context, const-initialized via
/// [`INIT`](Self::INIT) when the slot is constructed — for a slot in a
/// `static`, that is the language's static-initialization guarantee, so the
/// lock exists exactly once per slot and is never torn down before process
/// exit. `Guard` is a scoped token: constructing it via [`lock`](Self::lock)
/// blocks until access is granted (for models that block at all) and
/// dropping it releases that access unconditionally, including during
/// unwinding.
pub trait ThreadingModel {
   /// Per-slot synchronization context.
   type Lock;

   /// Initial (unlocked) value of the context, used in `const` slot
   /// construction.
   const INIT: Self::Lock;

   /// Scoped token representing held (or trivially absent) access.
   type Guard<'a>
   where
      Self::Lock: 'a;

   /// Acquires the guard for the given slot context.
   fn lock(lock: &Self::Lock) -> Self::Guard<'_>;
}

/// Marker for threading models whose guard provides real mutual exclusion.
///
/// # Safety
///
/// Implementations assert that [`ThreadingModel::lock`] blocks until the
/// calling thread holds exclusive access to everything guarded by the slot's
/// `Lock`, and that releasing the guard establishes a happens-before edge
/// with the next acquisition. Slots rely on this for their `Sync` impl: an
/// incorrect implementation turns shared slot access into a data race.
pub unsafe trait ThreadSafe: ThreadingModel {}

/// Zero-sized guard of the [`SingleThreaded`] model.
///
/// Carries no exclusion semantics; it exists so the no-op path has a real
/// scoped token rather than a dressed-up invalid lock reference.
pub struct NoGuard;

/// No-op threading model for slots confined to one thread.
///
/// Slots using this model are not `Sync` and therefore cannot be placed in a
/// `static` or shared across threads; access them through
/// [`get_or_create`](crate::Singleton::get_or_create) on an owned or
/// thread-local slot.
pub enum SingleThreaded {}

impl ThreadingModel for SingleThreaded {
   type Lock = ();
   const INIT: Self::Lock = ();

   type Guard<'a>
      = NoGuard
   where
      Self::Lock: 'a;

   #[inline]
   fn lock(_lock: &Self::Lock) -> NoGuard {
      NoGuard
   }
}

/// Mutex-backed threading model for slots shared across threads.
///
/// Guard construction blocks on the slot's [`RawMutex`]; guard destruction
/// releases it. The first thread to acquire the guard performs creation, and
/// the mutex's release/acquire ordering guarantees every later locker
/// observes the fully constructed instance.
pub enum MultiThreaded {}

impl ThreadingModel for MultiThreaded {
   type Lock = RawMutex;
   const INIT: Self::Lock = RawMutex::new();

   type Guard<'a>
      = RawMutexGuard<'a>
   where
      Self::Lock: 'a;

   #[inline]
   fn lock(lock: &Self::Lock) -> RawMutexGuard<'_> {
      lock.lock()
   }
}

// SAFETY: The guard wraps a held RawMutex, whose Acquire/Release protocol
// provides both exclusion and the happens-before edge the marker promises.
unsafe impl ThreadSafe for MultiThreaded {}
