//! Process-exit teardown for `static` slots.
//!
//! Statics are never dropped, so a slot created through
//! [`Singleton::try_instance`](crate::Singleton::try_instance) registers
//! itself here to have its instance released on normal process exit. The
//! registry is a process-wide list of slots guarded by the crate's own
//! [`RawMutex`]; the first registration installs a single `extern "C"`
//! callback via `libc::atexit`.
//!
//! At exit, registered slots are torn down in reverse registration order
//! (last created, first destroyed). A teardown that panics is caught and
//! reported through `log::error!` rather than unwinding out of the exit
//! handler, and the remaining teardowns still run. There is no recovery
//! path for such a failure; by that point no caller exists to hand it to.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};
use std::panic::{self, AssertUnwindSafe};

use crate::mutex::RawMutex;

/// Exit-time destroy-and-clear operation of a slot.
pub(crate) trait Teardown {
   /// Takes the slot's occupant and releases it through the creation
   /// policy, leaving the slot empty.
   fn tear_down(&self);
}

/// Process-wide list of slots awaiting exit-time teardown.
struct Registry {
   entries: UnsafeCell<Vec<&'static (dyn Teardown + Sync)>>,
   lock: RawMutex,
   hooked: AtomicBool,
}

// SAFETY: `entries` is only touched while `lock` is held.
unsafe impl Sync for Registry {}

impl Registry {
   const fn new() -> Self {
      Self {
         entries: UnsafeCell::new(Vec::new()),
         lock: RawMutex::new(),
         hooked: AtomicBool::new(false),
      }
   }

   fn push(&self, slot: &'static (dyn Teardown + Sync)) {
      let _guard = self.lock.lock();
      // SAFETY: Guard held.
      unsafe { (*self.entries.get()).push(slot) };
   }

   /// Empties the registry, returning the entries in registration order.
   fn drain(&self) -> Vec<&'static (dyn Teardown + Sync)> {
      let _guard = self.lock.lock();
      // SAFETY: Guard held.
      unsafe { core::mem::take(&mut *self.entries.get()) }
   }

   #[cfg(test)]
   fn len(&self) -> usize {
      let _guard = self.lock.lock();
      // SAFETY: Guard held.
      unsafe { (*self.entries.get()).len() }
   }
}

static REGISTRY: Registry = Registry::new();

/// Registers a slot for exit-time teardown and installs the `atexit` hook
/// on first use.
///
/// Callers guarantee at-most-once registration per slot (the slot's
/// `registered` flag), so a slot is never torn down twice.
pub(crate) fn register(slot: &'static (dyn Teardown + Sync)) {
   REGISTRY.push(slot);

   if !REGISTRY.hooked.swap(true, Ordering::AcqRel) {
      // SAFETY: `run_teardowns` is a plain `extern "C"` function with no
      // preconditions; `atexit` merely stores the pointer for exit time.
      let rc = unsafe { libc::atexit(run_teardowns) };
      if rc != 0 {
         // Creation proceeds; the instance just leaks at exit.
         log::warn!("failed to install the process-exit teardown hook (atexit returned {rc})");
      }
   }
}

/// The `atexit` callback: tears registered slots down, last registered
/// first.
extern "C" fn run_teardowns() {
   let entries = REGISTRY.drain();
   for slot in entries.iter().rev() {
      // A panic must not unwind into the C runtime's exit machinery, and
      // one failed teardown must not suppress the others.
      if panic::catch_unwind(AssertUnwindSafe(|| slot.tear_down())).is_err() {
         log::error!("a singleton teardown panicked during process exit");
      }
   }
}

#[cfg(test)]
mod tests {
   use std::sync::atomic::{AtomicUsize, Ordering};
   use std::sync::Mutex;

   use super::{register, run_teardowns, Teardown, REGISTRY};
   use crate::create::CreationPolicy;
   use crate::Singleton;

   static ORDER: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

   struct Recorder(&'static str);

   impl Teardown for Recorder {
      fn tear_down(&self) {
         ORDER.lock().unwrap().push(self.0);
      }
   }

   struct Panicker;

   impl Teardown for Panicker {
      fn tear_down(&self) {
         panic!("destroy failed");
      }
   }

   static DESTROYED: AtomicUsize = AtomicUsize::new(0);

   enum CountedCreation {}

   impl CreationPolicy<u32> for CountedCreation {
      type Handle = Box<u32>;
      type Error = core::convert::Infallible;

      fn create() -> Result<Box<u32>, Self::Error> {
         Ok(Box::new(7))
      }

      fn destroy(handle: Box<u32>) {
         DESTROYED.fetch_add(1, Ordering::SeqCst);
         drop(handle);
      }
   }

   enum FailingCreation {}

   impl CreationPolicy<u32> for FailingCreation {
      type Handle = Box<u32>;
      type Error = &'static str;

      fn create() -> Result<Box<u32>, Self::Error> {
         Err("nope")
      }

      fn destroy(handle: Box<u32>) {
         drop(handle);
      }
   }

   // One combined test: the registry is process-global state, and a single
   // sequential scenario keeps the assertions deterministic under the
   // parallel test runner.
   #[test]
   fn registry_runs_teardowns_lifo_and_survives_panics() {
      static FIRST: Recorder = Recorder("first");
      static SECOND: Recorder = Recorder("second");
      static PANICKER: Panicker = Panicker;
      static SLOT: Singleton<u32, CountedCreation> = Singleton::new();
      static FAILING: Singleton<u32, FailingCreation> = Singleton::new();

      // A failed creation never registers a teardown.
      let before = REGISTRY.len();
      assert!(FAILING.try_instance().is_err());
      assert_eq!(REGISTRY.len(), before);

      // A successful creation registers exactly one entry, once.
      assert_eq!(*SLOT.try_instance().unwrap(), 7);
      assert_eq!(REGISTRY.len(), before + 1);
      assert_eq!(*SLOT.try_instance().unwrap(), 7);
      assert_eq!(REGISTRY.len(), before + 1);

      register(&FIRST);
      register(&PANICKER);
      register(&SECOND);

      // Silence the expected panic's default backtrace output.
      let prev_hook = std::panic::take_hook();
      std::panic::set_hook(Box::new(|_| {}));
      run_teardowns();
      std::panic::set_hook(prev_hook);

      // LIFO order, the panicking entry skipped but not fatal.
      assert_eq!(*ORDER.lock().unwrap(), ["second", "first"]);
      // The slot's occupant went through the policy's destroy, exactly once,
      // and the slot is empty again.
      assert_eq!(DESTROYED.load(Ordering::SeqCst), 1);
      assert!(!SLOT.is_occupied());
      // The registry is drained; a second run is a no-op.
      assert_eq!(REGISTRY.len(), 0);
      run_teardowns();
      assert_eq!(DESTROYED.load(Ordering::SeqCst), 1);
   }
}
