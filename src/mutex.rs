//! The blocking mutex behind the [`MultiThreaded`](crate::MultiThreaded) model.
//!
//! Each slot owns one of these, so the footprint matters more than raw
//! throughput: the whole mutex is a single `AtomicU8` with the following
//! layout:
//! - Bit 0: LOCKED - A guard is live
//! - Bit 1: WAITING - At least one thread is parked on the lock
//!
//! Acquisition spins briefly on contended compare-exchanges and then parks
//! the thread via `parking_lot_core`'s futex-style wait, keyed on the
//! address of the atomic. Release swaps the state back to zero with
//! `Release` ordering, which is the happens-before edge that makes whatever
//! the previous holder wrote visible to the next locker.

use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// A small blocking mutex with no poisoning.
///
/// Unlike `std::sync::Mutex` this does not wrap the protected data; it only
/// hands out a [`RawMutexGuard`] token whose lifetime brackets the critical
/// section. Dropping the guard releases the lock unconditionally, including
/// during unwinding, so a panic inside the critical section never wedges the
/// lock.
///
/// Acquisition is not reentrant: locking a mutex this thread already holds
/// deadlocks.
pub struct RawMutex(AtomicU8);

impl RawMutex {
   /// Bit flag: a guard is currently live.
   const LOCKED: u8 = 1;
   /// Bit flag: at least one thread is parked waiting for the lock.
   const WAITING: u8 = 2;

   /// Creates a new, unlocked mutex.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   /// Acquires the mutex, blocking the calling thread until it is available.
   #[inline]
   pub fn lock(&self) -> RawMutexGuard<'_> {
      // Fast path: uncontended acquire.
      if self
         .0
         .compare_exchange(0, Self::LOCKED, Ordering::Acquire, Ordering::Relaxed)
         .is_err()
      {
         self.lock_contended();
      }
      RawMutexGuard { mutex: self }
   }

   /// Attempts to acquire the mutex without blocking.
   ///
   /// Returns `None` if the lock is held by another thread (or appears to
   /// be, under contention).
   #[inline]
   pub fn try_lock(&self) -> Option<RawMutexGuard<'_>> {
      let state = self.0.load(Ordering::Relaxed);
      if state & Self::LOCKED != 0 {
         return None;
      }
      self
         .0
         .compare_exchange(state, state | Self::LOCKED, Ordering::Acquire, Ordering::Relaxed)
         .ok()
         .map(|_| RawMutexGuard { mutex: self })
   }

   /// Slow path: set WAITING and park until the holder releases.
   #[cold]
   fn lock_contended(&self) {
      loop {
         let state = self.0.load(Ordering::Relaxed);

         // Try to acquire if the lock looks free. WAITING is preserved so a
         // stolen lock still wakes the parked threads on release.
         if state & Self::LOCKED == 0 {
            match self.0.compare_exchange_weak(
               state,
               state | Self::LOCKED,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return,
               Err(_) => {
                  core::hint::spin_loop();
                  continue;
               }
            }
         }

         // Lock is held. Make sure WAITING is set before parking so the
         // holder knows to unpark on release.
         if state & Self::WAITING == 0 {
            if self
               .0
               .compare_exchange_weak(
                  state,
                  state | Self::WAITING,
                  Ordering::Relaxed,
                  Ordering::Relaxed,
               )
               .is_err()
            {
               core::hint::spin_loop();
               continue;
            }
         }

         self.wait(Self::LOCKED | Self::WAITING);
      }
   }

   /// Parks the thread while the state still equals `expected`.
   #[inline]
   fn wait(&self, expected: u8) {
      // SAFETY: The address passed to park must match the address used for
      // unpark. Both consistently use the address of the AtomicU8.
      unsafe {
         // park() re-checks the condition closure before sleeping and only
         // sleeps while the state is unchanged; spurious wakes are handled
         // by the caller's retry loop.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Relaxed) == expected,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
   }

   /// Releases the mutex and wakes parked threads.
   #[inline]
   fn unlock(&self) {
      // Release ordering publishes the critical section's writes to the
      // next Acquire locker.
      let prev = self.0.swap(0, Ordering::Release);
      debug_assert!(prev & Self::LOCKED != 0, "unlock of an unlocked RawMutex");

      if prev & Self::WAITING != 0 {
         // SAFETY: See safety comment in `wait`.
         unsafe {
            // Woken threads re-contend and re-set WAITING if they lose.
            parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
         }
      }
   }
}

impl Default for RawMutex {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

/// RAII token for a held [`RawMutex`]. Releases the lock on drop.
pub struct RawMutexGuard<'a> {
   mutex: &'a RawMutex,
}

impl Drop for RawMutexGuard<'_> {
   #[inline]
   fn drop(&mut self) {
      self.mutex.unlock();
   }
}
