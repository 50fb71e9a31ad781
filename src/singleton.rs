//! The singleton slot: one managed instance per slot, created on first use.
//!
//! [`Singleton<T, C, M>`] composes a [`CreationPolicy`] and a
//! [`ThreadingModel`](crate::ThreadingModel) into a process-wide accessor
//! for a single instance of `T`. Each distinct `(T, C, M)` combination is a
//! distinct type, and each value of that type is an independent slot;
//! creating one never touches another.
//!
//! The whole check-then-create sequence runs inside the threading model's
//! guard. There is deliberately no lock-free fast path: keeping the
//! occupancy check inside the critical section is what makes first access
//! race-free under [`MultiThreaded`](crate::MultiThreaded), and the no-op
//! guard of [`SingleThreaded`](crate::SingleThreaded) costs nothing anyway.

use core::cell::UnsafeCell;
use core::convert::Infallible;
use core::fmt;
use core::marker::PhantomData;
use core::ops::DerefMut;

use crate::create::{ConstructionError, CreationPolicy, DefaultCreation};
use crate::teardown;
use crate::threading::{MultiThreaded, ThreadSafe, ThreadingModel};

/// Slot contents: the occupant handle plus the one-time registration flag.
/// Mutated only under the slot's guard (or through `&mut self`).
struct SlotState<H> {
   occupant: Option<H>,
   registered: bool,
}

/// A process-wide slot holding at most one instance of `T`.
///
/// The instance is materialized by the creation policy `C` on first access
/// and handed out by reference afterwards; the threading model `M` decides
/// how concurrent first access is synchronized. The defaults — heap
/// allocation of `T::default()` under a per-slot mutex — match the common
/// "one global, many threads" case:
///
/// ```
/// use monoslot::Singleton;
///
/// #[derive(Default)]
/// struct Config {
///    retries: u32,
/// }
///
/// static CONFIG: Singleton<Config> = Singleton::new();
///
/// let config = CONFIG.instance();
/// assert_eq!(config.retries, 0);
/// // Every later call returns the same instance.
/// assert!(std::ptr::eq(config, CONFIG.instance()));
/// ```
///
/// The first call through [`instance`](Self::instance) /
/// [`try_instance`](Self::try_instance) also registers a process-exit
/// teardown that releases the instance through `C::destroy`. Slots that are
/// owned values instead of statics skip the exit hook and are torn down by
/// [`Drop`] (or explicitly by [`reset`](Self::reset)).
///
/// # Hazards
///
/// Requesting the instance from within the creation policy itself (a type
/// whose construction recursively asks for its own singleton) deadlocks
/// under [`MultiThreaded`]. References obtained from the accessors must not
/// be used once process teardown has begun; coordinating destruction order
/// across slots is out of scope beyond the single best-effort exit hook.
pub struct Singleton<T, C = DefaultCreation, M = MultiThreaded>
where
   C: CreationPolicy<T>,
   M: ThreadingModel,
{
   state: UnsafeCell<SlotState<C::Handle>>,
   lock: M::Lock,
   _marker: PhantomData<(fn() -> T, fn() -> C, fn() -> M)>,
}

impl<T, C, M> Singleton<T, C, M>
where
   C: CreationPolicy<T>,
   M: ThreadingModel,
{
   /// Creates a new, empty slot.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         state: UnsafeCell::new(SlotState {
            occupant: None,
            registered: false,
         }),
         lock: M::INIT,
         _marker: PhantomData,
      }
   }

   /// Checks whether the slot currently holds an instance, without creating
   /// one.
   #[inline]
   pub fn is_occupied(&self) -> bool {
      let _guard = M::lock(&self.lock);
      // SAFETY: The guard serializes slot access for thread-safe models;
      // otherwise the slot is confined to this thread (`!Sync`).
      unsafe { (*self.state.get()).occupant.is_some() }
   }

   /// Returns a reference to the instance if one has been created.
   ///
   /// Never creates; returns `None` on an empty slot.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      let _guard = M::lock(&self.lock);
      // SAFETY: See `is_occupied`. The returned reference points into the
      // occupant's allocation, which is not moved or dropped while `&self`
      // borrows can exist.
      unsafe { (*self.state.get()).occupant.as_ref().map(|handle| &**handle) }
   }

   /// Returns a mutable reference to the instance if one has been created.
   ///
   /// Requires exclusive access, so it never blocks and needs no guard.
   #[inline]
   pub fn get_mut(&mut self) -> Option<&mut T>
   where
      C::Handle: DerefMut,
   {
      self.state.get_mut().occupant.as_mut().map(|handle| &mut **handle)
   }

   /// Returns the instance, creating it through the policy if the slot is
   /// empty.
   ///
   /// Unlike [`try_instance`](Self::try_instance) this works on any slot —
   /// owned, borrowed, or single-threaded — and does not install the
   /// process-exit teardown; an owned slot releases its instance in `Drop`.
   ///
   /// On creation failure the slot stays empty and the error is returned;
   /// a later call attempts creation again.
   #[inline]
   pub fn get_or_create(&self) -> Result<&T, ConstructionError<C::Error>> {
      let _guard = M::lock(&self.lock);
      // SAFETY: Guard held for the whole check-then-create sequence.
      unsafe { self.materialize() }
   }

   /// Returns the instance of a `static` slot, creating it on first access.
   ///
   /// The check-then-create sequence runs under the threading model's guard;
   /// under [`MultiThreaded`] exactly one of any number of racing threads
   /// performs creation and every thread observes the fully constructed
   /// instance. The first call that observes the slot occupied also
   /// registers a process-exit teardown (at most once per slot) which
   /// releases the instance through `C::destroy`.
   ///
   /// On creation failure the guard is released as usual, the slot stays
   /// empty, no teardown is registered, and a later call retries.
   pub fn try_instance(&'static self) -> Result<&'static T, ConstructionError<C::Error>>
   where
      T: Sync,
      C::Handle: Send + Sync,
      M: ThreadSafe,
      M::Lock: Sync,
   {
      let _guard = M::lock(&self.lock);
      // SAFETY: Guard held for the whole check-then-create sequence, and
      // `M: ThreadSafe` makes it a real mutual exclusion.
      let value = unsafe { self.materialize() }?;
      // SAFETY: Still under the guard; `registered` is only written here
      // and the slot is occupied, so the hook fires at most once.
      unsafe {
         let state = self.state.get();
         if !(*state).registered {
            (*state).registered = true;
            teardown::register(self);
         }
      }
      Ok(value)
   }

   /// Infallible form of [`try_instance`](Self::try_instance) for policies
   /// that cannot fail, such as [`DefaultCreation`].
   #[inline]
   pub fn instance(&'static self) -> &'static T
   where
      C: CreationPolicy<T, Error = Infallible>,
      T: Sync,
      C::Handle: Send + Sync,
      M: ThreadSafe,
      M::Lock: Sync,
   {
      match self.try_instance() {
         Ok(value) => value,
         Err(err) => match err.into_inner() {},
      }
   }

   /// Destroys the instance through the policy and empties the slot.
   ///
   /// Returns `true` if an instance was destroyed. Requires exclusive
   /// access, so it never blocks; this is the teardown operation for owned
   /// slots (statics are torn down by the process-exit hook instead).
   pub fn reset(&mut self) -> bool {
      match self.state.get_mut().occupant.take() {
         Some(handle) => {
            C::destroy(handle);
            true
         }
         None => false,
      }
   }

   /// Occupied-check and creation step. On success the slot is occupied.
   ///
   /// # Safety
   ///
   /// The caller must hold the slot's guard (or otherwise have the slot
   /// confined to the current thread) for the duration of the call.
   unsafe fn materialize(&self) -> Result<&T, ConstructionError<C::Error>> {
      let state = self.state.get();
      if (*state).occupant.is_none() {
         let handle = C::create().map_err(ConstructionError::new)?;
         (*state).occupant = Some(handle);
         log::trace!("created singleton instance of {}", core::any::type_name::<T>());
      }
      match (*state).occupant.as_ref() {
         Some(handle) => Ok(&**handle),
         // The branch above just filled the slot.
         None => unreachable!("slot is empty after successful creation"),
      }
   }
}

impl<T, C, M> teardown::Teardown for Singleton<T, C, M>
where
   C: CreationPolicy<T>,
   M: ThreadingModel,
{
   fn tear_down(&self) {
      let _guard = M::lock(&self.lock);
      // SAFETY: Guard held; the occupant is taken out before the guard is
      // released, and destroyed after, so the policy runs outside the
      // critical section.
      let occupant = unsafe { (*self.state.get()).occupant.take() };
      drop(_guard);
      if let Some(handle) = occupant {
         C::destroy(handle);
      }
   }
}

// SAFETY:
// Sending a slot between threads transfers ownership of the occupant handle
// (`C::Handle: Send`) and of the lock value (`M::Lock: Send`); nothing else
// is thread-affine.
unsafe impl<T, C, M> Send for Singleton<T, C, M>
where
   C: CreationPolicy<T>,
   C::Handle: Send,
   M: ThreadingModel,
   M::Lock: Send,
{
}

// SAFETY:
// Shared access mutates the slot state only under the guard, and
// `M: ThreadSafe` asserts the guard is a real mutex with release/acquire
// ordering. `&T` is handed out across threads (`T: Sync`), the handle is
// read concurrently (`C::Handle: Sync`) and may be destroyed by the exit
// hook on a different thread than the creator (`C::Handle: Send`).
unsafe impl<T, C, M> Sync for Singleton<T, C, M>
where
   T: Sync,
   C: CreationPolicy<T>,
   C::Handle: Send + Sync,
   M: ThreadSafe,
   M::Lock: Sync,
{
}

impl<T, C, M> Default for Singleton<T, C, M>
where
   C: CreationPolicy<T>,
   M: ThreadingModel,
{
   /// Creates a new, empty slot.
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<T, C, M> fmt::Debug for Singleton<T, C, M>
where
   T: fmt::Debug,
   C: CreationPolicy<T>,
   M: ThreadingModel,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("Singleton");
      match self.get() {
         Some(value) => d.field(value),
         None => d.field(&format_args!("<empty>")),
      };
      d.finish()
   }
}

impl<T, C, M> Drop for Singleton<T, C, M>
where
   C: CreationPolicy<T>,
   M: ThreadingModel,
{
   /// Destroys a still-present occupant through the creation policy.
   #[inline]
   fn drop(&mut self) {
      if let Some(handle) = self.state.get_mut().occupant.take() {
         C::destroy(handle);
      }
   }
}
