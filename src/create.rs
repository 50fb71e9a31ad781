//! Creation policies: how the managed instance is allocated and released.
//!
//! A [`CreationPolicy`] pairs a `create` step producing an owning handle
//! with the matching `destroy` step releasing it. The stock policy,
//! [`DefaultCreation`], heap-allocates a default-constructed value; other
//! allocation schemes (a factory function for types without a `Default`, a
//! fixed placement buffer, a pool that recycles handles) slot in by
//! implementing the trait, without touching the holder.

use core::convert::Infallible;
use core::ops::Deref;

use thiserror::Error;

/// Strategy for allocating and releasing a slot's managed instance.
///
/// `create` either yields a valid owning handle or fails with the policy's
/// error type; there is no such thing as a "successful" invalid handle.
/// `destroy` consumes the handle, so it runs at most once per created
/// instance and only on handles the matching `create` produced.
///
/// Policies are selected as type parameters and never instantiated, so both
/// operations are associated functions. A policy whose `create` can fail
/// picks a real error type; the failure surfaces from the slot's accessor
/// wrapped in [`ConstructionError`], and the slot stays empty so a later
/// access retries.
pub trait CreationPolicy<T> {
   /// Owning handle to a created instance.
   type Handle: Deref<Target = T>;

   /// Error signaled when construction is impossible.
   type Error;

   /// Materializes a new instance.
   fn create() -> Result<Self::Handle, Self::Error>;

   /// Releases an instance previously produced by [`create`](Self::create).
   fn destroy(handle: Self::Handle);
}

/// Heap-allocating creation policy for default-constructible types.
///
/// `create` boxes `T::default()` and cannot fail; `destroy` drops the box.
pub enum DefaultCreation {}

impl<T: Default> CreationPolicy<T> for DefaultCreation {
   type Handle = Box<T>;
   type Error = Infallible;

   #[inline]
   fn create() -> Result<Box<T>, Infallible> {
      Ok(Box::new(T::default()))
   }

   #[inline]
   fn destroy(handle: Box<T>) {
      drop(handle);
   }
}

/// A creation policy failed to produce an instance.
///
/// Returned by [`Singleton::try_instance`](crate::Singleton::try_instance)
/// and [`Singleton::get_or_create`](crate::Singleton::get_or_create); the
/// slot is left empty, so the same call may be retried later. The policy's
/// own error is recovered with [`into_inner`](Self::into_inner).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("failed to construct the managed instance: {0}")]
pub struct ConstructionError<E>(E);

impl<E> ConstructionError<E> {
   #[inline]
   pub(crate) fn new(source: E) -> Self {
      Self(source)
   }

   /// Returns the creation policy's underlying error.
   #[inline]
   pub fn into_inner(self) -> E {
      self.0
   }

   /// Borrows the creation policy's underlying error.
   #[inline]
   pub fn inner(&self) -> &E {
      &self.0
   }
}
