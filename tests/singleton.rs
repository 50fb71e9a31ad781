use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use monoslot::{ConstructionError, CreationPolicy, Singleton};

#[test]
fn same_instance_every_call() {
   #[derive(Default)]
   struct Config {
      retries: u32,
   }

   static CONFIG: Singleton<Config> = Singleton::new();

   let first = CONFIG.instance();
   let second = CONFIG.instance();
   assert!(std::ptr::eq(first, second));
   assert_eq!(first.retries, 0);
}

#[test]
fn creation_is_lazy_and_runs_once() {
   static CREATED: AtomicUsize = AtomicUsize::new(0);

   #[derive(Default)]
   struct Expensive;

   enum CountedCreation {}

   impl CreationPolicy<Expensive> for CountedCreation {
      type Handle = Box<Expensive>;
      type Error = Infallible;

      fn create() -> Result<Box<Expensive>, Infallible> {
         CREATED.fetch_add(1, Ordering::SeqCst);
         Ok(Box::default())
      }

      fn destroy(handle: Box<Expensive>) {
         drop(handle);
      }
   }

   static SLOT: Singleton<Expensive, CountedCreation> = Singleton::new();

   // Observing the slot does not create.
   assert!(!SLOT.is_occupied());
   assert!(SLOT.get().is_none());
   assert_eq!(CREATED.load(Ordering::SeqCst), 0);

   SLOT.instance();
   assert_eq!(CREATED.load(Ordering::SeqCst), 1);
   assert!(SLOT.is_occupied());
   assert!(SLOT.get().is_some());

   // Second access skips creation entirely.
   SLOT.instance();
   assert_eq!(CREATED.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_first_access_creates_once() {
   static CREATED: AtomicUsize = AtomicUsize::new(0);

   // The two fields must always agree; a partially constructed value would
   // break that.
   struct Pair {
      a: u64,
      b: u64,
   }

   enum SlowCreation {}

   impl CreationPolicy<Pair> for SlowCreation {
      type Handle = Box<Pair>;
      type Error = Infallible;

      fn create() -> Result<Box<Pair>, Infallible> {
         CREATED.fetch_add(1, Ordering::SeqCst);
         let a = 0x5eed;
         // Stretch the construction window so racing threads pile up on
         // the slot's lock.
         thread::sleep(Duration::from_millis(20));
         Ok(Box::new(Pair { a, b: a }))
      }

      fn destroy(handle: Box<Pair>) {
         drop(handle);
      }
   }

   static SLOT: Singleton<Pair, SlowCreation> = Singleton::new();

   let threads: Vec<_> = (0..10)
      .map(|_| {
         thread::spawn(|| {
            let pair = SLOT.instance();
            assert_eq!(pair.a, pair.b);
            pair as *const Pair as usize
         })
      })
      .collect();

   let mut addresses: Vec<usize> = threads.into_iter().map(|t| t.join().unwrap()).collect();
   addresses.dedup();

   // Every thread observed the same, fully constructed instance, and the
   // initializer ran exactly once despite the contention.
   assert_eq!(addresses.len(), 1);
   assert_eq!(CREATED.load(Ordering::SeqCst), 1);
}

#[test]
fn distinct_slots_are_independent() {
   static CREATED_A: AtomicUsize = AtomicUsize::new(0);
   static CREATED_B: AtomicUsize = AtomicUsize::new(0);

   enum CreationA {}
   enum CreationB {}

   impl CreationPolicy<String> for CreationA {
      type Handle = Box<String>;
      type Error = Infallible;

      fn create() -> Result<Box<String>, Infallible> {
         CREATED_A.fetch_add(1, Ordering::SeqCst);
         Ok(Box::new(String::from("a")))
      }

      fn destroy(handle: Box<String>) {
         drop(handle);
      }
   }

   impl CreationPolicy<String> for CreationB {
      type Handle = Box<String>;
      type Error = Infallible;

      fn create() -> Result<Box<String>, Infallible> {
         CREATED_B.fetch_add(1, Ordering::SeqCst);
         Ok(Box::new(String::from("b")))
      }

      fn destroy(handle: Box<String>) {
         drop(handle);
      }
   }

   // Same managed type, different creation policies: two independent slots.
   static SLOT_A: Singleton<String, CreationA> = Singleton::new();
   static SLOT_B: Singleton<String, CreationB> = Singleton::new();

   assert_eq!(SLOT_A.instance(), "a");
   assert_eq!(CREATED_A.load(Ordering::SeqCst), 1);

   // Creating A did not create (or otherwise disturb) B.
   assert!(!SLOT_B.is_occupied());
   assert_eq!(CREATED_B.load(Ordering::SeqCst), 0);

   assert_eq!(SLOT_B.instance(), "b");
   assert_eq!(CREATED_B.load(Ordering::SeqCst), 1);
   assert_eq!(CREATED_A.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_creation_is_retried() {
   static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

   enum FlakyCreation {}

   impl CreationPolicy<u32> for FlakyCreation {
      type Handle = Box<u32>;
      type Error = &'static str;

      fn create() -> Result<Box<u32>, &'static str> {
         if ATTEMPTS.fetch_add(1, Ordering::SeqCst) < 2 {
            Err("resource unavailable")
         } else {
            Ok(Box::new(99))
         }
      }

      fn destroy(handle: Box<u32>) {
         drop(handle);
      }
   }

   static SLOT: Singleton<u32, FlakyCreation> = Singleton::new();

   // Two failures, each leaving the slot empty and retryable.
   let err = SLOT.try_instance().unwrap_err();
   assert_eq!(*err.inner(), "resource unavailable");
   assert!(!SLOT.is_occupied());
   assert_eq!(SLOT.try_instance().unwrap_err().into_inner(), "resource unavailable");
   assert!(!SLOT.is_occupied());

   // The third attempt succeeds and sticks.
   assert_eq!(*SLOT.try_instance().unwrap(), 99);
   assert!(SLOT.is_occupied());
   assert_eq!(*SLOT.try_instance().unwrap(), 99);
   assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 3);
}

#[test]
fn construction_error_reports_the_cause() {
   enum BrokenCreation {}

   impl CreationPolicy<u32> for BrokenCreation {
      type Handle = Box<u32>;
      type Error = &'static str;

      fn create() -> Result<Box<u32>, &'static str> {
         Err("boom")
      }

      fn destroy(handle: Box<u32>) {
         drop(handle);
      }
   }

   static SLOT: Singleton<u32, BrokenCreation> = Singleton::new();

   let err: ConstructionError<&'static str> = SLOT.try_instance().unwrap_err();
   assert_eq!(err.to_string(), "failed to construct the managed instance: boom");
   assert_eq!(err.into_inner(), "boom");
}
