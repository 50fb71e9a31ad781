use monoslot::{CreationPolicy, Singleton};

struct Cache {
   entries: usize,
}

enum CacheCreation {}

impl CreationPolicy<Cache> for CacheCreation {
   type Handle = Box<Cache>;
   type Error = core::convert::Infallible;

   fn create() -> Result<Box<Cache>, Self::Error> {
      println!("cache: created");
      Ok(Box::new(Cache { entries: 3 }))
   }

   fn destroy(handle: Box<Cache>) {
      // Runs from the process-exit hook, after main has returned.
      println!("cache: destroyed ({} entries flushed)", handle.entries);
      drop(handle);
   }
}

static CACHE: Singleton<Cache, CacheCreation> = Singleton::new();

fn main() {
   println!("cache holds {} entries", CACHE.instance().entries);
   println!("main: done");
   // Expected output order: created, used, done, destroyed.
}
